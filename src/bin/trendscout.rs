#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use trendscout::gateway::{ChatModel, ProviderGateway};
use trendscout::pipeline::{Pipeline, PipelineConfig, Termination};
use trendscout::retrieval::TavilyAdapter;

#[derive(Parser)]
#[command(name = "trendscout", version, about = "AI trend discovery and reporting pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover, qualify, and report on one emerging trend
    Run {
        /// Chat model identifier
        #[arg(long, default_value = "gpt-4o-mini")]
        model: String,
        /// Directory for rendered reports
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,
        /// Results fetched per discovery query
        #[arg(long, default_value_t = 5)]
        max_results: usize,
        /// Cap on qualification attempts
        #[arg(long, default_value_t = trendscout::MAX_ATTEMPTS)]
        max_attempts: usize,
    },
}

#[tokio::main]
async fn main() {
    // Credentials may live in a local .env; absence of the file is fine,
    // absence of the keys is fatal below.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            model,
            out_dir,
            max_results,
            max_attempts,
        } => {
            let gateway = match ProviderGateway::from_env() {
                Ok(g) => Arc::new(g),
                Err(e) => {
                    eprintln!("error: {e}");
                    std::process::exit(1);
                }
            };
            let search = match TavilyAdapter::from_env() {
                Ok(s) => Arc::new(s),
                Err(e) => {
                    eprintln!("error: {e}");
                    std::process::exit(1);
                }
            };

            let config = PipelineConfig {
                model: ChatModel::new(model),
                max_attempts,
                max_results_per_query: max_results,
                out_dir,
                ..PipelineConfig::default()
            };

            let pipeline = Pipeline::new(gateway.clone(), gateway, search, config);
            let outcome = pipeline.run().await;

            match outcome.termination {
                Termination::Qualified => {
                    let trend = outcome.qualified_trend().unwrap_or("unknown");
                    println!(
                        "qualified trend: {trend} (after {} attempt(s))",
                        outcome.attempts
                    );
                    if let Some(report) = &outcome.state.final_report {
                        println!("report written to {}", report.output_path);
                    } else {
                        println!("report was not produced; see log for diagnostics");
                    }
                }
                Termination::Exhausted => {
                    println!(
                        "no qualifying trend found; queue exhausted after {} attempt(s)",
                        outcome.attempts
                    );
                }
                Termination::AttemptCapReached => {
                    println!(
                        "no qualifying trend found within the attempt cap ({})",
                        outcome.attempts
                    );
                }
            }
        }
    }
}
