use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trendscout::gateway::ProviderError;
use trendscout::retrieval::{discover_documents, SearchProvider, TavilyAdapter, DISCOVERY_QUERIES};

fn adapter_for(server: &MockServer) -> TavilyAdapter {
    TavilyAdapter::with_config("tvly-test", server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn tavily_parses_results_into_documents() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({
            "api_key": "tvly-test",
            "query": "emerging AI",
            "max_results": 5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "title": "Neuromorphic computing",
                    "url": "https://example.org/neuro",
                    "content": "Brain-inspired chips."
                },
                {
                    "title": null,
                    "url": null,
                    "content": null
                }
            ]
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let docs = adapter.search("emerging AI", 5).await.unwrap();

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].title, "Neuromorphic computing");
    assert_eq!(docs[0].url, "https://example.org/neuro");
    assert_eq!(docs[0].content, "Brain-inspired chips.");
    // Missing fields fall back to placeholders, not an error.
    assert_eq!(docs[1].title, "untitled");
    assert_eq!(docs[1].url, "N/A");
    assert_eq!(docs[1].content, "");
}

#[tokio::test]
async fn tavily_truncates_long_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "title": "long",
                "url": "https://example.org/long",
                "content": "x".repeat(5_000)
            }]
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let docs = adapter.search("q", 1).await.unwrap();
    assert_eq!(docs[0].content.chars().count(), 500);
}

#[tokio::test]
async fn tavily_maps_http_errors_to_provider_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let err = adapter.search("q", 5).await.unwrap_err();
    assert!(matches!(err, ProviderError::Provider { .. }));
    assert!(err.is_retryable());

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = adapter.search("q", 5).await.unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn tavily_rejects_malformed_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let err = adapter.search("q", 5).await.unwrap_err();
    assert!(matches!(err, ProviderError::Provider { .. }));
}

#[tokio::test]
async fn discovery_collects_across_all_queries() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "title": "hit",
                "url": "https://example.org/hit",
                "content": "text"
            }]
        })))
        .expect(DISCOVERY_QUERIES.len() as u64)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let docs = discover_documents(&adapter, 5).await;
    assert_eq!(docs.len(), DISCOVERY_QUERIES.len());
}

#[tokio::test]
async fn discovery_degrades_to_empty_on_total_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let docs = discover_documents(&adapter, 5).await;
    assert!(docs.is_empty());
}
