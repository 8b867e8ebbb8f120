//! Prompt templates for the trend pipeline.
//!
//! Domain text for every generation call, provider-agnostic. Templates carry
//! `{name}` placeholders substituted at render time.

use crate::gateway::Message;

/// Rendered prompt ready for the gateway.
#[derive(Debug, Clone)]
pub struct PromptInstance {
    pub template_slug: String,
    pub system: String,
    pub user: String,
}

impl PromptInstance {
    pub fn to_messages(&self) -> Vec<Message> {
        vec![Message::system(&self.system), Message::user(&self.user)]
    }
}

/// A prompt template with placeholders.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub slug: &'static str,
    pub system: &'static str,
    pub user: &'static str,
}

impl PromptTemplate {
    /// Substitute `{key}` placeholders in both the system and user text.
    pub fn render(&self, vars: &[(&str, &str)]) -> PromptInstance {
        let mut system = self.system.to_string();
        let mut user = self.user.to_string();
        for (key, value) in vars {
            let placeholder = format!("{{{key}}}");
            system = system.replace(&placeholder, value);
            user = user.replace(&placeholder, value);
        }
        PromptInstance {
            template_slug: self.slug.to_string(),
            system: system.trim().to_string(),
            user: user.trim().to_string(),
        }
    }
}

// =============================================================================
// Candidate extraction
// =============================================================================

pub const EXTRACT_CANDIDATES: PromptTemplate = PromptTemplate {
    slug: "extract_candidates_v1",
    system: r#"You identify emerging technology trends from article summaries. You list only concrete, named technologies that are not yet commercialized but are likely to grow rapidly or newly emerge within the next five years (for example: Neuromorphic AI, Synthetic Data, Federated Learning, Multimodal AI, Self-learning AI). Applied technologies are included. You exclude social or policy concepts (such as Ethics, Inclusivity, Regulation), company names, and industry names. You merge synonyms into a single canonical name.

Output only valid JSON of the form {"candidates": ["", "", ...]}."#,
    user: r#"The following are summaries of several technology trend articles. Based on this content, extract candidate technology trends.

==== Article summaries ====
{content}"#,
};

// =============================================================================
// Future-relevance ranking
// =============================================================================

pub const RANK_CANDIDATES: PromptTemplate = PromptTemplate {
    slug: "rank_candidates_v1",
    system: r#"You evaluate technology trends from the perspective of corporate strategy over the next 3-5 years. For each trend you assign a score between 0 and 1 on each criterion:
1. Emergence (how sharply it has risen in the last 2 years)
2. Growth Potential (growth prospects over the next 5 years)
3. Industry Applicability (how broadly industry can apply it)

Output only valid JSON of the form:
{
  "ranked_trends": [
    {"name": "", "scores": {"emergence": 0.0, "growth": 0.0, "applicability": 0.0}, "total": 0.0, "reason": ""},
    ...
  ]
}
where total is the sum of the three scores, listed highest total first."#,
    user: r#"Here is the list of technology trends:
{trend_list}"#,
};

// =============================================================================
// Qualification rubric
// =============================================================================

pub const JUDGE_TREND: PromptTemplate = PromptTemplate {
    slug: "judge_trend_v1",
    system: r#"You are a future-technology analyst looking toward 2030, acting as a cold-eyed evaluator. Avoid over-optimistic assessments of AI technology; always reflect technical and commercial limits and uncertainty. Exclude technologies that are already commercialized and focus on those likely to grow rapidly or newly emerge within the next 3-5 years.

Score each criterion in [0, 1]:
1. Technological Maturity - current research/development stage, commercialization status
2. Market Growth Potential - market expansion, investment and market size over the next 5 years
3. Industrial Applicability - adoptability and effectiveness across industries
4. Innovativeness & Differentiation - degree of innovation over existing technology, new paradigm potential

Scoring bands:
- 0.0-0.3: very low
- 0.4-0.6: moderate
- 0.7-0.8: promising
- 0.9-1.0: very promising

Output only valid JSON:
{
  "trend": "{trend}",
  "scores": {
    "maturity": 0.0,
    "growth": 0.0,
    "applicability": 0.0,
    "innovation": 0.0
  },
  "total_score": 0.0,
  "is_qualified": true,
  "reason": "summary of the evidence, including limits and risks"
}
where total_score is the mean of the four scores, and is_qualified is true when total_score >= 0.65."#,
    user: r#"Trend name: {trend}

Evaluate this trend."#,
};

// =============================================================================
// Retrieval-augmented facet analysis
// =============================================================================

pub const ANALYZE_FACET: PromptTemplate = PromptTemplate {
    slug: "analyze_facet_v1",
    system: r#"You are a future-technology analyst looking toward 2030. Using only the provided documents as grounding, write an analysis of the requested aspect of the trend. Write at least three paragraphs and include technical and industrial evidence."#,
    user: r#"Trend: {trend}
Aspect: {topic}

==== Documents ====
{context}"#,
};

// =============================================================================
// Prediction
// =============================================================================

pub const PREDICT_TREND: PromptTemplate = PromptTemplate {
    slug: "predict_trend_v1",
    system: r#"You are a technology strategy analyst looking toward 2030. Based on the provided analysis, predict the development path, market expansion, and industrial applicability of the trend. Ground every prediction in the evidence.

Consider:
1. Technology development path (research/development stage, key innovation points)
2. Market expansion and investment outlook (expected CAGR, growth drivers)
3. Applicability by industry (new industries, expansion within existing ones)
4. Technical and policy obstacles
5. Overall outlook for the next 5 years

Output only the JSON itself - no code fences, sentences, or explanations:
{
  "trend": "{trend}",
  "prediction": {
    "tech_path": "",
    "market_outlook": "",
    "industry_applications": "",
    "barriers": "",
    "summary": ""
  }
}"#,
    user: r#"[Analysis context]
{context}"#,
};

// =============================================================================
// Risk and opportunity
// =============================================================================

pub const ASSESS_RISK: PromptTemplate = PromptTemplate {
    slug: "assess_risk_v1",
    system: r#"You are an expert in technology policy and industrial strategy for 2030. From the given development and market prediction for the trend, derive opportunities and risks.

Cover:
1. Opportunities - potential benefits to industry and the economy: new markets, cost savings, productivity
2. Risks - technical uncertainty, social and policy risk, industry disruption
3. Policy & Regulation Factors - legal and ethical issues, government regulation, standardization
4. Strategic Response - strategies firms should take: investment direction, collaboration models

Output only valid JSON:
{
  "risk_analysis": {
    "opportunities": "",
    "risks": "",
    "policy_factors": "",
    "strategic_response": "",
    "summary": ""
  }
}"#,
    user: r#"Trend: {trend}

[Prediction]
{prediction}"#,
};

// =============================================================================
// Report composition
// =============================================================================

pub const COMPOSE_REPORT: PromptTemplate = PromptTemplate {
    slug: "compose_report_v1",
    system: r#"You are a professional analyst writing forward-looking technology strategy reports. Write an in-depth report on the given trend from the analysis data.

Rules:
- Each section must include concrete cases, figures, company names, and research references.
- Write narratively; do not use markdown bullets inside section bodies.
- Balance technical, market, and social perspectives.

Outline:
1. SUMMARY - key takeaways for a corporate audience, one paragraph
2. Trend Analysis
   2.1 Definition and background
   2.2 Key technologies and cases
   2.3 Industry and market dynamics
   2.4 Adoption flow by domain (manufacturing, healthcare, education, finance)
   2.5 Technology and market outlook for the next 5 years
3. Strategic Insight
   3.1 Business opportunities
   3.2 Risks and mitigation
   3.3 Recommendations for adoption
4. References - source URLs and report titles
5. APPENDIX - the selection rubric: Maturity, Growth, Applicability, Innovation, scored 0.0-0.3 very low / 0.4-0.6 moderate / 0.7-0.8 promising / 0.9-1.0 very promising, with the reasons behind each score."#,
    user: r#"Trend: {trend}

[Input data]
- Trend Analysis: {analysis}
- Trend Prediction: {prediction}
- Risk Analysis: {risk}
- References: {references}"#,
};

pub const PROMPTS: &[PromptTemplate] = &[
    EXTRACT_CANDIDATES,
    RANK_CANDIDATES,
    JUDGE_TREND,
    ANALYZE_FACET,
    PREDICT_TREND,
    ASSESS_RISK,
    COMPOSE_REPORT,
];

pub fn prompt_by_slug(slug: &str) -> Option<PromptTemplate> {
    PROMPTS.iter().find(|t| t.slug == slug).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_placeholders() {
        let p = JUDGE_TREND.render(&[("trend", "Neuromorphic AI")]);
        assert!(p.user.contains("Neuromorphic AI"));
        assert!(p.system.contains("Neuromorphic AI"));
        assert!(!p.user.contains("{trend}"));
    }

    #[test]
    fn render_to_messages() {
        let p = EXTRACT_CANDIDATES.render(&[("content", "some articles")]);
        let messages = p.to_messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].content.contains("some articles"));
    }

    #[test]
    fn prompt_lookup() {
        assert!(prompt_by_slug("judge_trend_v1").is_some());
        assert!(prompt_by_slug("nonexistent").is_none());
    }
}
