//! Gemini-backed risk fallback

use super::{FallbackFlags, RiskFallback};
use crate::error::ConsolidationError;
use crate::gemini::{GeminiClient, GenerationParams};
use crate::llm_json::extract_json_object;
use crate::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Upper bound on article text sent to the model
const MAX_PROMPT_CHARS: usize = 6_000;

const SYSTEM_PROMPT: &str = r#"You are a startup risk analyst reviewing news coverage of a company.

Answer with a single JSON object and nothing else:
{"regulatory_risk": <true|false>, "trend_risk": <true|false>}

- regulatory_risk: legal, regulatory, compliance or enforcement exposure
- trend_risk: market disruption, decline or obsolescence of the company's market"#;

pub struct GeminiRiskFallback {
    client: Arc<GeminiClient>,
}

impl GeminiRiskFallback {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RiskFallback for GeminiRiskFallback {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn detect(&self, search_text: &str) -> Result<FallbackFlags> {
        let prompt = build_prompt(search_text);
        let (answer, confidence) = self
            .client
            .generate(&prompt, SYSTEM_PROMPT, GenerationParams::VERDICT)
            .await?;

        debug!(confidence, answer_len = answer.len(), "Risk verdict received");

        parse_flags(&extract_json_object(&answer))
    }
}

fn build_prompt(search_text: &str) -> String {
    let excerpt: String = search_text.chars().take(MAX_PROMPT_CHARS).collect();
    format!("News coverage:\n{}", excerpt)
}

/// Read both flags from the model's object. Either key may use the plural
/// record name; a verdict with neither flag is unusable.
fn parse_flags(object: &Map<String, Value>) -> Result<FallbackFlags> {
    let flag = |names: [&str; 2]| {
        names
            .iter()
            .find_map(|name| object.get(*name))
            .and_then(as_flag)
    };

    let regulatory = flag(["regulatory_risk", "regulatory_risks"]);
    let trend = flag(["trend_risk", "trend_risks"]);

    if regulatory.is_none() && trend.is_none() {
        return Err(ConsolidationError::Llm(
            "risk verdict carried no usable flags".to_string(),
        ));
    }

    Ok(FallbackFlags {
        regulatory_risk: regulatory.unwrap_or(false),
        trend_risk: trend.unwrap_or(false),
    })
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
