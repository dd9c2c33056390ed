//! Gemini-backed investment analyzer

use super::{parse_analysis, InvestmentAnalyzer};
use crate::gemini::{GeminiClient, GenerationParams};
use crate::llm_json::extract_json_object;
use crate::models::{CanonicalRecord, InvestmentAnalysis};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const SYSTEM_PROMPT: &str = r#"You are an expert venture capital analyst who specializes in startup evaluation.

Answer with a single JSON object and nothing else:
{
  "executive_summary": "<2-3 sentences>",
  "strengths": ["<strength>", ...],
  "weaknesses": ["<risk or weakness>", ...],
  "investment_score": <integer 1-5, 5 is highest>,
  "justification": "<why this score>"
}

Null fields are unknown, not zero."#;

pub struct GeminiInvestmentAnalyzer {
    client: Arc<GeminiClient>,
}

impl GeminiInvestmentAnalyzer {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InvestmentAnalyzer for GeminiInvestmentAnalyzer {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn analyze(&self, record: &CanonicalRecord) -> Result<InvestmentAnalysis> {
        let prompt = build_prompt(record)?;
        let (answer, confidence) = self
            .client
            .generate(&prompt, SYSTEM_PROMPT, GenerationParams::ANALYSIS)
            .await?;

        debug!(confidence, answer_len = answer.len(), "Investment analysis received");

        parse_analysis(&extract_json_object(&answer))
    }
}

fn build_prompt(record: &CanonicalRecord) -> Result<String> {
    let data = serde_json::to_string_pretty(record)?;
    Ok(format!(
        "Analyze the following consolidated data about a company:\n\n{}",
        data
    ))
}
