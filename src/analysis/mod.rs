//! Investment analysis of a consolidated record
//!
//! Optional last stage: an analyzer reads the finished record and returns an
//! executive summary, strengths, weaknesses and a 1-5 score. A failure never
//! affects the record itself.

use crate::error::ConsolidationError;
use crate::models::{CanonicalRecord, InvestmentAnalysis};
use crate::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub mod gemini;

pub use gemini::GeminiInvestmentAnalyzer;

#[async_trait]
pub trait InvestmentAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn analyze(&self, record: &CanonicalRecord) -> Result<InvestmentAnalysis>;
}

/// Build an analysis from the model's JSON object.
///
/// `executive_summary` and an `investment_score` in 1..=5 are required.
/// List fields accept an array of strings or a single string.
pub fn parse_analysis(object: &Map<String, Value>) -> Result<InvestmentAnalysis> {
    let executive_summary = text_field(object, "executive_summary")
        .ok_or_else(|| unusable("no executive_summary"))?;

    let investment_score = match object.get("investment_score") {
        Some(value) => score_of(value).ok_or_else(|| {
            unusable(&format!("investment_score {} is not 1 to 5", value))
        })?,
        None => return Err(unusable("no investment_score")),
    };

    Ok(InvestmentAnalysis {
        executive_summary,
        strengths: list_field(object, "strengths"),
        weaknesses: list_field(object, "weaknesses"),
        investment_score,
        justification: text_field(object, "justification").unwrap_or_default(),
    })
}

fn unusable(reason: &str) -> ConsolidationError {
    ConsolidationError::Llm(format!("investment analysis unusable: {}", reason))
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn list_field(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn score_of(value: &Value) -> Option<u8> {
    let score = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    let rounded = score.round();
    (1.0..=5.0).contains(&rounded).then_some(rounded as u8)
}
