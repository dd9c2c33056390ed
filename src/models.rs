//! Core data models for the consolidator

use crate::schema::{self, METRICS};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//
// ================= Sources =================
//

/// Identifier of the upstream agent that produced a bundle.
///
/// Declaration order is precedence order: earlier variants win.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    PdfExtraction,
    FinancialSec,
    WebSearch,
    Linkedin,
    News,
}

impl SourceTag {
    pub const ALL: [SourceTag; 5] = [
        SourceTag::PdfExtraction,
        SourceTag::FinancialSec,
        SourceTag::WebSearch,
        SourceTag::Linkedin,
        SourceTag::News,
    ];

    /// Lower is stronger
    pub fn priority(self) -> u8 {
        match self {
            SourceTag::PdfExtraction => 0,
            SourceTag::FinancialSec => 1,
            SourceTag::WebSearch => 2,
            SourceTag::Linkedin => 3,
            SourceTag::News => 4,
        }
    }

    /// Fixed per-source trust hint carried on every candidate
    pub fn confidence_hint(self) -> f32 {
        match self {
            SourceTag::PdfExtraction => 0.9,
            SourceTag::FinancialSec => 0.95,
            SourceTag::WebSearch => 0.6,
            SourceTag::Linkedin => 0.8,
            SourceTag::News => 0.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceTag::PdfExtraction => "pdf_extraction",
            SourceTag::FinancialSec => "financial_sec",
            SourceTag::WebSearch => "web_search",
            SourceTag::Linkedin => "linkedin",
            SourceTag::News => "news",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceTag {
    type Err = crate::error::ConsolidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s.trim())
            .ok_or_else(|| {
                crate::error::ConsolidationError::InvalidInput(format!(
                    "unknown source tag `{}`",
                    s
                ))
            })
    }
}

/// Raw payloads keyed by the source that produced them.
pub type SourceBundles = BTreeMap<SourceTag, serde_json::Value>;

//
// ================= Values =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed metric value as it appears in the canonical record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl MetricValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetricValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetricValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetricValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Sentiment> for MetricValue {
    fn from(sentiment: Sentiment) -> Self {
        MetricValue::Text(sentiment.as_str().to_string())
    }
}

/// One source's opinion about one metric.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CandidateValue {
    pub metric: &'static str,
    /// Raw value as found in the payload; may be null
    pub value: serde_json::Value,
    pub source: SourceTag,
    pub confidence_hint: f32,
}

impl CandidateValue {
    pub fn new(metric: &'static str, value: serde_json::Value, source: SourceTag) -> Self {
        Self {
            metric,
            value,
            source,
            confidence_hint: source.confidence_hint(),
        }
    }
}

//
// ================= Risk =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub regulatory_risk: bool,
    pub trend_risk: bool,
    pub sentiment: Sentiment,
    pub news_summary: String,
    /// Whether the LLM fallback was consulted
    #[serde(default)]
    pub fallback_invoked: bool,
}

//
// ================= Investment analysis =================
//

/// Analyst view of a consolidated record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvestmentAnalysis {
    pub executive_summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    /// 1 (pass) to 5 (strong invest)
    pub investment_score: u8,
    pub justification: String,
}

//
// ================= Canonical record =================
//

/// The consolidated output: one nullable slot per canonical metric.
///
/// Slots follow [`METRICS`] order, which is also the serialized key order.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    values: Vec<Option<MetricValue>>,
}

impl CanonicalRecord {
    pub(crate) fn empty() -> Self {
        Self {
            values: vec![None; METRICS.len()],
        }
    }

    pub(crate) fn set(&mut self, metric: &str, value: Option<MetricValue>) {
        let index = match schema::index_of(metric) {
            Some(i) => i,
            None => panic!("unknown canonical metric `{}`", metric),
        };
        self.values[index] = value;
    }

    pub fn get(&self, metric: &str) -> Option<&MetricValue> {
        schema::index_of(metric).and_then(|i| self.values[i].as_ref())
    }

    pub fn is_null(&self, metric: &str) -> bool {
        self.get(metric).is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<&MetricValue>)> {
        METRICS
            .iter()
            .zip(self.values.iter())
            .map(|(spec, value)| (spec.name, value.as_ref()))
    }

    pub fn resolved_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

impl Serialize for CanonicalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

//
// ================= Final Result =================
//

#[derive(Debug, Clone, Serialize)]
pub struct Consolidation {
    pub request_id: Uuid,
    pub consolidated_at: DateTime<Utc>,
    pub record: CanonicalRecord,
    /// Metrics that were checked and are genuinely unknown
    pub unresolved_fields: Vec<&'static str>,
    /// Winning source per resolved metric
    pub provenance: BTreeMap<&'static str, SourceTag>,
    pub sources_present: Vec<SourceTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<RiskAssessment>,
    /// Absent when no analyzer is configured or the analyzer failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<InvestmentAnalysis>,
}
