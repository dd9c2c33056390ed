//! Startup Metrics Consolidator
//!
//! Reconciles what several extraction agents report about one startup
//! (pitch deck, SEC filings, web search, LinkedIn, news) into a single
//! canonical record of metrics:
//! - Adapts each source-shaped payload into per-metric candidates
//! - Resolves every metric through a declared source priority
//! - Classifies news for regulatory/trend risk and sentiment
//! - Reports which fields remain unknown
//! - Optionally asks an analyzer for an investment view of the record
//!
//! PIPELINE:
//! GATHER → ADAPT → RESOLVE → CLASSIFY → RECORD → ANALYZE

pub mod adapter;
pub mod analysis;
pub mod classifier;
pub mod config;
pub mod consolidator;
pub mod error;
pub mod gemini;
pub mod llm_json;
pub mod models;
pub mod resolver;
pub mod schema;
pub mod sources;

pub use error::Result;

// Re-export common types
pub use adapter::FieldSourceAdapter;
pub use analysis::InvestmentAnalyzer;
pub use classifier::{NoFallback, RiskClassifier, RiskFallback};
pub use config::ConsolidatorConfig;
pub use consolidator::Consolidator;
pub use models::*;
pub use resolver::PrecedenceResolver;
