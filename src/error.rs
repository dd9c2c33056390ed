//! Error types for the metrics consolidator
//!
//! The reconciliation core never fails on bad data. These errors belong to the
//! collaborators around it (LLM calls, source fetchers, configuration) and to
//! the recovered local failures that the adapter and resolver log and drop.

use crate::models::SourceTag;
use thiserror::Error;

/// Result type alias for consolidator operations
pub type Result<T> = std::result::Result<T, ConsolidationError>;

#[derive(Error, Debug)]
pub enum ConsolidationError {

    // =============================
    // Collaborator Errors
    // =============================

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Source {source_tag} unavailable: {reason}")]
    SourceUnavailable {
        source_tag: SourceTag,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A source payload that could not be turned into a JSON object.
///
/// Recovered inside the adapter: the source simply contributes no candidates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("payload decoded to {0}, expected an object")]
    NotAnObject(&'static str),
}

/// A candidate value that cannot be coerced to its metric's kind.
///
/// Recovered inside the resolver: the candidate is treated as absent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("no number found in {0:?}")]
    NotNumeric(String),

    #[error("number {0} does not fit an integer")]
    OutOfRange(f64),

    #[error("score {0} outside 1..=5")]
    ScoreOutOfRange(i64),

    #[error("{0:?} is not a boolean")]
    NotBoolean(String),

    #[error("{0:?} is not a sentiment label")]
    NotSentiment(String),

    #[error("unsupported JSON shape for this metric")]
    UnsupportedShape,
}
