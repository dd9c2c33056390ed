//! Environment configuration
//!
//! Call `dotenv::dotenv().ok()` before `from_env` to pick up a local `.env`.

use crate::error::ConsolidationError;
use crate::gemini::DEFAULT_MODEL_URL;
use crate::Result;
use std::env;
use std::time::Duration;

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatorConfig {
    /// Absent or empty disables the Gemini fallback
    pub gemini_api_key: Option<String>,
    pub gemini_model_url: String,
    pub risk_llm_fallback: bool,
    /// Ask Gemini for an investment analysis of each record
    pub investment_analysis: bool,
    pub source_fetch_timeout: Duration,
}

impl Default for ConsolidatorConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model_url: DEFAULT_MODEL_URL.to_string(),
            risk_llm_fallback: true,
            investment_analysis: true,
            source_fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

impl ConsolidatorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let risk_llm_fallback = match non_empty("RISK_LLM_FALLBACK") {
            Some(raw) => parse_bool("RISK_LLM_FALLBACK", &raw)?,
            None => defaults.risk_llm_fallback,
        };

        let investment_analysis = match non_empty("INVESTMENT_ANALYSIS") {
            Some(raw) => parse_bool("INVESTMENT_ANALYSIS", &raw)?,
            None => defaults.investment_analysis,
        };

        let source_fetch_timeout = match non_empty("SOURCE_FETCH_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    ConsolidationError::Config(format!(
                        "SOURCE_FETCH_TIMEOUT_SECS must be a whole number of seconds, got {:?}",
                        raw
                    ))
                })?;
                if secs == 0 {
                    return Err(ConsolidationError::Config(
                        "SOURCE_FETCH_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.source_fetch_timeout,
        };

        Ok(Self {
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_model_url: non_empty("GEMINI_MODEL_URL").unwrap_or(defaults.gemini_model_url),
            risk_llm_fallback,
            investment_analysis,
            source_fetch_timeout,
        })
    }

    /// The fallback runs only when enabled and a key is present.
    pub fn fallback_enabled(&self) -> bool {
        self.risk_llm_fallback && self.gemini_api_key.is_some()
    }

    /// Analysis runs only when enabled and a key is present.
    pub fn analysis_enabled(&self) -> bool {
        self.investment_analysis && self.gemini_api_key.is_some()
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConsolidationError::Config(format!(
            "{} must be a boolean, got {:?}",
            key, raw
        ))),
    }
}
