//! Coercion of raw candidate values into typed metric values

use crate::error::CoercionError;
use crate::models::{MetricValue, Sentiment};
use crate::schema::MetricKind;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;

lazy_static! {
    /// An amount: a currency marker (a minus may sit directly before it) or a
    /// bare minus touching the digits, a number that does not start inside a
    /// word, then an optional magnitude suffix ending on a word boundary
    /// ("18 months" is 18, not 18 million).
    static ref AMOUNT_REGEX: Regex = Regex::new(
        r"(?:(?P<cur_sign>-)?(?P<cur>\busd|\beur|\bgbp|[$€£])\s*|(?P<sign>-))?\b(?P<num>\d[\d,]*(?:\.\d+)?)(?:\s*(?P<suffix>thousand|million|billion|bn|mm|k|m|b)\b)?"
    ).unwrap();
}

/// Null, blank strings and empty containers carry no opinion.
pub fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

pub fn coerce(kind: MetricKind, value: &Value) -> Result<MetricValue, CoercionError> {
    match kind {
        MetricKind::Integer => to_integer(value).map(MetricValue::Integer),
        MetricKind::Score => {
            let score = to_integer(value)?;
            if (1..=5).contains(&score) {
                Ok(MetricValue::Integer(score))
            } else {
                Err(CoercionError::ScoreOutOfRange(score))
            }
        }
        MetricKind::Text => to_text(value).map(MetricValue::Text),
        MetricKind::Boolean => to_bool(value).map(MetricValue::Boolean),
        MetricKind::Sentiment => to_sentiment(value).map(MetricValue::from),
    }
}

pub fn to_integer(value: &Value) -> Result<i64, CoercionError> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None => round_to_i64(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::String(s) => parse_amount(s),
        _ => Err(CoercionError::UnsupportedShape),
    }
}

/// Parse a human-written amount such as `"$1,200k"`, `"1.5M ARR"` or `"75%"`.
pub fn parse_amount(text: &str) -> Result<i64, CoercionError> {
    let lowered = text.trim().to_lowercase();
    let found: Vec<Captures<'_>> = AMOUNT_REGEX.captures_iter(&lowered).collect();

    // "FY2023 revenue: $5M" is 5M: a marked amount beats a bare leading number
    let is_marked = |caps: &&Captures<'_>| caps.name("cur").is_some() || caps.name("suffix").is_some();
    let caps = found
        .iter()
        .find(is_marked)
        .or_else(|| found.first())
        .ok_or_else(|| CoercionError::NotNumeric(text.to_string()))?;

    let digits: String = caps["num"].chars().filter(|c| *c != ',').collect();
    let mut amount: f64 = digits
        .parse()
        .map_err(|_| CoercionError::NotNumeric(text.to_string()))?;

    let multiplier = match caps.name("suffix").map(|m| m.as_str()) {
        Some("k") | Some("thousand") => 1e3,
        Some("m") | Some("mm") | Some("million") => 1e6,
        Some("b") | Some("bn") | Some("billion") => 1e9,
        _ => 1.0,
    };
    amount *= multiplier;

    if caps.name("sign").is_some() || caps.name("cur_sign").is_some() {
        amount = -amount;
    }

    round_to_i64(amount)
}

fn round_to_i64(value: f64) -> Result<i64, CoercionError> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded.abs() >= i64::MAX as f64 {
        return Err(CoercionError::OutOfRange(value));
    }
    Ok(rounded as i64)
}

fn to_text(value: &Value) -> Result<String, CoercionError> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                })
                .collect();
            if parts.is_empty() {
                Err(CoercionError::UnsupportedShape)
            } else {
                Ok(parts.join(", "))
            }
        }
        _ => Err(CoercionError::UnsupportedShape),
    }
}

fn to_bool(value: &Value) -> Result<bool, CoercionError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 1.0 => Ok(true),
            Some(x) if x == 0.0 => Ok(false),
            _ => Err(CoercionError::NotBoolean(n.to_string())),
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Ok(true),
            "false" | "no" | "n" | "0" => Ok(false),
            _ => Err(CoercionError::NotBoolean(s.clone())),
        },
        _ => Err(CoercionError::UnsupportedShape),
    }
}

fn to_sentiment(value: &Value) -> Result<Sentiment, CoercionError> {
    let label = value.as_str().ok_or(CoercionError::UnsupportedShape)?;
    match label.trim().to_lowercase().as_str() {
        "positive" => Ok(Sentiment::Positive),
        "neutral" => Ok(Sentiment::Neutral),
        "negative" => Ok(Sentiment::Negative),
        _ => Err(CoercionError::NotSentiment(label.to_string())),
    }
}
