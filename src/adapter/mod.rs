//! Field source adapter
//!
//! Turns one upstream agent's source-shaped payload into candidate values for
//! canonical metrics. Unknown keys are ignored and a payload that cannot be
//! decoded contributes nothing.

use crate::error::DecodeError;
use crate::models::{CandidateValue, SourceTag};
use serde_json::Value;
use std::borrow::Cow;
use tracing::{debug, warn};

pub mod tables;

pub use tables::{table_for, FieldTable};

pub struct FieldSourceAdapter;

impl FieldSourceAdapter {
    /// Produce the candidates `source` offers in `raw`.
    ///
    /// Every present path yields a candidate, in table preference order, so a
    /// null under one alias never hides a value under another. A key that is
    /// missing yields no candidate; an explicit null yields a null candidate.
    pub fn adapt(source: SourceTag, raw: &Value) -> Vec<CandidateValue> {
        let payload = match decode_object(raw) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(source = %source, error = %e, "Source payload dropped");
                return Vec::new();
            }
        };

        let table = table_for(source);
        let mut candidates = Vec::with_capacity(table.fields.len());

        for (metric, keys) in table.fields {
            for value in present_values(&payload, table.scopes, keys) {
                candidates.push(CandidateValue::new(*metric, value.clone(), source));
            }
        }

        debug!(
            source = %source,
            candidate_count = candidates.len(),
            "Adapted source payload"
        );

        candidates
    }
}

/// Decode a payload exactly once: a JSON string is parsed, anything else is
/// taken as-is. A string that decodes to another string is not unwrapped again.
pub fn decode_once(raw: &Value) -> Result<Cow<'_, Value>, DecodeError> {
    match raw {
        Value::String(text) => serde_json::from_str::<Value>(text)
            .map(Cow::Owned)
            .map_err(|e| DecodeError::InvalidJson(e.to_string())),
        other => Ok(Cow::Borrowed(other)),
    }
}

pub fn decode_object(raw: &Value) -> Result<Cow<'_, Value>, DecodeError> {
    let decoded = decode_once(raw)?;
    if decoded.is_object() {
        Ok(decoded)
    } else {
        Err(DecodeError::NotAnObject(json_type_name(&decoded)))
    }
}

/// Follow a dotted path through nested objects. "" is the value itself.
pub fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }
    path.split('.')
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

/// Values at every scope × key path present in `payload`, scopes outermost.
fn present_values<'a>(
    payload: &'a Value,
    scopes: &'a [&'a str],
    keys: &'a [&'a str],
) -> impl Iterator<Item = &'a Value> + 'a {
    scopes
        .iter()
        .filter_map(move |scope| lookup_path(payload, scope))
        .filter(|scope| scope.is_object())
        .flat_map(move |scope| keys.iter().filter_map(move |key| lookup_path(scope, key)))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
