//! Pull a JSON object out of free-form LLM output
//!
//! Models wrap JSON in prose or markdown fences. Callers get an object back
//! or an empty map; never an error.

use serde_json::{Map, Value};

/// Extract the first usable JSON object from `text`.
///
/// Tries, in order: the whole text, a ```json fenced block, the outermost
/// `{ ... }` span. Returns an empty map when none parses to an object.
pub fn extract_json_object(text: &str) -> Map<String, Value> {
    let trimmed = text.trim();

    if let Some(object) = parse_object(trimmed) {
        return object;
    }

    if let Some(object) = fenced_block(trimmed).and_then(parse_object) {
        return object;
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Some(object) = parse_object(&trimmed[start..=end]) {
                return object;
            }
        }
    }

    Map::new()
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```json").map(|i| i + 7).or_else(|| text.find("```").map(|i| i + 3))?;
    let after = &text[start..];
    let end = after.find("```")?;
    Some(after[..end].trim())
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
