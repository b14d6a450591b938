//! Parsing of free-form model replies.
//!
//! Replies are parsed into an untyped `serde_json::Value` first and then checked
//! against the shape the caller asked for. Any mismatch is an [`AiOutputError`],
//! which callers answer with their fallback strategy.

use crate::domain::ResolvedSuggestion;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, thiserror::Error)]
pub enum AiOutputError {
    #[error("reply contains no JSON object")]
    NoJsonObject,
    #[error("reply is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("reply has an unexpected shape: {0}")]
    Shape(&'static str),
}

fn code_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"```(?:json)?\n?|\n?```").expect("fence pattern is valid"))
}

/// Removes markdown code fences (```` ```json ```` and ```` ``` ````) and trims.
pub fn strip_code_fences(text: &str) -> String {
    code_fence().replace_all(text, "").trim().to_string()
}

/// Finds the first balanced `{...}` block, ignoring braces inside JSON strings.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses a reply that should be a JSON array of course identifiers.
pub fn parse_id_array(text: &str) -> Result<Vec<String>, AiOutputError> {
    let value: Value = serde_json::from_str(&strip_code_fences(text))?;
    let items = value
        .as_array()
        .ok_or(AiOutputError::Shape("expected an array of identifiers"))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or(AiOutputError::Shape("identifiers must be strings"))
        })
        .collect()
}

/// Parses a reply of the form `{"suggestions": [{"course_id": .., "reason": ..}]}`.
///
/// Prose around the object is tolerated.
pub fn parse_suggestions(text: &str) -> Result<Vec<ResolvedSuggestion>, AiOutputError> {
    let object = extract_json_object(text).ok_or(AiOutputError::NoJsonObject)?;
    let value: Value = serde_json::from_str(object)?;
    let entries = value
        .get("suggestions")
        .and_then(Value::as_array)
        .ok_or(AiOutputError::Shape("expected a `suggestions` array"))?;

    entries
        .iter()
        .map(|entry| {
            let course_id = entry
                .get("course_id")
                .and_then(Value::as_str)
                .ok_or(AiOutputError::Shape("`course_id` must be a string"))?;
            let reason = entry
                .get("reason")
                .and_then(Value::as_str)
                .ok_or(AiOutputError::Shape("`reason` must be a string"))?;
            Ok(ResolvedSuggestion::new(course_id, reason))
        })
        .collect()
}
