// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! JSON extraction from free-form model output
//!
//! Generative models asked to "respond in JSON" return plain JSON, fenced
//! JSON, or prose with a JSON object buried somewhere inside. This module
//! provides one narrow utility that handles all three, so callers never do
//! ad hoc fence stripping.

use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

/// Extract the first JSON object from free-form text.
///
/// Accepts, in order of preference:
/// - a bare JSON object,
/// - a Markdown-fenced block (```json or plain ```),
/// - prose containing a balanced `{ ... }` object.
///
/// Anything else fails with [`Error::MalformedCapabilityResponse`]. Top-level
/// non-object JSON (arrays, strings, numbers) is rejected as well; every
/// capability contract in this crate expects an object.
pub fn extract_json_object(text: &str) -> Result<JsonValue> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::MalformedCapabilityResponse {
            reason: "empty response".to_string(),
        });
    }

    let candidate = strip_code_fences(trimmed);

    if let Ok(value) = serde_json::from_str::<JsonValue>(candidate) {
        return require_object(value);
    }

    // Fall back to scanning for the first balanced object in the text.
    if let Some(object_text) = first_balanced_object(candidate) {
        let value = serde_json::from_str::<JsonValue>(object_text).map_err(|e| {
            Error::MalformedCapabilityResponse {
                reason: format!("embedded JSON object does not parse: {e}"),
            }
        })?;
        return require_object(value);
    }

    Err(Error::MalformedCapabilityResponse {
        reason: "no JSON object found in response".to_string(),
    })
}

fn require_object(value: JsonValue) -> Result<JsonValue> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(Error::MalformedCapabilityResponse {
            reason: format!("expected a JSON object, got {}", type_name(&value)),
        })
    }
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Strip a surrounding Markdown code fence, if present.
fn strip_code_fences(text: &str) -> &str {
    if !text.starts_with("```") {
        return text;
    }
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim()
}

/// Find the first balanced `{ ... }` span, respecting strings and escapes.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}
