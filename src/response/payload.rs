//! Locating and decoding the JSON object embedded in a model response.
//!
//! Location is a simple heuristic: the shortest span from the
//! first `{` to the next `}`. It is not nesting-aware, so an object with nested
//! braces is clipped at the first inner `}`. When the clipped span does not
//! decode, the decoder retries with the complete JSON value starting at the
//! same brace, and finally with the whole text.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Decoded top-level JSON object of a response.
pub type ParsedPayload = Map<String, Value>;

static JSON_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*?\}").expect("JSON span pattern is valid"));

/// Candidate substring for decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadSpan<'a> {
    pub candidate: &'a str,
    /// Byte offset of the opening brace, when a span was found.
    pub start: Option<usize>,
}

/// Find the first `{ ... }` span (shortest match), or fall back to the whole text.
pub fn locate_payload(text: &str) -> PayloadSpan<'_> {
    match JSON_SPAN.find(text) {
        Some(m) => PayloadSpan {
            candidate: m.as_str(),
            start: Some(m.start()),
        },
        None => PayloadSpan {
            candidate: text,
            start: None,
        },
    }
}

/// Decode the located span as a JSON object.
///
/// Returns `None` when no attempt yields an object; the caller treats that as
/// an uninterpretable response.
pub fn decode_payload(text: &str, span: &PayloadSpan<'_>) -> Option<ParsedPayload> {
    if let Some(payload) = decode_object(span.candidate) {
        return Some(payload);
    }

    if let Some(start) = span.start {
        if let Some(payload) = decode_leading_object(&text[start..]) {
            tracing::debug!("Recovered nested JSON object at offset {}", start);
            return Some(payload);
        }
    }

    if span.candidate.len() != text.len() {
        if let Some(payload) = decode_object(text) {
            return Some(payload);
        }
    }

    tracing::debug!(
        "No JSON object could be decoded from response ({} chars)",
        text.len()
    );
    None
}

fn decode_object(candidate: &str) -> Option<ParsedPayload> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Parse the first complete JSON value at the start of `text`, ignoring
/// whatever trails it.
fn decode_leading_object(text: &str) -> Option<ParsedPayload> {
    let mut values = serde_json::Deserializer::from_str(text).into_iter::<Value>();
    match values.next() {
        Some(Ok(Value::Object(map))) => Some(map),
        _ => None,
    }
}
