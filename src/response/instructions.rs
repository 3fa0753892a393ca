use super::payload::ParsedPayload;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Opening fence (with its info string) up to the next closing fence.
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[\s\S]*?```").expect("fence pattern is valid"));

/// Strip every fenced code block from `raw_text` and trim the rest.
///
/// An opening fence with no closing fence is kept as ordinary text.
pub fn derive_instructions(raw_text: &str) -> String {
    FENCED_BLOCK.replace_all(raw_text, "").trim().to_string()
}

/// The payload's own `instructions`, when usable.
///
/// A non-blank string is returned as-is. A list of strings is joined with
/// newlines, as long as it has at least one non-blank item.
pub fn explicit_instructions(payload: &ParsedPayload) -> Option<String> {
    match payload.get("instructions")? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(items) => {
            let lines = items
                .iter()
                .map(Value::as_str)
                .collect::<Option<Vec<&str>>>()?;
            if lines.iter().all(|line| line.trim().is_empty()) {
                return None;
            }
            Some(lines.join("\n"))
        }
        _ => None,
    }
}
