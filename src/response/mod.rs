//! Interpretation of generative model responses
//!
//! Turns whatever the backend returned into a [`GenerationResult`]: the file
//! records found in the embedded JSON payload plus human-readable
//! instructions. Malformed content never produces an error here; it degrades
//! into an empty file list, and an unreadable payload additionally sets
//! [`GenerationResult::error`].

pub mod files;
pub mod instructions;
pub mod payload;
pub mod text;

pub use files::{validate_files, FileList, FileListStatus};
pub use instructions::{derive_instructions, explicit_instructions};
pub use payload::{decode_payload, locate_payload, ParsedPayload, PayloadSpan};
pub use text::extract_text;

use crate::models::{GenerationResult, ModelResponse};
use tracing::{debug, info, warn};

/// Error recorded when no JSON object could be recovered from a response.
pub const DECODE_FAILURE: &str = "could not interpret response";

/// Interpret one model response. Pure apart from diagnostics: the same
/// response always yields the same result.
pub fn assemble(response: &ModelResponse) -> GenerationResult {
    let raw_text = extract_text(response);
    let span = locate_payload(&raw_text);

    let Some(payload) = decode_payload(&raw_text, &span) else {
        warn!(
            "Could not decode a JSON payload from model response ({} chars)",
            raw_text.len()
        );
        return GenerationResult {
            files: Vec::new(),
            instructions: derive_instructions(&raw_text),
            raw_text,
            error: Some(DECODE_FAILURE.to_string()),
        };
    };

    let FileList {
        files,
        dropped,
        status,
    } = validate_files(&payload);

    match status {
        FileListStatus::Valid => info!("Recovered {} files ({} dropped)", files.len(), dropped),
        other => info!("No files recovered from payload: {:?}", other),
    }

    let instructions = match explicit_instructions(&payload) {
        Some(explicit) => explicit,
        None => {
            debug!("Deriving instructions from response text");
            derive_instructions(&raw_text)
        }
    };

    GenerationResult {
        files,
        raw_text,
        instructions,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::types::{Candidate, Content, Part};
    use crate::models::FileRecord;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn text_response(text: &str) -> ModelResponse {
        ModelResponse::Text(text.to_string())
    }

    #[test]
    fn test_returns_all_valid_files_in_order() {
        let text = format!(
            "Here is your project:\n```json\n{}\n```\nEnjoy!",
            json!({
                "files": [
                    { "path": "app.py", "content": "print('hi')" },
                    { "path": "tests/test_app.py", "content": "def test(): pass" },
                    { "path": "README.md", "content": "# Demo" }
                ]
            })
        );

        let result = assemble(&text_response(&text));

        assert_eq!(
            result.files,
            vec![
                FileRecord::new("app.py", "print('hi')"),
                FileRecord::new("tests/test_app.py", "def test(): pass"),
                FileRecord::new("README.md", "# Demo"),
            ]
        );
        assert_eq!(result.error, None);
        assert_eq!(result.raw_text, text);
        assert_eq!(result.instructions, "Here is your project:\n\nEnjoy!");
    }

    #[test]
    fn test_excludes_exactly_the_malformed_entries() {
        let text = json!({
            "files": [
                { "path": "a.py", "content": "a" },
                { "path": "b.py" },
                { "path": "c.py", "content": "c" }
            ],
            "instructions": "Run a.py"
        })
        .to_string();

        let result = assemble(&text_response(&text));

        assert_eq!(
            result.files,
            vec![FileRecord::new("a.py", "a"), FileRecord::new("c.py", "c")]
        );
        assert_eq!(result.instructions, "Run a.py");
    }

    #[test]
    fn test_text_without_braces_is_a_decode_failure() {
        let text = "I could not do that.\n```\nsorry()\n```\nPlease try again.  ";

        let result = assemble(&text_response(text));

        assert!(result.files.is_empty());
        assert_eq!(result.error.as_deref(), Some(DECODE_FAILURE));
        assert_eq!(
            result.instructions,
            "I could not do that.\n\nPlease try again."
        );
    }

    #[test]
    fn test_explicit_instructions_win() {
        let text = r#"{"files": [{"path":"a.py","content":"x"}], "instructions": "Do X"}"#;

        let result = assemble(&text_response(text));

        assert_eq!(result.files, vec![FileRecord::new("a.py", "x")]);
        assert_eq!(result.instructions, "Do X");
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_empty_files_is_not_an_error() {
        let result = assemble(&text_response(r#"{"files": []}"#));

        assert!(result.files.is_empty());
        assert_eq!(result.error, None);
        assert_eq!(result.instructions, r#"{"files": []}"#);
    }

    #[test]
    fn test_all_invalid_entries_fall_back_to_derived_instructions() {
        let text = "Setup notes first.\n```json\n{\"files\": [{\"name\": \"a.py\"}]}\n```";

        let result = assemble(&text_response(text));

        assert!(result.files.is_empty());
        assert_eq!(result.error, None);
        assert_eq!(result.instructions, "Setup notes first.");
    }

    #[test]
    fn test_files_not_a_list_keeps_explicit_instructions() {
        let text = r#"{"files": "a.py", "instructions": "Create a.py by hand"}"#;

        let result = assemble(&text_response(text));

        assert!(result.files.is_empty());
        assert_eq!(result.error, None);
        assert_eq!(result.instructions, "Create a.py by hand");
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let response = text_response(
            "Intro\n{\"files\": [{\"path\": \"x.rs\", \"content\": \"fn main() {}\"}]}\nOutro",
        );

        let first = assemble(&response);
        let second = assemble(&response);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_reads_text_from_candidates() {
        let response = ModelResponse::Candidates(vec![Candidate {
            content: Some(Content {
                role: Some("model".to_string()),
                parts: vec![Part::text(
                    r#"{"files": [{"path": "index.js", "content": "console.log(1)"}]}"#,
                )],
            }),
            finish_reason: Some("STOP".to_string()),
        }]);

        let result = assemble(&response);

        assert_eq!(
            result.files,
            vec![FileRecord::new("index.js", "console.log(1)")]
        );
    }

    #[test]
    fn test_raw_response_without_payload_degrades() {
        let response = ModelResponse::Raw(json!(null));

        let result = assemble(&response);

        assert!(result.files.is_empty());
        assert_eq!(result.raw_text, "null");
        assert_eq!(result.error.as_deref(), Some(DECODE_FAILURE));
    }
}
