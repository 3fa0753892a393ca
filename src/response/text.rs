use crate::ai::gemini::types::Candidate;
use crate::models::ModelResponse;

/// Normalize a model response into a single string.
///
/// Strategies are tried in a fixed order: the direct text field, then the
/// first part of the first candidate, then the generic string form of the
/// whole response. Never fails.
pub fn extract_text(response: &ModelResponse) -> String {
    match response {
        ModelResponse::Text(text) => text.clone(),
        ModelResponse::Candidates(candidates) => first_candidate_text(candidates)
            .map(str::to_string)
            .unwrap_or_else(|| response.to_string()),
        ModelResponse::Raw(_) => response.to_string(),
    }
}

fn first_candidate_text(candidates: &[Candidate]) -> Option<&str> {
    candidates
        .first()?
        .content
        .as_ref()?
        .parts
        .first()?
        .as_text()
}
