//! Gemini `generateContent` backend for project generation.

use super::types::{Content, GenerateContentRequest, GenerationConfig, Part};
use crate::ai::GenerativeService;
use crate::models::ModelResponse;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// Whole projects come back in one response, so the timeout is generous.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_OUTPUT_TOKENS: u32 = 8192;

/// Sends composed prompts to Gemini and hands back whatever it answered.
pub struct GeminiGenerateClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiGenerateClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, Client::new())
    }

    /// `model` may carry the `models/` prefix; it is dropped so the request
    /// path never doubles it.
    pub fn new_with_client(api_key: String, model: String, client: Client) -> Self {
        let model = model
            .strip_prefix("models/")
            .map(str::to_string)
            .unwrap_or(model);

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn request_for(prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(prompt)],
            }],
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(MAX_OUTPUT_TOKENS),
            }),
        }
    }
}

#[async_trait]
impl GenerativeService for GeminiGenerateClient {
    async fn generate(&self, prompt: &str) -> Result<ModelResponse> {
        tracing::info!(
            "Sending prompt to Gemini (model: {}, {} chars)",
            self.model,
            prompt.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .timeout(GENERATION_TIMEOUT)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_for(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!("Gemini rejected the generation request ({}): {}", status, body);
            return Err(Error::AiProvider(format!(
                "Gemini API error (status {}): {}",
                status, body
            )));
        }

        // Only the transport envelope has to be JSON; its shape is sniffed later.
        let envelope: Value = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Gemini returned a non-JSON body: {}", e);
            Error::AiProvider(format!("Unreadable Gemini response: {}", e))
        })?;
        tracing::debug!("Gemini response received ({} bytes)", body.len());

        Ok(ModelResponse::from_value(envelope))
    }
}
