//! Generative backend integration
//!
//! A backend turns a composed prompt into a [`ModelResponse`]. Network, auth
//! and quota failures are returned as errors here and never reach the
//! response interpreter.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiGenerateClient;
pub use mock::MockGenerativeClient;

use crate::models::ModelResponse;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait GenerativeService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<ModelResponse>;
}
