use super::GenerativeService;
use crate::models::ModelResponse;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

enum MockReply {
    Response(ModelResponse),
    Failure(String),
}

/// Scripted backend for tests and offline runs.
///
/// Replies are served in order and cycle once exhausted. Without any scripted
/// reply it answers with an empty file list.
#[derive(Clone)]
pub struct MockGenerativeClient {
    replies: Arc<Mutex<Vec<MockReply>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockGenerativeClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_text_response(self, text: impl Into<String>) -> Self {
        self.with_response(ModelResponse::Text(text.into()))
    }

    pub fn with_response(self, response: ModelResponse) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(MockReply::Response(response));
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(MockReply::Failure(message.into()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn get_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockGenerativeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerativeService for MockGenerativeClient {
    async fn generate(&self, prompt: &str) -> Result<ModelResponse> {
        let count = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };

        let replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Ok(ModelResponse::Text(r#"{"files": []}"#.to_string()));
        }

        match &replies[(count - 1) % replies.len()] {
            MockReply::Response(response) => Ok(response.clone()),
            MockReply::Failure(message) => Err(Error::AiProvider(message.clone())),
        }
    }
}
