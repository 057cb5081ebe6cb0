//! Shared fixtures for integration tests.

use async_trait::async_trait;
use chirality::error::ProviderError;
use chirality::provider::{ChatMessage, CompletionOptions, CompletionResponse, ModelProviderClient};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

pub const VALLEY: &str = "Semantic Valley: Problem Statement → [Requirements] → Objectives";

/// Provider double that replays canned replies and records every request.
#[derive(Clone, Default)]
pub struct CannedProvider {
    replies: Arc<Mutex<VecDeque<Result<String, ProviderError>>>>,
    requests: Arc<Mutex<Vec<(Vec<ChatMessage>, CompletionOptions)>>>,
}

impl CannedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<(Vec<ChatMessage>, CompletionOptions)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ModelProviderClient for CannedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        self.requests.lock().push((messages, options));
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::RequestFailed("script exhausted".to_string())));
        reply.map(|content| CompletionResponse {
            content,
            model: "canned-model".to_string(),
            finish_reason: Some("stop".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "canned"
    }

    fn model_name(&self) -> &str {
        "canned-model"
    }
}

/// A well-formed resolution reply.
pub fn reply(text: &str) -> Result<String, ProviderError> {
    Ok(serde_json::json!({ "text": text, "terms_used": [], "warnings": [] }).to_string())
}
