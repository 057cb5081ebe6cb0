//! Model Provider Abstraction
//!
//! The external semantic service behind the resolution client. Every supported
//! backend speaks the OpenAI chat-completions protocol (OpenAI itself, Ollama's
//! `/v1` surface, or a custom local server), so one HTTP client serves them all.

use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelProvider {
    OpenAI {
        model: String,
        api_key: String,
        base_url: Option<String>, // For custom endpoints (e.g., Azure OpenAI)
    },
    Ollama {
        model: String,
        base_url: Option<String>, // Default: http://localhost:11434/v1
    },
    LocalCustom {
        model: String,
        endpoint: String, // Full endpoint URL (e.g., http://localhost:8080/v1)
        api_key: Option<String>,
    },
}

impl ModelProvider {
    pub fn model(&self) -> &str {
        match self {
            ModelProvider::OpenAI { model, .. }
            | ModelProvider::Ollama { model, .. }
            | ModelProvider::LocalCustom { model, .. } => model,
        }
    }
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Completion options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>, // 0.0-2.0
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub seed: Option<u64>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.5),
            max_tokens: Some(200),
            top_p: Some(0.0),
            seed: None,
        }
    }
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub finish_reason: Option<String>,
}

/// Model provider client trait
#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    /// Generate a completion from a list of messages
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Get the model name
    fn model_name(&self) -> &str;
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn map_http_error(error: reqwest::Error) -> ProviderError {
    match error.status().map(|s| s.as_u16()) {
        Some(401) => ProviderError::AuthFailed(format!("Authentication failed: {}", error)),
        Some(429) => ProviderError::RateLimit(format!("Rate limit exceeded: {}", error)),
        Some(404) => ProviderError::ModelNotFound(format!("Model not found: {}", error)),
        Some(status) => ProviderError::RequestFailed(format!(
            "Request failed with status {}: {}",
            status, error
        )),
        None if error.is_timeout() => {
            ProviderError::RequestFailed(format!("Request timeout: {}", error))
        }
        None if error.is_connect() => {
            ProviderError::RequestFailed(format!("Connection error: {}", error))
        }
        None => ProviderError::Provider(format!("HTTP error: {}", error)),
    }
}

fn map_status_error(status: u16, body: String) -> ProviderError {
    match status {
        401 => ProviderError::AuthFailed(format!("Authentication failed: {}", body)),
        429 => ProviderError::RateLimit(format!("Rate limit exceeded: {}", body)),
        404 => ProviderError::ModelNotFound(format!("Model not found: {}", body)),
        _ => ProviderError::RequestFailed(format!("Request failed with status {}: {}", status, body)),
    }
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

fn build_provider_http_client() -> Result<Client, ProviderError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::Provider(format!("Failed to create HTTP client: {}", e)))
}

/// Chat-completions client shared by every OpenAI-compatible backend.
pub struct ChatCompletionsClient {
    client: Client,
    provider_name: &'static str,
    model: String,
    base_url: String,
    api_key: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(
        provider_name: &'static str,
        model: String,
        base_url: String,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = build_provider_http_client()?;
        Ok(Self {
            client,
            provider_name,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ModelProviderClient for ChatCompletionsClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: &messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            seed: options.seed,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut request_builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some(api_key) = &self.api_key {
            request_builder =
                request_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request_builder
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status_error(status, error_text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Provider(format!("Failed to parse response: {}", e)))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Provider("No choices in response".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            model: completion.model,
            finish_reason: choice.finish_reason,
        })
    }

    fn provider_name(&self) -> &str {
        self.provider_name
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Provider factory for creating provider clients
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(
        provider: &ModelProvider,
    ) -> Result<Box<dyn ModelProviderClient>, ProviderError> {
        let client = match provider {
            ModelProvider::OpenAI {
                model,
                api_key,
                base_url,
            } => {
                if api_key.trim().is_empty() {
                    return Err(ProviderError::NotConfigured(
                        "OpenAI API key required. Set OPENAI_API_KEY or pass --api-key".to_string(),
                    ));
                }
                ChatCompletionsClient::new(
                    "openai",
                    model.clone(),
                    base_url.clone().unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
                    Some(api_key.clone()),
                )?
            }
            ModelProvider::Ollama { model, base_url } => ChatCompletionsClient::new(
                "ollama",
                model.clone(),
                base_url.clone().unwrap_or_else(|| OLLAMA_BASE_URL.to_string()),
                None,
            )?,
            ModelProvider::LocalCustom {
                model,
                endpoint,
                api_key,
            } => ChatCompletionsClient::new(
                "local",
                model.clone(),
                endpoint.clone(),
                api_key.clone(),
            )?,
        };
        Ok(Box::new(client))
    }
}
