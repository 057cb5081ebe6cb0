//! Provider-backed resolver.
//!
//! Every semantic operation goes through [`CellResolver::dispatch`], which
//! owns the call contract with the external model:
//! - temperature per operation kind
//! - deterministic prompt hashing
//! - JSON extraction and schema validation of the reply
//! - bounded retries with exponential backoff
//!
//! Dispatch never fails. When the retry budget is spent it returns a
//! degraded outcome whose text starts with `ERROR:` so that one unreachable
//! provider cannot abort a whole matrix computation.

use crate::context::{terms, OperationType, SemanticContext, Terms};
use crate::error::ResolutionError;
use crate::prompt::{self, SYSTEM_PROMPT};
use crate::provider::{
    ChatMessage, CompletionOptions, ModelProvider, ModelProviderClient, ProviderFactory,
};
use crate::resolver::{split_pair, SemanticResolver};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Validated reply from the semantic service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    pub text: String,
    pub terms_used: Vec<String>,
    pub warnings: Vec<String>,
}

impl ResolutionOutcome {
    pub fn new(text: impl Into<String>, terms_used: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            text: text.into(),
            terms_used,
            warnings,
        }
    }

    /// Degraded outcome returned once retries are exhausted.
    pub fn failure(operation: &str, reason: &str) -> Self {
        Self {
            text: format!("ERROR: Failed to process {}", operation),
            terms_used: Vec::new(),
            warnings: vec![format!("provider_failure: {}", reason)],
        }
    }

    pub fn is_failure(&self) -> bool {
        self.text.starts_with("ERROR:")
    }
}

/// Audit record attached to every dispatch, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetadata {
    pub model_id: String,
    pub latency_ms: u64,
    pub prompt_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_len: Option<usize>,
    pub attempts: u32,
    pub temperature: f32,
    pub max_tokens: u32,
    pub created_at: String,
    pub phase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Temperature lookup keyed by operation kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureTable {
    #[serde(default)]
    pub by_operation: HashMap<String, f32>,
    #[serde(default = "default_temperature")]
    pub default: f32,
}

fn default_temperature() -> f32 {
    0.5
}

impl Default for TemperatureTable {
    fn default() -> Self {
        let by_operation = [("multiply", 0.7), ("add", 0.5), ("interpret", 0.5)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        Self {
            by_operation,
            default: default_temperature(),
        }
    }
}

/// Operation name that all of its aliases share in the table.
pub fn canonical_operation(operation: &str) -> &str {
    match operation {
        "*" | "⊙" | "multiply" => "multiply",
        "+" | "add" => "add",
        other => other,
    }
}

impl TemperatureTable {
    pub fn temperature_for(&self, operation: &str) -> f32 {
        self.by_operation
            .get(canonical_operation(operation))
            .copied()
            .unwrap_or(self.default)
    }

    /// Set the temperature for an operation and every alias of it.
    pub fn set(&mut self, operation: &str, temperature: f32) {
        self.by_operation
            .insert(canonical_operation(operation).to_string(), temperature);
    }
}

/// Retry budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(400),
        }
    }
}

impl RetryPolicy {
    /// Total attempts allowed, first try included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay after failed attempt `attempt` (0-indexed): `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(20))
    }
}

/// Static configuration for a [`CellResolver`].
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub seed: u64,
    pub max_tokens: u32,
    pub retry: RetryPolicy,
    pub temperatures: TemperatureTable,
    /// Default system prompt; contexts may override it with `system_frame`.
    pub system_prompt: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            max_tokens: 200,
            retry: RetryPolicy::default(),
            temperatures: TemperatureTable::default(),
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

/// The fixed pieces a user prompt is assembled from, in output order.
#[derive(Debug, Clone)]
pub struct PromptFragments<'a> {
    pub valley_summary: &'a str,
    pub station: &'a str,
    pub row_label: &'a str,
    pub col_label: &'a str,
    pub operation: OperationType,
    pub terms: &'a Terms,
    pub instructions: Option<&'a str>,
}

impl<'a> PromptFragments<'a> {
    pub fn from_context(context: &'a SemanticContext) -> Self {
        Self {
            valley_summary: &context.valley_summary,
            station: &context.station_context,
            row_label: &context.row_label,
            col_label: &context.col_label,
            operation: context.operation_type,
            terms: &context.terms,
            instructions: context.operation_instructions.as_deref(),
        }
    }

    pub fn render(&self) -> String {
        let mut fragments = Vec::with_capacity(5);

        if !self.valley_summary.is_empty() {
            fragments.push(format!("Valley Context: {}", self.valley_summary));
        }
        fragments.push(format!("Station: {}", self.station));
        fragments.push(format!("Coordinates: ({}, {})", self.row_label, self.col_label));

        match self.instructions {
            Some(instructions) => fragments.push(format!("Operation: {}", instructions)),
            None => {
                if let Some(default) = self.operation.default_instructions() {
                    fragments.push(format!("Operation: {}", default));
                }
            }
        }

        fragments.push(format!("Terms: {}", Value::Object(self.terms.clone())));
        fragments.join("\n\n")
    }
}

/// Result of one attempt, classified against the remaining budget.
#[derive(Debug)]
pub enum AttemptResult {
    Success(AttemptSuccess),
    RetryableFailure(ResolutionError),
    ExhaustedFailure(ResolutionError),
}

#[derive(Debug)]
pub struct AttemptSuccess {
    pub outcome: ResolutionOutcome,
    pub model_id: String,
    pub raw_len: usize,
}

/// Locate the JSON object in a model reply, tolerating surrounding prose.
pub fn extract_json(text: &str) -> Result<&str, ResolutionError> {
    if text.is_empty() {
        return Err(ResolutionError::MalformedResponse(
            "Empty model output".to_string(),
        ));
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(&text[start..=end]),
        _ => Err(ResolutionError::MalformedResponse(
            "No JSON object found in model output".to_string(),
        )),
    }
}

fn string_list(obj: &serde_json::Map<String, Value>, key: &str) -> Result<Vec<String>, ResolutionError> {
    let invalid = || ResolutionError::MalformedResponse(format!("'{}' must be list[str]", key));
    obj[key]
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

/// Check a parsed reply against the `{text, terms_used, warnings}` schema.
pub fn validate_outcome(value: &Value) -> Result<ResolutionOutcome, ResolutionError> {
    let obj = value.as_object().ok_or_else(|| {
        ResolutionError::MalformedResponse("Output must be a JSON object".to_string())
    })?;

    if !["text", "terms_used", "warnings"]
        .iter()
        .all(|key| obj.contains_key(*key))
    {
        return Err(ResolutionError::MalformedResponse(
            "Missing required keys (text, terms_used, warnings)".to_string(),
        ));
    }

    let text = obj["text"]
        .as_str()
        .ok_or_else(|| ResolutionError::MalformedResponse("'text' must be string".to_string()))?;
    if text.trim().is_empty() {
        return Err(ResolutionError::MalformedResponse(
            "'text' must not be empty".to_string(),
        ));
    }

    Ok(ResolutionOutcome {
        text: text.to_string(),
        terms_used: string_list(obj, "terms_used")?,
        warnings: string_list(obj, "warnings")?,
    })
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Resolver backed by an external model provider.
pub struct CellResolver {
    client: Box<dyn ModelProviderClient>,
    settings: ResolverSettings,
    system_version: String,
}

impl CellResolver {
    pub fn new(client: Box<dyn ModelProviderClient>, settings: ResolverSettings) -> Self {
        let system_version = prompt::text_hash(&settings.system_prompt);
        Self {
            client,
            settings,
            system_version,
        }
    }

    /// Build a resolver for a provider configuration. Missing credentials
    /// fail here, before any pipeline work starts.
    pub fn from_provider(
        provider: &ModelProvider,
        settings: ResolverSettings,
    ) -> Result<Self, ResolutionError> {
        let client = ProviderFactory::create_client(provider).map_err(|e| match e {
            crate::error::ProviderError::NotConfigured(msg) => ResolutionError::Configuration(msg),
            other => ResolutionError::Configuration(other.to_string()),
        })?;
        Ok(Self::new(client, settings))
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Hash of the active default system prompt.
    pub fn system_version(&self) -> &str {
        &self.system_version
    }

    /// Assemble the user prompt for `context`. An explicit
    /// `operation_instructions` wins over the context's own override, which
    /// wins over the default phrasing for the operation.
    pub fn assemble_prompt(
        &self,
        context: &SemanticContext,
        operation_instructions: Option<&str>,
    ) -> String {
        let mut fragments = PromptFragments::from_context(context);
        if operation_instructions.is_some() {
            fragments.instructions = operation_instructions;
        }
        fragments.render()
    }

    fn system_prompt_for<'a>(&'a self, context: &'a SemanticContext) -> &'a str {
        context
            .system_frame
            .as_deref()
            .unwrap_or(&self.settings.system_prompt)
    }

    fn render_with(&self, context: &SemanticContext, operation: OperationType, terms: &Terms) -> String {
        PromptFragments {
            operation,
            terms,
            ..PromptFragments::from_context(context)
        }
        .render()
    }

    fn classify(&self, attempt: u32, result: Result<AttemptSuccess, ResolutionError>) -> AttemptResult {
        match result {
            Ok(success) => AttemptResult::Success(success),
            Err(err) if err.is_transient() && attempt < self.settings.retry.max_retries => {
                AttemptResult::RetryableFailure(err)
            }
            Err(err) => AttemptResult::ExhaustedFailure(err),
        }
    }

    async fn attempt_once(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<AttemptSuccess, ResolutionError> {
        let response = self.client.complete(messages, options).await?;
        let raw = response.content;
        let json = extract_json(&raw)?;
        let value: Value = serde_json::from_str(json).map_err(|e| {
            ResolutionError::MalformedResponse(format!("Invalid JSON in model output: {}", e))
        })?;
        let outcome = validate_outcome(&value)?;
        Ok(AttemptSuccess {
            outcome,
            model_id: response.model,
            raw_len: raw.len(),
        })
    }

    /// Send one system + user prompt pair to the provider under the retry
    /// contract. Never fails; see the module docs.
    pub async fn dispatch(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        operation: &str,
    ) -> (ResolutionOutcome, ResolutionMetadata) {
        let temperature = self.settings.temperatures.temperature_for(operation);
        let prompt_hash = prompt::prompt_hash(system_prompt, user_prompt);
        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_prompt),
        ];
        let options = CompletionOptions {
            temperature: Some(temperature),
            max_tokens: Some(self.settings.max_tokens),
            top_p: Some(0.0),
            seed: Some(self.settings.seed),
        };
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            debug!(
                operation,
                attempt = attempt + 1,
                prompt_hash = %prompt_hash,
                "Dispatching resolution request"
            );
            let result = self.attempt_once(messages.clone(), options.clone()).await;

            match self.classify(attempt, result) {
                AttemptResult::Success(success) => {
                    let metadata = ResolutionMetadata {
                        model_id: success.model_id,
                        latency_ms: started.elapsed().as_millis() as u64,
                        prompt_hash,
                        system_version: Some(self.system_version.clone()),
                        raw_len: Some(success.raw_len),
                        attempts: attempt + 1,
                        temperature,
                        max_tokens: self.settings.max_tokens,
                        created_at: now_iso(),
                        phase: operation.to_string(),
                        error: None,
                    };
                    return (success.outcome, metadata);
                }
                AttemptResult::RetryableFailure(err) => {
                    let delay = self.settings.retry.delay_for(attempt);
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Resolution attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                AttemptResult::ExhaustedFailure(err) => {
                    let reason = err.to_string();
                    warn!(
                        operation,
                        attempts = attempt + 1,
                        error = %reason,
                        "Resolution failed permanently, returning degraded outcome"
                    );
                    let metadata = ResolutionMetadata {
                        model_id: self.client.model_name().to_string(),
                        latency_ms: started.elapsed().as_millis() as u64,
                        prompt_hash,
                        system_version: None,
                        raw_len: None,
                        attempts: attempt + 1,
                        temperature,
                        max_tokens: self.settings.max_tokens,
                        created_at: now_iso(),
                        phase: "error".to_string(),
                        error: Some(reason.clone()),
                    };
                    return (ResolutionOutcome::failure(operation, &reason), metadata);
                }
            }
        }
    }
}

#[async_trait]
impl SemanticResolver for CellResolver {
    async fn resolve_semantic_pair(&self, pair: &str, context: &SemanticContext) -> String {
        let (term_a, term_b) = split_pair(pair);
        let pair_terms = terms([("term_a", term_a), ("term_b", term_b)]);
        let user_prompt = self.render_with(context, OperationType::Multiply, &pair_terms);

        let (outcome, metadata) = self
            .dispatch(self.system_prompt_for(context), &user_prompt, "multiply")
            .await;
        debug!(
            pair,
            attempts = metadata.attempts,
            latency_ms = metadata.latency_ms,
            "Resolved semantic pair"
        );
        outcome.text
    }

    async fn apply_ontological_lens(&self, content: &str, context: &SemanticContext) -> String {
        let lens_terms = terms([("content", content)]);
        let user_prompt = self.render_with(context, OperationType::Interpret, &lens_terms);

        let (outcome, metadata) = self
            .dispatch(self.system_prompt_for(context), &user_prompt, "interpret")
            .await;
        debug!(
            row_label = %context.row_label,
            col_label = %context.col_label,
            attempts = metadata.attempts,
            latency_ms = metadata.latency_ms,
            "Applied ontological lens"
        );
        outcome.text
    }

    fn name(&self) -> &str {
        self.client.provider_name()
    }
}
