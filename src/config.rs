//! Configuration System
//!
//! Layered configuration for the calculator: merge-policy defaults, the
//! global user file, workspace files and `CHIRALITY__*` environment
//! variables, in increasing precedence. CLI flags are applied on top by the
//! command layer.

use crate::error::{ApiError, ResolutionError};
use crate::logging::{validate_logging_config, LoggingConfig};
use crate::prompt::{valley_summary, DEFAULT_STATIONS, SYSTEM_PROMPT};
use crate::provider::ModelProvider;
use crate::resolver::{ResolverSettings, RetryPolicy, TemperatureTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Environment variable holding the OpenAI key when none is configured.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const DEFAULT_PROBLEM: &str = "generating reliable knowledge";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChiralityConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub valley: ValleyConfig,

    #[serde(default)]
    pub tracing: TraceConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which semantic resolver backs the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    /// Deterministic offline resolver
    #[default]
    Echo,
    /// OpenAI chat completions
    #[value(name = "openai")]
    OpenAI,
    /// Ollama's OpenAI-compatible endpoint
    Ollama,
    /// Any other OpenAI-compatible endpoint
    Local,
}

impl ResolverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolverKind::Echo => "echo",
            ResolverKind::OpenAI => "openai",
            ResolverKind::Ollama => "ollama",
            ResolverKind::Local => "local",
        }
    }

    fn default_model(&self) -> Option<&'static str> {
        match self {
            ResolverKind::OpenAI => Some("gpt-4o"),
            ResolverKind::Ollama => Some("llama3.1"),
            ResolverKind::Echo | ResolverKind::Local => None,
        }
    }
}

/// Resolver and call-contract settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub kind: ResolverKind,

    /// Model id; defaults per provider kind
    #[serde(default)]
    pub model: Option<String>,

    /// API key; OpenAI falls back to OPENAI_API_KEY
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL for the chat-completions endpoint
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Per-operation temperature overrides, merged over the built-in table
    #[serde(default)]
    pub temperatures: HashMap<String, f32>,

    /// File whose contents replace the built-in system prompt
    #[serde(default)]
    pub system_prompt_path: Option<PathBuf>,
}

fn default_seed() -> u64 {
    42
}

fn default_max_tokens() -> u32 {
    200
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    400
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            kind: ResolverKind::default(),
            model: None,
            api_key: None,
            base_url: None,
            seed: default_seed(),
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            temperatures: HashMap::new(),
            system_prompt_path: None,
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_tokens == 0 {
            return Err("max_tokens must be positive".to_string());
        }
        if self.max_retries > 10 {
            return Err(format!("max_retries {} exceeds the limit of 10", self.max_retries));
        }
        for (op, temperature) in &self.temperatures {
            if !(0.0..=2.0).contains(temperature) {
                return Err(format!(
                    "temperature for '{}' must be within 0.0..=2.0, got {}",
                    op, temperature
                ));
            }
        }
        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err("model cannot be empty".to_string());
            }
        }
        if self.kind == ResolverKind::Local {
            if self.base_url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                return Err("local resolver requires base_url".to_string());
            }
            if self.model.is_none() {
                return Err("local resolver requires model".to_string());
            }
        }
        if let Some(url) = &self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("base_url must be an http(s) URL, got '{}'", url));
            }
        }
        Ok(())
    }

    pub fn model_name(&self) -> Option<String> {
        self.model
            .clone()
            .or_else(|| self.kind.default_model().map(str::to_string))
    }

    /// Provider for the configured kind; `None` for the echo resolver.
    pub fn to_model_provider(&self) -> Result<Option<ModelProvider>, ResolutionError> {
        let model = || {
            self.model_name().ok_or_else(|| {
                ResolutionError::Configuration(format!(
                    "{} resolver requires a model",
                    self.kind.as_str()
                ))
            })
        };

        let provider = match self.kind {
            ResolverKind::Echo => return Ok(None),
            ResolverKind::OpenAI => {
                let api_key = self
                    .api_key
                    .clone()
                    .filter(|k| !k.trim().is_empty())
                    .or_else(|| std::env::var(OPENAI_API_KEY_ENV).ok())
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| {
                        ResolutionError::Configuration(
                            "OpenAI API key required. Set OPENAI_API_KEY or pass --api-key"
                                .to_string(),
                        )
                    })?;
                ModelProvider::OpenAI {
                    model: model()?,
                    api_key,
                    base_url: self.base_url.clone(),
                }
            }
            ResolverKind::Ollama => ModelProvider::Ollama {
                model: model()?,
                base_url: self.base_url.clone(),
            },
            ResolverKind::Local => ModelProvider::LocalCustom {
                model: model()?,
                endpoint: self.base_url.clone().ok_or_else(|| {
                    ResolutionError::Configuration("local resolver requires base_url".to_string())
                })?,
                api_key: self.api_key.clone(),
            },
        };
        Ok(Some(provider))
    }

    /// Resolver settings with the system prompt loaded from
    /// `system_prompt_path` when set.
    pub fn settings(&self, workspace_root: &Path) -> Result<ResolverSettings, ApiError> {
        let system_prompt = match &self.system_prompt_path {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    workspace_root.join(path)
                };
                std::fs::read_to_string(&path).map_err(|e| {
                    ApiError::ConfigError(format!(
                        "Failed to read system prompt {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
            None => SYSTEM_PROMPT.to_string(),
        };

        let mut temperatures = TemperatureTable::default();
        for (operation, temperature) in &self.temperatures {
            temperatures.set(operation, *temperature);
        }

        Ok(ResolverSettings {
            seed: self.seed,
            max_tokens: self.max_tokens,
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: Duration::from_millis(self.base_delay_ms),
            },
            temperatures,
            system_prompt,
        })
    }
}

/// Position in the semantic valley, used for the summary line in prompts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValleyConfig {
    #[serde(default = "default_stations")]
    pub stations: Vec<String>,

    /// Index of the current station
    #[serde(default = "default_current_station")]
    pub current: Option<usize>,

    /// Problem statement for D synthesis
    #[serde(default = "default_problem")]
    pub problem: String,
}

fn default_stations() -> Vec<String> {
    DEFAULT_STATIONS.iter().map(|s| s.to_string()).collect()
}

fn default_current_station() -> Option<usize> {
    Some(1)
}

fn default_problem() -> String {
    DEFAULT_PROBLEM.to_string()
}

impl Default for ValleyConfig {
    fn default() -> Self {
        Self {
            stations: default_stations(),
            current: default_current_station(),
            problem: default_problem(),
        }
    }
}

impl ValleyConfig {
    pub fn validate(&self) -> Result<(), String> {
        let count = if self.stations.is_empty() {
            DEFAULT_STATIONS.len()
        } else {
            self.stations.len()
        };
        if let Some(current) = self.current {
            if current >= count {
                return Err(format!("current station index {} is out of range", current));
            }
        }
        if self.stations.iter().any(|s| s.trim().is_empty()) {
            return Err("station names cannot be empty".to_string());
        }
        if self.problem.trim().is_empty() {
            return Err("problem cannot be empty".to_string());
        }
        Ok(())
    }

    pub fn summary(&self) -> String {
        valley_summary(&self.stations, self.current)
    }
}

/// JSONL stage tracing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_trace_dir")]
    pub dir: PathBuf,
}

fn default_trace_dir() -> PathBuf {
    PathBuf::from("traces")
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_trace_dir(),
        }
    }
}

/// Working-memory export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_export_path")]
    pub path: PathBuf,
}

fn default_export_path() -> PathBuf {
    PathBuf::from(".chirality/working_memory")
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_export_path(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Resolver(String),
    Valley(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Resolver(msg) => write!(f, "Resolver: {}", msg),
            ValidationError::Valley(msg) => write!(f, "Valley: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ChiralityConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.resolver.validate() {
            errors.push(ValidationError::Resolver(e));
        }
        if let Err(e) = self.valley.validate() {
            errors.push(ValidationError::Valley(e));
        }
        if let Err(e) = validate_logging_config(&self.logging) {
            errors.push(ValidationError::Logging(e.to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all problems into a single `ApiError`.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })
    }
}

#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
