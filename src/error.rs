//! Error types for the Chirality semantic calculator.

use thiserror::Error;

/// Caller misuse detected before any resolution work starts.
///
/// These are never retried: a shape mismatch or an empty context field
/// cannot become valid by trying again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("Required context field is empty: {0}")]
    EmptyContextField(&'static str),

    #[error("Unknown operation type: {0}")]
    UnknownOperation(String),

    #[error("Operation {operation} requires {requirement}, got {left:?} vs {right:?}")]
    ShapeMismatch {
        operation: String,
        requirement: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("Coordinate ({row}, {col}) out of range for matrix {matrix} with shape {shape:?}")]
    CoordinateOutOfRange {
        matrix: String,
        row: usize,
        col: usize,
        shape: (usize, usize),
    },

    #[error("Invalid matrix {matrix}: {reason}")]
    InvalidMatrix { matrix: String, reason: String },

    #[error("Unknown canonical matrix: {0}. Available: A, B, J")]
    UnknownMatrix(String),

    #[error("Resolver returned an empty value for {matrix}[{row},{col}]")]
    EmptyCellValue {
        matrix: String,
        row: usize,
        col: usize,
    },
}

/// Failures raised by the resolution client.
///
/// Only `Configuration` ever reaches a caller; the transient variants are
/// absorbed by the retry loop and converted into a degraded outcome.
#[derive(Debug, Clone, Error)]
pub enum ResolutionError {
    #[error("Resolver configuration error: {0}")]
    Configuration(String),

    #[error("Transient call failure: {0}")]
    Transient(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ResolutionError {
    /// Transient failures (including malformed responses) consume retry budget.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ResolutionError::Transient(_) | ResolutionError::MalformedResponse(_)
        )
    }
}

/// Errors reported by a model provider client.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Provider request failed: {0}")]
    RequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    AuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Provider model not found: {0}")]
    ModelNotFound(String),
}

impl From<ProviderError> for ResolutionError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(msg) => ResolutionError::Configuration(msg),
            other => ResolutionError::Transient(other.to_string()),
        }
    }
}

/// Storage errors from the trace and export sinks.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),
}

/// Top-level error for configuration, composition and the CLI.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
