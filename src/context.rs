//! Semantic context for a single resolution call.
//!
//! Bundles the valley position, the ontology coordinates of the target cell,
//! the operation being performed and the terms it operates on. Every prompt
//! is assembled from one of these, and every trace event carries one.

use crate::error::PreconditionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Operation carried by a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    /// Mechanical k-product generation; never sent to the resolver.
    #[serde(rename = "combinatorial")]
    Combinatorial,
    /// Semantic multiplication of a term pair.
    #[serde(rename = "*")]
    Multiply,
    /// Ontological lensing through row/column labels.
    #[serde(rename = "interpret")]
    Interpret,
    /// Fixed-template synthesis for the D matrix.
    #[serde(rename = "synthesize")]
    Synthesize,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Combinatorial => "combinatorial",
            OperationType::Multiply => "*",
            OperationType::Interpret => "interpret",
            OperationType::Synthesize => "synthesize",
        }
    }

    /// Default operation line used when the context carries no override.
    pub fn default_instructions(&self) -> Option<&'static str> {
        match self {
            OperationType::Multiply => {
                Some("Semantic multiplication - fuse meanings at their intersection")
            }
            OperationType::Interpret => {
                Some("Ontological lensing - interpret through row/column context")
            }
            OperationType::Synthesize => Some("Synthesis - apply canonical D formula"),
            OperationType::Combinatorial => None,
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = PreconditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(PreconditionError::EmptyContextField("operation_type")),
            "combinatorial" => Ok(OperationType::Combinatorial),
            "*" | "multiply" => Ok(OperationType::Multiply),
            "interpret" => Ok(OperationType::Interpret),
            "synthesize" | "synthesis" => Ok(OperationType::Synthesize),
            other => Err(PreconditionError::UnknownOperation(other.to_string())),
        }
    }
}

/// Terms handed to the resolver, in insertion order.
pub type Terms = Map<String, Value>;

/// Build a `Terms` map from `(key, value)` pairs.
pub fn terms<I, K, V>(entries: I) -> Terms
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Everything a resolution call needs to know about where it happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawContext")]
pub struct SemanticContext {
    pub station_context: String,
    pub valley_summary: String,
    pub row_label: String,
    pub col_label: String,
    pub operation_type: OperationType,
    pub terms: Terms,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub j: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_frame: Option<String>,
}

/// Serialized form of a [`SemanticContext`], checked by
/// [`SemanticContext::new`] on the way in.
#[derive(Deserialize)]
struct RawContext {
    station_context: String,
    valley_summary: String,
    row_label: String,
    col_label: String,
    operation_type: OperationType,
    terms: Terms,
    #[serde(default)]
    matrix: Option<String>,
    #[serde(default)]
    i: Option<usize>,
    #[serde(default)]
    j: Option<usize>,
    #[serde(default)]
    operation_instructions: Option<String>,
    #[serde(default)]
    system_frame: Option<String>,
}

impl TryFrom<RawContext> for SemanticContext {
    type Error = PreconditionError;

    fn try_from(raw: RawContext) -> Result<Self, Self::Error> {
        let context = SemanticContext::new(
            raw.station_context,
            raw.valley_summary,
            raw.row_label,
            raw.col_label,
            raw.operation_type,
            raw.terms,
        )?;
        Ok(SemanticContext {
            matrix: raw.matrix,
            i: raw.i,
            j: raw.j,
            operation_instructions: raw.operation_instructions,
            system_frame: raw.system_frame,
            ..context
        })
    }
}

impl SemanticContext {
    /// Create a context, rejecting empty station, valley summary or terms.
    pub fn new(
        station_context: impl Into<String>,
        valley_summary: impl Into<String>,
        row_label: impl Into<String>,
        col_label: impl Into<String>,
        operation_type: OperationType,
        terms: Terms,
    ) -> Result<Self, PreconditionError> {
        let station_context = station_context.into();
        let valley_summary = valley_summary.into();

        if station_context.is_empty() {
            return Err(PreconditionError::EmptyContextField("station_context"));
        }
        if valley_summary.is_empty() {
            return Err(PreconditionError::EmptyContextField("valley_summary"));
        }
        if terms.is_empty() {
            return Err(PreconditionError::EmptyContextField("terms"));
        }

        Ok(Self {
            station_context,
            valley_summary,
            row_label: row_label.into(),
            col_label: col_label.into(),
            operation_type,
            terms,
            matrix: None,
            i: None,
            j: None,
            operation_instructions: None,
            system_frame: None,
        })
    }

    /// Same as [`SemanticContext::new`] with the operation given by name.
    pub fn parse(
        station_context: impl Into<String>,
        valley_summary: impl Into<String>,
        row_label: impl Into<String>,
        col_label: impl Into<String>,
        operation_type: &str,
        terms: Terms,
    ) -> Result<Self, PreconditionError> {
        let operation_type = operation_type.parse()?;
        Self::new(
            station_context,
            valley_summary,
            row_label,
            col_label,
            operation_type,
            terms,
        )
    }

    /// Tag the context with the target cell, for tracing and export.
    pub fn for_cell(mut self, matrix: impl Into<String>, i: usize, j: usize) -> Self {
        self.matrix = Some(matrix.into());
        self.i = Some(i);
        self.j = Some(j);
        self
    }

    pub fn with_operation_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.operation_instructions = Some(instructions.into());
        self
    }

    pub fn with_system_frame(mut self, system_frame: impl Into<String>) -> Self {
        self.system_frame = Some(system_frame.into());
        self
    }

    /// Copy of this context re-targeted at another operation and term set,
    /// keeping coordinates and overrides.
    pub fn rebased(&self, operation_type: OperationType, terms: Terms) -> Result<Self, PreconditionError> {
        if terms.is_empty() {
            return Err(PreconditionError::EmptyContextField("terms"));
        }
        Ok(Self {
            operation_type,
            terms,
            ..self.clone()
        })
    }

    /// `"(row, col)"` label pair used in prompts and provenance.
    pub fn coordinates(&self) -> String {
        format!("({}, {})", self.row_label, self.col_label)
    }
}
