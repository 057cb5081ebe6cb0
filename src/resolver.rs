//! Semantic resolvers.
//!
//! The cell pipeline only needs two capabilities from a resolver: fuse a
//! term pair into one concept, and reinterpret content through the row and
//! column labels of the destination cell. `CellResolver` provides them over
//! an external model provider; `EchoResolver` is the deterministic,
//! offline double.

use crate::context::SemanticContext;
use async_trait::async_trait;

pub mod cell_resolver;
pub mod echo;

pub use cell_resolver::{
    canonical_operation, extract_json, validate_outcome, AttemptResult, CellResolver, PromptFragments,
    ResolutionMetadata, ResolutionOutcome, ResolverSettings, RetryPolicy, TemperatureTable,
};
pub use echo::EchoResolver;

/// Separator between the two terms of a semantic pair.
pub const PAIR_SEPARATOR: &str = " * ";

/// `"<left> * <right>"`
pub fn semantic_pair(left: &str, right: &str) -> String {
    format!("{}{}{}", left, PAIR_SEPARATOR, right)
}

/// Split a semantic pair at its first separator. A string without a
/// separator is returned whole as the left term with an empty right term.
pub fn split_pair(pair: &str) -> (&str, &str) {
    pair.split_once(PAIR_SEPARATOR).unwrap_or((pair, ""))
}

/// Capability interface used by the cell pipeline.
///
/// Implementations must not fail: a resolver that cannot reach its backend
/// reports that through the returned text instead. Returned text must be
/// non-empty; the pipeline rejects a blank lens result with
/// `PreconditionError::EmptyCellValue`.
#[async_trait]
pub trait SemanticResolver: Send + Sync {
    /// Stage 2: resolve `"left * right"` into a single concept.
    async fn resolve_semantic_pair(&self, pair: &str, context: &SemanticContext) -> String;

    /// Stage 3: interpret `content` through the context's row/column labels.
    async fn apply_ontological_lens(&self, content: &str, context: &SemanticContext) -> String;

    /// Short name for logs and CLI output.
    fn name(&self) -> &str;
}
