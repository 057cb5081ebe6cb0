//! Deterministic, zero-provider resolver.

use crate::context::SemanticContext;
use crate::resolver::{SemanticResolver, PAIR_SEPARATOR};
use async_trait::async_trait;

/// Swaps pair terms and prefixes lensed content with the cell's labels.
///
/// `"Values * Necessary"` resolves to `"Necessary Values"`; lensing yields
/// `"By applying <row> lens through <col> coordinates: <content>"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoResolver;

impl EchoResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SemanticResolver for EchoResolver {
    async fn resolve_semantic_pair(&self, pair: &str, _context: &SemanticContext) -> String {
        match pair.split_once(PAIR_SEPARATOR) {
            Some((left, right)) => format!("{} {}", right, left),
            None => format!("Resolved({})", pair),
        }
    }

    async fn apply_ontological_lens(&self, content: &str, context: &SemanticContext) -> String {
        format!(
            "By applying {} lens through {} coordinates: {}",
            context.row_label, context.col_label, content
        )
    }

    fn name(&self) -> &str {
        "echo"
    }
}
