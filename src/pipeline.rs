//! The three-stage cell pipeline and its matrix-level wrappers.
//!
//! Each output cell goes through:
//! 1. a local stage that builds the term strings (k-products, an element-wise
//!    pair or the synthesis template)
//! 2. semantic resolution of those strings (C and F only)
//! 3. ontological lensing through the cell's row and column labels
//!
//! Stages run strictly in order and every resolver call is awaited before
//! the next one starts. Precondition checks happen before the first call.

use crate::context::SemanticContext;
use crate::export::CellExporter;
use crate::resolver::ResolutionOutcome;
use crate::trace::{Extras, TraceSink};
use crate::types::Cell;
use tracing::warn;

pub mod cell;
pub mod matrix;

pub use cell::{compute_cell_c, compute_cell_f, synthesize_cell_d, synthesis_statement};
pub use matrix::{compute_matrix_c, compute_matrix_f, synthesize_matrix_d};

/// Stage labels reported to the trace sink.
pub mod stage {
    pub const COMBINATORIAL: &str = "combinatorial";
    pub const ELEMENT_WISE: &str = "element-wise";
    pub const SYNTHESIS: &str = "synthesis";
    pub const FINAL: &str = "final";

    /// `"product:k=<k>"`
    pub fn product(k: usize) -> String {
        format!("product:k={}", k)
    }
}

/// Optional observers of a pipeline run. Tracing and export are
/// independent; either, both or neither may be set.
#[derive(Clone, Copy, Default)]
pub struct Collaborators<'a> {
    pub trace: Option<&'a dyn TraceSink>,
    pub export: Option<&'a dyn CellExporter>,
}

impl<'a> Collaborators<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_trace(mut self, trace: &'a dyn TraceSink) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn with_export(mut self, export: &'a dyn CellExporter) -> Self {
        self.export = Some(export);
        self
    }

    pub fn is_traced(&self) -> bool {
        self.trace.is_some()
    }

    /// Report a stage event. Sink failures are logged and swallowed.
    pub(crate) fn emit_stage(
        &self,
        stage: &str,
        context: &SemanticContext,
        outcome: &ResolutionOutcome,
        extras: &Extras,
    ) {
        let Some(sink) = self.trace else {
            return;
        };
        if let Err(e) = sink.trace_stage(stage, context, outcome, extras) {
            warn!(
                stage,
                matrix = context.matrix.as_deref().unwrap_or(""),
                error = %e,
                "Trace sink failed, continuing"
            );
        }
    }

    /// Hand a finished cell to the exporter. Failures are logged and
    /// swallowed.
    pub(crate) fn emit_cell(&self, cell: &Cell, context: &SemanticContext) {
        let Some(exporter) = self.export else {
            return;
        };
        if let Err(e) = exporter.export_cell(cell, context) {
            warn!(
                matrix = context.matrix.as_deref().unwrap_or(""),
                row = cell.row,
                col = cell.col,
                error = %e,
                "Cell export failed, continuing"
            );
        }
    }
}
