//! Whole-matrix result formatting.

use super::{format_section_heading, to_pretty_json};
use crate::error::ApiError;
use crate::types::Matrix;
use comfy_table::Table;
use serde::Serialize;
use std::path::PathBuf;

/// Result of `compute-matrix`.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixReport {
    pub resolver: String,
    pub matrix: Matrix,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_path: Option<PathBuf>,
    pub exported: bool,
}

impl MatrixReport {
    /// Cells whose resolution degraded to an error value.
    pub fn degraded_cells(&self) -> usize {
        self.matrix
            .iter_cells()
            .filter(|cell| cell.value.starts_with("ERROR:"))
            .count()
    }
}

pub fn format_matrix_text(report: &MatrixReport) -> String {
    let matrix = &report.matrix;
    let (rows, cols) = matrix.shape();

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    let mut header = vec![String::new()];
    header.extend(matrix.col_labels().iter().cloned());
    table.set_header(header);
    for (label, row) in matrix.row_labels().iter().zip(matrix.cells()) {
        let mut line = vec![label.clone()];
        line.extend(row.iter().map(|cell| cell.value.clone()));
        table.add_row(line);
    }

    let mut out = format!(
        "{}\n  Station: {}\n  Shape: {}×{}\n  Resolver: {}\n\n{}",
        format_section_heading(&format!("Matrix {}", matrix.name())),
        matrix.station(),
        rows,
        cols,
        report.resolver,
        table
    );
    let degraded = report.degraded_cells();
    if degraded > 0 {
        out.push_str(&format!("\n\n{} of {} cells degraded", degraded, rows * cols));
    }
    if let Some(path) = &report.trace_path {
        out.push_str(&format!("\n\nTrace: {}", path.display()));
    }
    if report.exported {
        out.push_str("\nExported to working memory");
    }
    out
}

pub fn format_matrix_json(report: &MatrixReport) -> Result<String, ApiError> {
    to_pretty_json(report)
}
