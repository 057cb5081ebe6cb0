//! Structural checks on matrices, cells and provenance.
//!
//! `ensure_dims` guards operations and fails fast. The `validate_*`
//! functions collect every problem they find and return the messages, for
//! reporting on matrices that were already built.

use crate::error::PreconditionError;
use crate::types::{Cell, Matrix};
use std::collections::HashSet;

/// Check that `a` and `b` have compatible shapes for `op`.
///
/// `*` needs `a.cols == b.rows`; `+` and `⊙` need equal shapes. Other
/// operations carry no shape requirement.
pub fn ensure_dims(a: &Matrix, b: &Matrix, op: &str) -> Result<(), PreconditionError> {
    let mismatch = |requirement| PreconditionError::ShapeMismatch {
        operation: op.to_string(),
        requirement,
        left: a.shape(),
        right: b.shape(),
    };

    match op {
        "*" if a.cols() != b.rows() => Err(mismatch("left.cols == right.rows")),
        "+" | "⊙" if a.shape() != b.shape() => Err(mismatch("identical shapes")),
        _ => Ok(()),
    }
}

pub fn validate_cell(cell: &Cell) -> Vec<String> {
    let mut errors = Vec::new();
    if cell.value.trim().is_empty() {
        errors.push("Cell value must be a non-empty string".to_string());
    }
    errors
}

pub fn validate_matrix(matrix: &Matrix) -> Vec<String> {
    let mut errors = Vec::new();

    if matrix.name().is_empty() {
        errors.push("Matrix missing name".to_string());
    }
    if matrix.station().is_empty() {
        errors.push("Matrix missing station".to_string());
    }

    let (rows, cols) = matrix.shape();
    if rows == 0 || cols == 0 {
        errors.push(format!("Invalid dimensions: ({}, {})", rows, cols));
    }

    if matrix.cells().len() != rows {
        errors.push("row_labels length does not match number of rows".to_string());
    }

    let mut seen = HashSet::new();
    for (r, row) in matrix.cells().iter().enumerate() {
        if row.len() != cols {
            errors.push(format!(
                "row {} length mismatch: expected {}, got {}",
                r,
                cols,
                row.len()
            ));
        }
        for cell in row {
            let id = format!("{}-{}-{}", matrix.name(), cell.row, cell.col);
            errors.extend(validate_cell(cell).into_iter().map(|e| format!("Cell {}: {}", id, e)));

            if cell.row >= rows || cell.col >= cols {
                errors.push(format!("Cell {} out of bounds: ({}, {})", id, cell.row, cell.col));
            }
            if !seen.insert((cell.row, cell.col)) {
                errors.push(format!("Duplicate cell at position ({}, {})", cell.row, cell.col));
            }
        }
    }

    errors
}

/// Provenance must be present and name the operation and coordinates that
/// produced the cell.
pub fn validate_provenance(cell: &Cell) -> Vec<String> {
    if cell.provenance.is_empty() {
        return vec!["Cell missing provenance".to_string()];
    }

    let mut errors = Vec::new();
    if !cell.provenance.contains_key("operation") {
        errors.push("Provenance missing operation type".to_string());
    }
    if !cell.provenance.contains_key("coordinates") {
        errors.push("Provenance missing coordinates".to_string());
    }
    errors
}
