//! Matrix-level wrappers: run the cell pipeline over every output
//! coordinate in row-major order and assemble the result.

use crate::error::PreconditionError;
use crate::matrices::{STATION_OBJECTIVES, STATION_REQUIREMENTS};
use crate::pipeline::cell::{compute_cell_c, compute_cell_f, synthesize_cell_d};
use crate::pipeline::Collaborators;
use crate::resolver::SemanticResolver;
use crate::types::Matrix;
use crate::validate::ensure_dims;
use tracing::info;

/// C = A · B, shaped `a.rows × b.cols` with A's row labels and B's column
/// labels.
pub async fn compute_matrix_c(
    a: &Matrix,
    b: &Matrix,
    resolver: &dyn SemanticResolver,
    valley_summary: &str,
    collaborators: &Collaborators<'_>,
) -> Result<Matrix, PreconditionError> {
    ensure_dims(a, b, "*")?;

    let mut cells = Vec::with_capacity(a.rows());
    for i in 0..a.rows() {
        let mut row = Vec::with_capacity(b.cols());
        for j in 0..b.cols() {
            row.push(compute_cell_c(i, j, a, b, resolver, valley_summary, collaborators).await?);
        }
        cells.push(row);
    }

    info!(matrix = "C", rows = a.rows(), cols = b.cols(), "Computed matrix");
    Matrix::new(
        "C",
        STATION_REQUIREMENTS,
        a.row_labels().to_vec(),
        b.col_labels().to_vec(),
        cells,
    )
}

/// F = J ⊙ C, shaped and labelled like J.
pub async fn compute_matrix_f(
    jm: &Matrix,
    c: &Matrix,
    resolver: &dyn SemanticResolver,
    valley_summary: &str,
    collaborators: &Collaborators<'_>,
) -> Result<Matrix, PreconditionError> {
    ensure_dims(jm, c, "⊙")?;

    let (rows, cols) = jm.shape();
    let mut cells = Vec::with_capacity(rows);
    for i in 0..rows {
        let mut row = Vec::with_capacity(cols);
        for j in 0..cols {
            row.push(compute_cell_f(i, j, jm, c, resolver, valley_summary, collaborators).await?);
        }
        cells.push(row);
    }

    info!(matrix = "F", rows, cols, "Computed matrix");
    Matrix::new(
        "F",
        STATION_OBJECTIVES,
        jm.row_labels().to_vec(),
        jm.col_labels().to_vec(),
        cells,
    )
}

/// D from A and F, shaped and labelled like A.
pub async fn synthesize_matrix_d(
    a: &Matrix,
    f: &Matrix,
    problem: &str,
    resolver: &dyn SemanticResolver,
    valley_summary: &str,
    collaborators: &Collaborators<'_>,
) -> Result<Matrix, PreconditionError> {
    ensure_dims(a, f, "+")?;

    let (rows, cols) = a.shape();
    let mut cells = Vec::with_capacity(rows);
    for i in 0..rows {
        let mut row = Vec::with_capacity(cols);
        for j in 0..cols {
            row.push(
                synthesize_cell_d(i, j, a, f, problem, resolver, valley_summary, collaborators)
                    .await?,
            );
        }
        cells.push(row);
    }

    info!(matrix = "D", rows, cols, "Computed matrix");
    Matrix::new(
        "D",
        STATION_OBJECTIVES,
        a.row_labels().to_vec(),
        a.col_labels().to_vec(),
        cells,
    )
}
