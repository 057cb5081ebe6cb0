//! Canonical input matrices.
//!
//! A and B frame the problem statement; J is B without its last ("Wisdom")
//! row and feeds the element-wise F computation.

use crate::error::PreconditionError;
use crate::types::Matrix;

pub const STATION_PROBLEM: &str = "Problem Statement";
pub const STATION_REQUIREMENTS: &str = "Requirements";
pub const STATION_OBJECTIVES: &str = "Objectives";

const A_ROWS: [&str; 3] = ["Normative", "Operative", "Evaluative"];
const A_COLS: [&str; 4] = ["Guiding", "Applying", "Judging", "Reflecting"];
const A_VALUES: [&[&str]; 3] = [
    &["Values", "Actions", "Benchmarks", "Feedback"],
    &["Principles", "Methods", "Standards", "Adaptation"],
    &["Objectives", "Coordination", "Evaluation", "Consolidation"],
];

const B_ROWS: [&str; 4] = ["Data", "Information", "Knowledge", "Wisdom"];
const B_COLS: [&str; 4] = ["Determinacy", "Sufficiency", "Completeness", "Consistency"];
const B_VALUES: [&[&str]; 4] = [
    &["Necessary", "Sufficient", "Complete", "Probability"],
    &["Contingent", "Insufficient", "Incomplete", "Possibility"],
    &["Fundamental", "Appropriate", "Holistic", "Feasibility"],
    &["Best Practices", "Limits of", "Justification for", "Practicality"],
];

/// Names accepted by [`canonical_matrix`].
pub const CANONICAL_NAMES: [&str; 3] = ["A", "B", "J"];

/// Matrix A (3×4).
pub fn matrix_a() -> Result<Matrix, PreconditionError> {
    Matrix::from_values("A", STATION_PROBLEM, &A_ROWS, &A_COLS, &A_VALUES)
}

/// Matrix B (4×4).
pub fn matrix_b() -> Result<Matrix, PreconditionError> {
    Matrix::from_values("B", STATION_PROBLEM, &B_ROWS, &B_COLS, &B_VALUES)
}

/// Matrix J (3×4): the first three rows of B.
pub fn matrix_j() -> Result<Matrix, PreconditionError> {
    Matrix::from_values("J", STATION_OBJECTIVES, &B_ROWS[..3], &B_COLS, &B_VALUES[..3])
}

/// Look up a canonical matrix by name.
pub fn canonical_matrix(name: &str) -> Result<Matrix, PreconditionError> {
    match name {
        "A" => matrix_a(),
        "B" => matrix_b(),
        "J" => matrix_j(),
        other => Err(PreconditionError::UnknownMatrix(other.to_string())),
    }
}

/// Check the canonical shapes and that J is the 3-row prefix of B.
pub fn validate_canonical_matrices() -> Result<(), PreconditionError> {
    let a = matrix_a()?;
    let b = matrix_b()?;
    let j = matrix_j()?;

    for (m, expected) in [(&a, (3, 4)), (&b, (4, 4)), (&j, (3, 4))] {
        if m.shape() != expected {
            return Err(PreconditionError::InvalidMatrix {
                matrix: m.name().to_string(),
                reason: format!("expected shape {:?}, got {:?}", expected, m.shape()),
            });
        }
    }

    for (r, row) in j.cells().iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if b.cell(r, c)?.value != cell.value {
                return Err(PreconditionError::InvalidMatrix {
                    matrix: "J".to_string(),
                    reason: format!("cell [{}][{}] should match matrix B", r, c),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_matrices_validate() {
        validate_canonical_matrices().unwrap();
    }

    #[test]
    fn test_canonical_shapes_and_labels() {
        let a = matrix_a().unwrap();
        assert_eq!(a.shape(), (3, 4));
        assert_eq!(a.row_labels()[0], "Normative");
        assert_eq!(a.cell(0, 0).unwrap().value, "Values");

        let b = matrix_b().unwrap();
        assert_eq!(b.shape(), (4, 4));
        assert_eq!(b.col_labels()[0], "Determinacy");
        assert_eq!(b.cell(3, 0).unwrap().value, "Best Practices");

        let j = matrix_j().unwrap();
        assert_eq!(j.row_labels(), &b.row_labels()[..3]);
        assert_eq!(j.station(), STATION_OBJECTIVES);
    }

    #[test]
    fn test_canonical_lookup() {
        for name in CANONICAL_NAMES {
            assert_eq!(canonical_matrix(name).unwrap().name(), name);
        }
        let err = canonical_matrix("Z").unwrap_err();
        assert_eq!(err.to_string(), "Unknown canonical matrix: Z. Available: A, B, J");
    }
}
