//! Core data model: cells and matrices.
//!
//! A `Matrix` is a fixed grid of labelled string cells. Canonical inputs are
//! built from literal tables; derived outputs (C, F, D) are assembled by the
//! matrix pipeline from cells that carry the full provenance of the stages
//! that produced them. Both are immutable once constructed.

use crate::error::PreconditionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered record of every intermediate value produced for a cell.
pub type Provenance = Map<String, Value>;

/// Matrix shape as `(rows, cols)`.
pub type Shape = (usize, usize);

/// One labelled value in a matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub value: String,
    #[serde(default)]
    pub provenance: Provenance,
}

impl Cell {
    pub fn new(row: usize, col: usize, value: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            row,
            col,
            value: value.into(),
            provenance,
        }
    }

    /// Look up a provenance entry as a string.
    pub fn provenance_str(&self, key: &str) -> Option<&str> {
        self.provenance.get(key).and_then(Value::as_str)
    }

    /// Look up a provenance entry as a list of strings.
    pub fn provenance_list(&self, key: &str) -> Option<Vec<&str>> {
        self.provenance
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
    }
}

/// A named grid of cells with row and column ontology labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct Matrix {
    name: String,
    station: String,
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    cells: Vec<Vec<Cell>>,
}

/// Serialized form of a [`Matrix`], checked by [`Matrix::new`] on the way in.
#[derive(Deserialize)]
struct RawMatrix {
    name: String,
    station: String,
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    cells: Vec<Vec<Cell>>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = PreconditionError;

    fn try_from(raw: RawMatrix) -> Result<Self, Self::Error> {
        Matrix::new(raw.name, raw.station, raw.row_labels, raw.col_labels, raw.cells)
    }
}

impl Matrix {
    /// Build a matrix, checking that the grid agrees with its labels and
    /// that every cell sits at its own coordinate.
    pub fn new(
        name: impl Into<String>,
        station: impl Into<String>,
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        cells: Vec<Vec<Cell>>,
    ) -> Result<Self, PreconditionError> {
        let name = name.into();
        let invalid = |reason: String| PreconditionError::InvalidMatrix {
            matrix: name.clone(),
            reason,
        };

        if cells.len() != row_labels.len() {
            return Err(invalid(format!(
                "expected {} rows, got {}",
                row_labels.len(),
                cells.len()
            )));
        }
        for (r, row) in cells.iter().enumerate() {
            if row.len() != col_labels.len() {
                return Err(invalid(format!(
                    "row {} length mismatch: expected {}, got {}",
                    r,
                    col_labels.len(),
                    row.len()
                )));
            }
            for (c, cell) in row.iter().enumerate() {
                if cell.row != r || cell.col != c {
                    return Err(invalid(format!(
                        "cell at [{}][{}] claims coordinate ({}, {})",
                        r, c, cell.row, cell.col
                    )));
                }
            }
        }

        Ok(Self {
            name,
            station: station.into(),
            row_labels,
            col_labels,
            cells,
        })
    }

    /// Build a matrix from literal values. Every cell is tagged as coming
    /// from the canonical tables.
    pub fn from_values(
        name: &str,
        station: &str,
        row_labels: &[&str],
        col_labels: &[&str],
        values: &[&[&str]],
    ) -> Result<Self, PreconditionError> {
        let cells = values
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, value)| {
                        let mut provenance = Provenance::new();
                        provenance.insert("source".to_string(), Value::from("canonical_matrix"));
                        Cell::new(r, c, *value, provenance)
                    })
                    .collect()
            })
            .collect();

        Self::new(
            name,
            station,
            row_labels.iter().map(|s| s.to_string()).collect(),
            col_labels.iter().map(|s| s.to_string()).collect(),
            cells,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    pub fn cells(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    pub fn shape(&self) -> Shape {
        (self.row_labels.len(), self.col_labels.len())
    }

    pub fn rows(&self) -> usize {
        self.row_labels.len()
    }

    pub fn cols(&self) -> usize {
        self.col_labels.len()
    }

    /// Cell at `(row, col)`, if in range.
    pub fn get_cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// Cell at `(row, col)` or a precondition error naming this matrix.
    pub fn cell(&self, row: usize, col: usize) -> Result<&Cell, PreconditionError> {
        self.get_cell(row, col)
            .ok_or_else(|| PreconditionError::CoordinateOutOfRange {
                matrix: self.name.clone(),
                row,
                col,
                shape: self.shape(),
            })
    }

    /// Fail unless `(row, col)` addresses a cell of this matrix.
    pub fn check_coordinate(&self, row: usize, col: usize) -> Result<(), PreconditionError> {
        self.cell(row, col).map(|_| ())
    }

    /// Row-major iterator over all cells.
    pub fn iter_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().flat_map(|row| row.iter())
    }

    /// Plain values, row by row.
    pub fn values(&self) -> Vec<Vec<&str>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|cell| cell.value.as_str()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Matrix {
        Matrix::from_values("T", "Test", &["r0", "r1"], &["c0", "c1"], &[&["a", "b"], &["c", "d"]])
            .unwrap()
    }

    #[test]
    fn test_from_values_sets_coordinates() {
        let m = small();
        assert_eq!(m.shape(), (2, 2));
        for (r, row) in m.cells().iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                assert_eq!((cell.row, cell.col), (r, c));
                assert_eq!(cell.provenance_str("source"), Some("canonical_matrix"));
            }
        }
        assert_eq!(m.values(), vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_rejects_ragged_grid() {
        let err = Matrix::from_values("T", "Test", &["r0", "r1"], &["c0", "c1"], &[&["a", "b"], &["c"]])
            .unwrap_err();
        assert!(matches!(err, PreconditionError::InvalidMatrix { .. }));
    }

    #[test]
    fn test_rejects_misplaced_cell() {
        let cells = vec![vec![Cell::new(0, 1, "x", Provenance::new())]];
        let err = Matrix::new("T", "Test", vec!["r".into()], vec!["c".into()], cells).unwrap_err();
        assert!(err.to_string().contains("claims coordinate"));
    }

    #[test]
    fn test_deserialize_checks_grid() {
        let m = small();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(serde_json::from_str::<Matrix>(&json).unwrap(), m);

        let ragged = r#"{"name":"T","station":"Test","row_labels":["r0","r1"],"col_labels":["c0"],
            "cells":[[{"row":0,"col":0,"value":"a"}]]}"#;
        let err = serde_json::from_str::<Matrix>(ragged).unwrap_err();
        assert!(err.to_string().contains("expected 2 rows, got 1"));

        let misplaced = r#"{"name":"T","station":"Test","row_labels":["r0"],"col_labels":["c0"],
            "cells":[[{"row":5,"col":9,"value":"a"}]]}"#;
        let err = serde_json::from_str::<Matrix>(misplaced).unwrap_err();
        assert!(err.to_string().contains("claims coordinate (5, 9)"));
    }

    #[test]
    fn test_cell_out_of_range() {
        let m = small();
        assert!(m.get_cell(2, 0).is_none());
        let err = m.cell(0, 5).unwrap_err();
        assert_eq!(
            err,
            PreconditionError::CoordinateOutOfRange {
                matrix: "T".into(),
                row: 0,
                col: 5,
                shape: (2, 2)
            }
        );
    }
}
