//! Cell export.
//!
//! After each cell the pipeline hands `(Cell, SemanticContext)` to an
//! optional [`CellExporter`]. [`SledWorkingMemoryExporter`] keeps the
//! "working memory" of a run in a sled database: matrices, cells and the
//! stage values recorded in each cell's provenance.

use crate::context::SemanticContext;
use crate::error::StorageError;
use crate::types::{Cell, Provenance};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sled::{Db, Tree};
use std::path::Path;

const TREE_MATRICES: &str = "matrices";
const TREE_CELLS: &str = "cells";
const TREE_STAGES: &str = "stages";

/// Provenance keys persisted as stage records, with their stage kind.
const STAGE_KEYS: [(&str, &str); 6] = [
    ("stage_1_products", "combinatorial"),
    ("stage_1_element_wise", "element_wise"),
    ("stage_1_synthesis", "synthesis"),
    ("stage_2_resolved", "semantic"),
    ("stage_2_lensed", "lensed"),
    ("stage_3_lensed", "lensed"),
];

/// Receives every computed cell together with its final-stage context.
pub trait CellExporter: Send + Sync {
    fn export_cell(&self, cell: &Cell, context: &SemanticContext) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRecord {
    pub name: String,
    pub station: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub id: String,
    pub matrix: String,
    pub row: usize,
    pub col: usize,
    pub value: String,
    pub row_label: String,
    pub col_label: String,
    pub provenance: Provenance,
    pub exported_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub cell_id: String,
    pub kind: String,
    pub key: String,
    pub value: Value,
}

/// `"<matrix>-<row>-<col>"`
pub fn cell_id(matrix: &str, row: usize, col: usize) -> String {
    format!("{}-{}-{}", matrix, row, col)
}

/// Sled-backed working-memory store.
#[derive(Clone)]
pub struct SledWorkingMemoryExporter {
    db: Db,
    matrices: Tree,
    cells: Tree,
    stages: Tree,
}

impl SledWorkingMemoryExporter {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Self::new(db)
    }

    pub fn new(db: Db) -> Result<Self, StorageError> {
        let matrices = db.open_tree(TREE_MATRICES)?;
        let cells = db.open_tree(TREE_CELLS)?;
        let stages = db.open_tree(TREE_STAGES)?;
        Ok(Self {
            db,
            matrices,
            cells,
            stages,
        })
    }

    pub fn load_matrix(&self, name: &str) -> Result<Option<MatrixRecord>, StorageError> {
        let Some(raw) = self.matrices.get(name.as_bytes())? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    pub fn load_cell(&self, id: &str) -> Result<Option<CellRecord>, StorageError> {
        let Some(raw) = self.cells.get(id.as_bytes())? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    /// Stage records for one cell, in stage order.
    pub fn load_stages(&self, id: &str) -> Result<Vec<StageRecord>, StorageError> {
        let prefix = format!("{}:", id);
        let mut out = Vec::new();
        for result in self.stages.scan_prefix(prefix.as_bytes()) {
            let (_, value) = result?;
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

impl CellExporter for SledWorkingMemoryExporter {
    fn export_cell(&self, cell: &Cell, context: &SemanticContext) -> Result<(), StorageError> {
        let matrix = context
            .matrix
            .clone()
            .ok_or_else(|| StorageError::NotFound("context has no matrix name".to_string()))?;
        let id = cell_id(&matrix, cell.row, cell.col);

        let matrix_record = MatrixRecord {
            name: matrix.clone(),
            station: context.station_context.clone(),
        };
        self.matrices
            .insert(matrix.as_bytes(), serde_json::to_vec(&matrix_record)?)?;

        let record = CellRecord {
            id: id.clone(),
            matrix,
            row: cell.row,
            col: cell.col,
            value: cell.value.clone(),
            row_label: context.row_label.clone(),
            col_label: context.col_label.clone(),
            provenance: cell.provenance.clone(),
            exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        self.cells.insert(id.as_bytes(), serde_json::to_vec(&record)?)?;

        let mut position = 0;
        for (key, kind) in STAGE_KEYS {
            let Some(value) = cell.provenance.get(key) else {
                continue;
            };
            let stage = StageRecord {
                cell_id: id.clone(),
                kind: kind.to_string(),
                key: key.to_string(),
                value: value.clone(),
            };
            let stage_key = format!("{}:{:02}", id, position);
            self.stages
                .insert(stage_key.as_bytes(), serde_json::to_vec(&stage)?)?;
            position += 1;
        }

        Ok(())
    }
}
