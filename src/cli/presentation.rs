//! CLI presentation: text and json formatters per command family.

mod cell;
mod info;
mod matrix;

pub use cell::{abbreviate_value, format_cell_json, format_cell_text, CellReport};
pub use info::{format_info_json, format_info_text, InfoReport, MatrixSummary};
pub use matrix::{format_matrix_json, format_matrix_text, MatrixReport};

use crate::error::{ApiError, StorageError};
use owo_colors::OwoColorize;
use serde::Serialize;

/// Format a section heading with bold/underline.
pub(crate) fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|e| ApiError::Storage(StorageError::from(e)))
}
