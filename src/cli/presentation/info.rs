//! Framework summary formatting for `info`.

use super::{format_section_heading, to_pretty_json};
use crate::error::ApiError;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct MatrixSummary {
    pub name: String,
    pub station: String,
    pub rows: usize,
    pub cols: usize,
    /// How the matrix is obtained: "canonical" or its formula.
    pub source: String,
}

/// Result of `info`.
#[derive(Debug, Clone, Serialize)]
pub struct InfoReport {
    pub version: String,
    pub resolver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub valley: String,
    pub problem: String,
    pub canonical: Vec<MatrixSummary>,
    pub derived: Vec<MatrixSummary>,
    pub stages: Vec<String>,
}

fn matrix_line(m: &MatrixSummary) -> String {
    if m.source == "canonical" {
        format!("  {}: {}×{} ({})", m.name, m.rows, m.cols, m.station)
    } else {
        format!("  {}: {} ({}×{}, {})", m.name, m.source, m.rows, m.cols, m.station)
    }
}

pub fn format_info_text(report: &InfoReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading("Chirality Semantic Calculator")
    ));
    out.push_str(&format!("Version: {}\n", report.version));
    match &report.model {
        Some(model) => out.push_str(&format!("Resolver: {} ({})\n", report.resolver, model)),
        None => out.push_str(&format!("Resolver: {}\n", report.resolver)),
    }
    out.push_str(&format!("{}\n", report.valley));
    out.push_str(&format!("Problem: {}\n", report.problem));

    out.push_str(&format!("\n{}\n", format_section_heading("Canonical Matrices")));
    for m in &report.canonical {
        out.push_str(&format!("{}\n", matrix_line(m)));
    }
    out.push_str(&format!("\n{}\n", format_section_heading("Result Matrices")));
    for m in &report.derived {
        out.push_str(&format!("{}\n", matrix_line(m)));
    }
    out.push_str(&format!("\n{}\n", format_section_heading("Pipeline")));
    for (n, stage) in report.stages.iter().enumerate() {
        out.push_str(&format!("  Stage {}: {}\n", n + 1, stage));
    }
    out.trim_end().to_string()
}

pub fn format_info_json(report: &InfoReport) -> Result<String, ApiError> {
    to_pretty_json(report)
}
