//! Single-cell result formatting.

use super::{format_section_heading, to_pretty_json};
use crate::error::ApiError;
use crate::types::{Cell, Provenance};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// Lists longer than this are shown as a count plus the first two items.
const LIST_PREVIEW_LIMIT: usize = 3;
const LIST_PREVIEW_ITEMS: usize = 2;

/// Result of `compute-cell`.
#[derive(Debug, Clone, Serialize)]
pub struct CellReport {
    pub matrix: String,
    pub station: String,
    pub row_label: String,
    pub col_label: String,
    pub resolver: String,
    pub cell: Cell,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_path: Option<PathBuf>,
    pub exported: bool,
}

/// Render one provenance value. Long lists are abbreviated.
pub fn abbreviate_value(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) if items.len() > LIST_PREVIEW_LIMIT => {
            let mut lines = vec![format!("[{} items]", items.len())];
            lines.extend(
                items
                    .iter()
                    .take(LIST_PREVIEW_ITEMS)
                    .map(|item| format!("- {}", scalar(item))),
            );
            lines.push(format!("... ({} more)", items.len() - LIST_PREVIEW_ITEMS));
            lines
        }
        other => vec![other.to_string()],
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn format_provenance(provenance: &Provenance, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let nested = " ".repeat(indent + 2);
    let mut out = String::new();
    for (key, value) in provenance {
        let mut lines = abbreviate_value(value).into_iter();
        let head = lines.next().unwrap_or_default();
        out.push_str(&format!("{}{}: {}\n", pad, key, head));
        for line in lines {
            out.push_str(&format!("{}{}\n", nested, line));
        }
    }
    out
}

pub fn format_cell_text(report: &CellReport) -> String {
    let cell = &report.cell;
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        format_section_heading(&format!(
            "{}[{},{}] ({})",
            report.matrix, cell.row, cell.col, report.station
        ))
    ));
    out.push_str(&format!("  Resolver: {}\n\n", report.resolver));

    out.push_str(&format!("{}\n", "Result:".green().bold()));
    out.push_str(&format!(
        "  Coordinates: ({}, {})\n",
        report.row_label, report.col_label
    ));
    if cell.value.starts_with("ERROR:") {
        out.push_str(&format!("  Value: {}\n", cell.value.red()));
    } else {
        out.push_str(&format!("  Value: {}\n", cell.value));
    }

    out.push_str(&format!("\n{}\n", "Provenance:".cyan().bold()));
    out.push_str(&format_provenance(&cell.provenance, 2));

    if let Some(path) = &report.trace_path {
        out.push_str(&format!("\nTrace: {}\n", path.display()));
    }
    if report.exported {
        out.push_str("Exported to working memory\n");
    }
    out.trim_end().to_string()
}

pub fn format_cell_json(report: &CellReport) -> Result<String, ApiError> {
    to_pretty_json(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report() -> CellReport {
        let mut provenance = Provenance::new();
        provenance.insert(
            "stage_1_products".to_string(),
            json!(["a * b", "c * d", "e * f", "g * h"]),
        );
        provenance.insert("operation".to_string(), json!("compute_C"));
        provenance.insert("traced".to_string(), json!(false));
        CellReport {
            matrix: "C".to_string(),
            station: "Requirements".to_string(),
            row_label: "Normative".to_string(),
            col_label: "Determinacy".to_string(),
            resolver: "echo".to_string(),
            cell: Cell::new(0, 0, "resolved", provenance),
            trace_path: None,
            exported: false,
        }
    }

    #[test]
    fn test_abbreviate_long_list() {
        let lines = abbreviate_value(&json!(["w", "x", "y", "z"]));
        assert_eq!(lines, vec!["[4 items]", "- w", "- x", "... (2 more)"]);
    }

    #[test]
    fn test_short_list_and_scalars_unabbreviated() {
        assert_eq!(abbreviate_value(&json!(["x", "y"])), vec![r#"["x","y"]"#]);
        assert_eq!(abbreviate_value(&json!("plain")), vec!["plain"]);
        assert_eq!(abbreviate_value(&json!(true)), vec!["true"]);
    }

    #[test]
    fn test_format_cell_text() {
        let text = format_cell_text(&report());
        assert!(text.contains("Coordinates: (Normative, Determinacy)"));
        assert!(text.contains("Value: resolved"));
        assert!(text.contains("  stage_1_products: [4 items]\n    - a * b\n    - c * d\n    ... (2 more)"));
        assert!(text.contains("  operation: compute_C"));
        assert!(!text.contains("Trace:"));
    }

    #[test]
    fn test_format_cell_json() {
        let out = format_cell_json(&report()).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["matrix"], "C");
        assert_eq!(parsed["cell"]["value"], "resolved");
        assert!(parsed.get("trace_path").is_none());
    }
}
