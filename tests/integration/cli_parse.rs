//! Command-line surface: parsing and end-to-end command execution.

use chirality::cli::{Cli, Commands, RunContext, TargetMatrix};
use chirality::config::{ChiralityConfig, ResolverKind};
use clap::Parser;
use tempfile::TempDir;

#[test]
fn test_parse_compute_cell() {
    let cli = Cli::try_parse_from([
        "chirality",
        "compute-cell",
        "F",
        "--i",
        "2",
        "--j",
        "3",
        "--resolver",
        "openai",
        "--api-key",
        "sk-test",
        "--trace",
        "--problem",
        "creating value",
    ])
    .unwrap();

    match cli.command {
        Commands::ComputeCell { matrix, i, j, run } => {
            assert_eq!(matrix, TargetMatrix::F);
            assert_eq!((i, j), (2, 3));
            assert_eq!(run.resolver, Some(ResolverKind::OpenAI));
            assert_eq!(run.api_key.as_deref(), Some("sk-test"));
            assert!(run.trace);
            assert!(!run.export);
            assert_eq!(run.problem.as_deref(), Some("creating value"));
            assert_eq!(run.format, "text");
        }
        _ => panic!("expected compute-cell"),
    }
}

#[test]
fn test_parse_rejects_out_of_range_coordinates() {
    assert!(Cli::try_parse_from(["chirality", "compute-cell", "C", "--i", "3", "--j", "0"]).is_err());
    assert!(Cli::try_parse_from(["chirality", "compute-cell", "C", "--i", "0", "--j", "4"]).is_err());
    assert!(Cli::try_parse_from(["chirality", "compute-cell", "X", "--i", "0", "--j", "0"]).is_err());
}

#[test]
fn test_parse_lowercase_matrix_alias() {
    let cli = Cli::try_parse_from(["chirality", "compute-matrix", "d", "--format", "json"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::ComputeMatrix {
            matrix: TargetMatrix::D,
            ..
        }
    ));
}

#[test]
fn test_execute_compute_cell_json() {
    let temp = TempDir::new().unwrap();
    let cli = Cli::try_parse_from([
        "chirality",
        "compute-cell",
        "C",
        "--i",
        "0",
        "--j",
        "0",
        "--resolver",
        "echo",
        "--format",
        "json",
    ])
    .unwrap();

    let context =
        RunContext::from_config(temp.path().to_path_buf(), ChiralityConfig::default()).unwrap();
    let out = context.execute(&cli.command).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(parsed["matrix"], "C");
    assert_eq!(parsed["resolver"], "echo");
    assert_eq!(parsed["row_label"], "Normative");
    assert_eq!(parsed["col_label"], "Determinacy");
    assert_eq!(parsed["cell"]["provenance"]["stage_1_products"][3], "Feedback * Best Practices");
}

#[test]
fn test_execute_compute_matrix_text() {
    let temp = TempDir::new().unwrap();
    let cli = Cli::try_parse_from(["chirality", "compute-matrix", "C", "--resolver", "echo"]).unwrap();

    let context =
        RunContext::from_config(temp.path().to_path_buf(), ChiralityConfig::default()).unwrap();
    let out = context.execute(&cli.command).unwrap();
    assert!(out.contains("Station: Requirements"));
    assert!(out.contains("Shape: 3×4"));
    assert!(out.contains("Evaluative"));
}
