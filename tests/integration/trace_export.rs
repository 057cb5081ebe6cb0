//! Tracing and working-memory export through a real pipeline run.

use super::test_utils::VALLEY;
use chirality::export::{cell_id, SledWorkingMemoryExporter};
use chirality::matrices::{matrix_a, matrix_b};
use chirality::pipeline::{compute_cell_c, compute_matrix_c, Collaborators};
use chirality::resolver::EchoResolver;
use chirality::trace::JsonlTracer;
use tempfile::TempDir;

#[tokio::test]
async fn test_trace_stage_labels_for_c_cell() {
    let temp = TempDir::new().unwrap();
    let tracer = JsonlTracer::create(&temp.path().join("traces")).unwrap();
    let (a, b) = (matrix_a().unwrap(), matrix_b().unwrap());

    let collaborators = Collaborators::none().with_trace(&tracer);
    let cell = compute_cell_c(2, 1, &a, &b, &EchoResolver::new(), VALLEY, &collaborators)
        .await
        .unwrap();
    tracer.close().unwrap();

    let events = JsonlTracer::read_events(tracer.path()).unwrap();
    let stages: Vec<&str> = events.iter().map(|e| e.stage.as_str()).collect();
    assert_eq!(
        stages,
        vec![
            "combinatorial",
            "product:k=0",
            "product:k=1",
            "product:k=2",
            "product:k=3",
            "final"
        ]
    );
    let last = events.last().unwrap();
    assert_eq!(last.matrix.as_deref(), Some("C"));
    assert_eq!((last.i, last.j), (Some(2), Some(1)));
    assert_eq!(last.row_label, "Evaluative");
    assert_eq!(last.col_label, "Sufficiency");
    assert_eq!(last.outcome.text, cell.value);
    assert_eq!(cell.provenance.get("traced"), Some(&serde_json::json!(true)));
}

#[tokio::test]
async fn test_export_persists_every_c_cell() {
    let temp = TempDir::new().unwrap();
    let exporter = SledWorkingMemoryExporter::open(&temp.path().join("wm")).unwrap();
    let (a, b) = (matrix_a().unwrap(), matrix_b().unwrap());

    let collaborators = Collaborators::none().with_export(&exporter);
    let c = compute_matrix_c(&a, &b, &EchoResolver::new(), VALLEY, &collaborators)
        .await
        .unwrap();
    exporter.flush().unwrap();

    assert_eq!(exporter.cell_count(), 12);
    let matrix = exporter.load_matrix("C").unwrap().unwrap();
    assert_eq!(matrix.station, "Requirements");

    let record = exporter.load_cell(&cell_id("C", 1, 3)).unwrap().unwrap();
    assert_eq!(record.value, c.cell(1, 3).unwrap().value);
    assert_eq!(record.row_label, "Operative");
    assert_eq!(record.col_label, "Consistency");

    let stages = exporter.load_stages(&cell_id("C", 1, 3)).unwrap();
    let kinds: Vec<&str> = stages.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(kinds, vec!["stage_1_products", "stage_2_resolved", "stage_3_lensed"]);
}
