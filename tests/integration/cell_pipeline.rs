//! End-to-end cell computations with the deterministic echo resolver.

use super::test_utils::VALLEY;
use chirality::error::PreconditionError;
use chirality::matrices::{matrix_a, matrix_b, matrix_j};
use chirality::pipeline::{
    compute_cell_c, compute_cell_f, compute_matrix_c, synthesis_statement, synthesize_cell_d,
    Collaborators,
};
use chirality::resolver::EchoResolver;
use chirality::types::Matrix;

#[tokio::test]
async fn test_c00_end_to_end_with_echo() {
    let (a, b) = (matrix_a().unwrap(), matrix_b().unwrap());
    let cell = compute_cell_c(0, 0, &a, &b, &EchoResolver::new(), VALLEY, &Collaborators::none())
        .await
        .unwrap();

    assert_eq!(
        cell.provenance_list("stage_1_products").unwrap(),
        vec![
            "Values * Necessary",
            "Actions * Contingent",
            "Benchmarks * Fundamental",
            "Feedback * Best Practices",
        ]
    );
    assert_eq!(
        cell.provenance_list("stage_2_resolved").unwrap(),
        vec![
            "Necessary Values",
            "Contingent Actions",
            "Fundamental Benchmarks",
            "Best Practices Feedback",
        ]
    );
    assert_eq!(
        cell.value,
        "By applying Normative lens through Determinacy coordinates: \
         Necessary Values, Contingent Actions, Fundamental Benchmarks, Best Practices Feedback"
    );
    assert_eq!(cell.provenance_str("stage_3_lensed"), Some(cell.value.as_str()));
    assert_eq!(cell.provenance_str("operation"), Some("compute_C"));
    assert_eq!(cell.provenance_str("coordinates"), Some("(Normative, Determinacy)"));
}

#[tokio::test]
async fn test_f_cell_combines_j_and_c() {
    let (a, b, j) = (matrix_a().unwrap(), matrix_b().unwrap(), matrix_j().unwrap());
    let none = Collaborators::none();
    let echo = EchoResolver::new();
    let c = compute_matrix_c(&a, &b, &echo, VALLEY, &none).await.unwrap();

    let cell = compute_cell_f(1, 3, &j, &c, &echo, VALLEY, &none).await.unwrap();
    let c13 = &c.cell(1, 3).unwrap().value;

    assert_eq!(cell.provenance_str("operation"), Some("compute_F"));
    assert_eq!(
        cell.provenance_str("stage_1_element_wise"),
        Some(format!("Possibility * {}", c13).as_str())
    );
    assert!(cell.value.starts_with("By applying Information lens through Consistency coordinates: "));
}

#[tokio::test]
async fn test_d_cell_uses_fixed_template() {
    let (a, j) = (matrix_a().unwrap(), matrix_j().unwrap());
    // F only needs the right shape here.
    let f = Matrix::from_values(
        "F",
        "Objectives",
        &["Normative", "Operative", "Evaluative"],
        &["Guiding", "Applying", "Judging", "Reflecting"],
        &[
            &["f00", "f01", "f02", "f03"],
            &["f10", "f11", "f12", "f13"],
            &["f20", "f21", "f22", "f23"],
        ],
    )
    .unwrap();
    assert_eq!(f.shape(), j.shape());

    let cell = synthesize_cell_d(
        0,
        1,
        &a,
        &f,
        "generating reliable knowledge",
        &EchoResolver::new(),
        VALLEY,
        &Collaborators::none(),
    )
    .await
    .unwrap();

    let statement = synthesis_statement("Actions", "generating reliable knowledge", "f01");
    assert_eq!(
        statement,
        "Actions applied to frame the problem of generating reliable knowledge and f01 to resolve the problem"
    );
    assert_eq!(cell.provenance_str("stage_1_synthesis"), Some(statement.as_str()));
    assert!(cell.value.ends_with(&statement));
}

#[tokio::test]
async fn test_c_rejects_swapped_operands() {
    let (a, b) = (matrix_a().unwrap(), matrix_b().unwrap());
    // B (4×4) · A (3×4): inner dimensions 4 and 3 disagree.
    let err = compute_cell_c(0, 0, &b, &a, &EchoResolver::new(), VALLEY, &Collaborators::none())
        .await
        .unwrap_err();
    assert!(matches!(err, PreconditionError::ShapeMismatch { .. }));
}

#[tokio::test]
async fn test_c_rejects_out_of_range_coordinate() {
    let (a, b) = (matrix_a().unwrap(), matrix_b().unwrap());
    let err = compute_cell_c(3, 0, &a, &b, &EchoResolver::new(), VALLEY, &Collaborators::none())
        .await
        .unwrap_err();
    assert!(matches!(err, PreconditionError::CoordinateOutOfRange { row: 3, .. }));
}
