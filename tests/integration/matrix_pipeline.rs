//! Matrix-level invariants over the canonical inputs.

use super::test_utils::VALLEY;
use chirality::matrices::{matrix_a, matrix_b, matrix_j};
use chirality::pipeline::{compute_matrix_c, compute_matrix_f, synthesize_matrix_d, Collaborators};
use chirality::resolver::EchoResolver;
use chirality::types::Matrix;
use chirality::validate::validate_matrix;

#[tokio::test]
async fn test_matrix_c_cells_sit_at_their_coordinates() {
    let (a, b) = (matrix_a().unwrap(), matrix_b().unwrap());
    let c = compute_matrix_c(&a, &b, &EchoResolver::new(), VALLEY, &Collaborators::none())
        .await
        .unwrap();

    assert_eq!(c.shape(), (a.rows(), b.cols()));
    assert_eq!(c.row_labels(), a.row_labels());
    assert_eq!(c.col_labels(), b.col_labels());
    for (r, row) in c.cells().iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            assert_eq!((cell.row, cell.col), (r, col));
            assert_eq!(
                cell.provenance_str("coordinates").unwrap(),
                format!("({}, {})", a.row_labels()[r], b.col_labels()[col])
            );
        }
    }
    assert!(validate_matrix(&c).is_empty());
}

async fn run_chain(resolver: &EchoResolver) -> Matrix {
    let (a, b, j) = (matrix_a().unwrap(), matrix_b().unwrap(), matrix_j().unwrap());
    let none = Collaborators::none();
    let c = compute_matrix_c(&a, &b, resolver, VALLEY, &none).await.unwrap();
    let f = compute_matrix_f(&j, &c, resolver, VALLEY, &none).await.unwrap();
    synthesize_matrix_d(&a, &f, "generating reliable knowledge", resolver, VALLEY, &none)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_full_chain_is_deterministic_with_echo() {
    let echo = EchoResolver::new();
    let first = run_chain(&echo).await;
    let second = run_chain(&echo).await;

    assert_eq!(first, second);
    assert_eq!(first.name(), "D");
    assert_eq!(first.shape(), (3, 4));
    assert!(validate_matrix(&first).is_empty());
}
