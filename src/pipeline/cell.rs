//! Single-cell computations for C, F and D.

use crate::context::{terms, OperationType, SemanticContext};
use crate::error::PreconditionError;
use crate::matrices::{STATION_OBJECTIVES, STATION_REQUIREMENTS};
use crate::pipeline::{stage, Collaborators};
use crate::resolver::{semantic_pair, split_pair, ResolutionOutcome, SemanticResolver};
use crate::trace::Extras;
use crate::types::{Cell, Matrix, Provenance};
use crate::validate::ensure_dims;
use serde_json::{json, Value};
use tracing::{debug, info};

fn extras(station: &str, valley_summary: &str, key: &str, value: Value) -> Extras {
    let mut extras = Extras::new();
    extras.insert("station".to_string(), Value::from(station));
    extras.insert("valley_summary".to_string(), Value::from(valley_summary));
    extras.insert(key.to_string(), value);
    extras
}

fn check_output_coordinate(
    matrix: &str,
    i: usize,
    j: usize,
    shape: (usize, usize),
) -> Result<(), PreconditionError> {
    if i >= shape.0 || j >= shape.1 {
        return Err(PreconditionError::CoordinateOutOfRange {
            matrix: matrix.to_string(),
            row: i,
            col: j,
            shape,
        });
    }
    Ok(())
}

/// Final cell from the lensed text. A blank value means the resolver broke
/// its contract, so no cell is produced.
fn lensed_cell(
    matrix: &str,
    i: usize,
    j: usize,
    lensed: String,
    provenance: Provenance,
) -> Result<Cell, PreconditionError> {
    if lensed.trim().is_empty() {
        return Err(PreconditionError::EmptyCellValue {
            matrix: matrix.to_string(),
            row: i,
            col: j,
        });
    }
    Ok(Cell::new(i, j, lensed, provenance))
}

/// The fixed D-matrix sentence for one cell.
pub fn synthesis_statement(a_value: &str, problem: &str, f_value: &str) -> String {
    format!(
        "{} applied to frame the problem of {} and {} to resolve the problem",
        a_value, problem, f_value
    )
}

/// C[i,j] = A[i,:] · B[:,j], resolved pair by pair and lensed once.
pub async fn compute_cell_c(
    i: usize,
    j: usize,
    a: &Matrix,
    b: &Matrix,
    resolver: &dyn SemanticResolver,
    valley_summary: &str,
    collaborators: &Collaborators<'_>,
) -> Result<Cell, PreconditionError> {
    ensure_dims(a, b, "*")?;
    check_output_coordinate("C", i, j, (a.rows(), b.cols()))?;

    let row_label = a.row_labels()[i].as_str();
    let col_label = b.col_labels()[j].as_str();

    // Stage 1: k-products, built locally.
    let mut products = Vec::with_capacity(a.cols());
    for k in 0..a.cols() {
        products.push(semantic_pair(&a.cell(i, k)?.value, &b.cell(k, j)?.value));
    }

    let base = SemanticContext::new(
        STATION_REQUIREMENTS,
        valley_summary,
        row_label,
        col_label,
        OperationType::Combinatorial,
        terms([("products", json!(products))]),
    )?
    .for_cell("C", i, j);

    if collaborators.is_traced() {
        let outcome = ResolutionOutcome::new(
            products.join(", "),
            (0..products.len()).map(|k| format!("k={}", k)).collect(),
            Vec::new(),
        );
        collaborators.emit_stage(
            stage::COMBINATORIAL,
            &base,
            &outcome,
            &extras(STATION_REQUIREMENTS, valley_summary, "products", json!(products)),
        );
    }

    // Stage 2: resolve each product in index order.
    let mut resolved = Vec::with_capacity(products.len());
    for (k, pair) in products.iter().enumerate() {
        let context = base.rebased(OperationType::Multiply, terms([("pair", pair.as_str())]))?;
        let concept = resolver.resolve_semantic_pair(pair, &context).await;
        debug!(matrix = "C", i, j, k, pair = %pair, concept = %concept, "Resolved k-product");

        if collaborators.is_traced() {
            let (left, right) = split_pair(pair);
            let outcome = ResolutionOutcome::new(
                concept.clone(),
                vec![left.to_string(), right.to_string()],
                Vec::new(),
            );
            collaborators.emit_stage(
                &stage::product(k),
                &context,
                &outcome,
                &extras(STATION_REQUIREMENTS, valley_summary, "products", json!([pair])),
            );
        }
        resolved.push(concept);
    }

    // Stage 3: lens the joined concepts once.
    let combined = resolved.join(", ");
    let lens_context = base.rebased(
        OperationType::Interpret,
        terms([("content", combined.as_str())]),
    )?;
    let lensed = resolver.apply_ontological_lens(&combined, &lens_context).await;

    if collaborators.is_traced() {
        let outcome = ResolutionOutcome::new(lensed.clone(), resolved.clone(), Vec::new());
        collaborators.emit_stage(
            stage::FINAL,
            &lens_context,
            &outcome,
            &extras(
                STATION_REQUIREMENTS,
                valley_summary,
                "stage_plan",
                json!(["combinatorial", "semantic", "lensing"]),
            ),
        );
    }

    let mut provenance = Provenance::new();
    provenance.insert("stage_1_products".into(), json!(products));
    provenance.insert("stage_2_resolved".into(), json!(resolved));
    provenance.insert("stage_3_lensed".into(), json!(lensed));
    provenance.insert("operation".into(), json!("compute_C"));
    provenance.insert("coordinates".into(), json!(lens_context.coordinates()));
    provenance.insert("traced".into(), json!(collaborators.is_traced()));

    let cell = lensed_cell("C", i, j, lensed, provenance)?;
    info!(matrix = "C", i, j, "Computed cell");
    collaborators.emit_cell(&cell, &lens_context);
    Ok(cell)
}

/// F[i,j] = J[i,j] ⊙ C[i,j]: one pair resolution, one lens.
pub async fn compute_cell_f(
    i: usize,
    j: usize,
    jm: &Matrix,
    c: &Matrix,
    resolver: &dyn SemanticResolver,
    valley_summary: &str,
    collaborators: &Collaborators<'_>,
) -> Result<Cell, PreconditionError> {
    ensure_dims(jm, c, "⊙")?;
    check_output_coordinate("F", i, j, jm.shape())?;

    let pair = semantic_pair(&jm.cell(i, j)?.value, &c.cell(i, j)?.value);
    let context = SemanticContext::new(
        STATION_OBJECTIVES,
        valley_summary,
        jm.row_labels()[i].as_str(),
        jm.col_labels()[j].as_str(),
        OperationType::Multiply,
        terms([("pair", pair.as_str())]),
    )?
    .for_cell("F", i, j);

    // Stage 1: element-wise resolution.
    let concept = resolver.resolve_semantic_pair(&pair, &context).await;
    debug!(matrix = "F", i, j, pair = %pair, concept = %concept, "Resolved element-wise pair");

    if collaborators.is_traced() {
        let (left, right) = split_pair(&pair);
        let outcome = ResolutionOutcome::new(
            concept.clone(),
            vec![left.to_string(), right.to_string()],
            Vec::new(),
        );
        collaborators.emit_stage(
            stage::ELEMENT_WISE,
            &context,
            &outcome,
            &extras(STATION_OBJECTIVES, valley_summary, "products", json!([pair])),
        );
    }

    // Stage 2: lens.
    let lens_context =
        context.rebased(OperationType::Interpret, terms([("content", concept.as_str())]))?;
    let lensed = resolver.apply_ontological_lens(&concept, &lens_context).await;

    if collaborators.is_traced() {
        let outcome = ResolutionOutcome::new(lensed.clone(), vec![concept.clone()], Vec::new());
        collaborators.emit_stage(
            stage::FINAL,
            &lens_context,
            &outcome,
            &extras(
                STATION_OBJECTIVES,
                valley_summary,
                "stage_plan",
                json!(["element-wise", "lensing"]),
            ),
        );
    }

    let mut provenance = Provenance::new();
    provenance.insert("stage_1_element_wise".into(), json!(pair));
    provenance.insert("stage_2_resolved".into(), json!(concept));
    provenance.insert("stage_3_lensed".into(), json!(lensed));
    provenance.insert("operation".into(), json!("compute_F"));
    provenance.insert("coordinates".into(), json!(lens_context.coordinates()));
    provenance.insert("traced".into(), json!(collaborators.is_traced()));

    let cell = lensed_cell("F", i, j, lensed, provenance)?;
    info!(matrix = "F", i, j, "Computed cell");
    collaborators.emit_cell(&cell, &lens_context);
    Ok(cell)
}

/// D[i,j]: the synthesis template over A[i,j] and F[i,j], lensed once.
#[allow(clippy::too_many_arguments)]
pub async fn synthesize_cell_d(
    i: usize,
    j: usize,
    a: &Matrix,
    f: &Matrix,
    problem: &str,
    resolver: &dyn SemanticResolver,
    valley_summary: &str,
    collaborators: &Collaborators<'_>,
) -> Result<Cell, PreconditionError> {
    ensure_dims(a, f, "+")?;
    check_output_coordinate("D", i, j, a.shape())?;

    let a_value = a.cell(i, j)?.value.as_str();
    let f_value = f.cell(i, j)?.value.as_str();

    // Stage 1: fixed template, no resolver call.
    let statement = synthesis_statement(a_value, problem, f_value);
    let context = SemanticContext::new(
        STATION_OBJECTIVES,
        valley_summary,
        a.row_labels()[i].as_str(),
        a.col_labels()[j].as_str(),
        OperationType::Synthesize,
        terms([("formula", statement.as_str()), ("problem", problem)]),
    )?
    .for_cell("D", i, j);

    if collaborators.is_traced() {
        let outcome = ResolutionOutcome::new(
            statement.clone(),
            vec![a_value.to_string(), f_value.to_string(), problem.to_string()],
            Vec::new(),
        );
        collaborators.emit_stage(
            stage::SYNTHESIS,
            &context,
            &outcome,
            &extras(STATION_OBJECTIVES, valley_summary, "products", json!([statement])),
        );
    }

    // Stage 2: lens with A's labels.
    let lens_context = context.rebased(
        OperationType::Interpret,
        terms([("content", statement.as_str()), ("problem", problem)]),
    )?;
    let lensed = resolver.apply_ontological_lens(&statement, &lens_context).await;

    if collaborators.is_traced() {
        let outcome = ResolutionOutcome::new(lensed.clone(), vec![statement.clone()], Vec::new());
        collaborators.emit_stage(
            stage::FINAL,
            &lens_context,
            &outcome,
            &extras(
                STATION_OBJECTIVES,
                valley_summary,
                "stage_plan",
                json!(["synthesis", "lensing"]),
            ),
        );
    }

    let mut provenance = Provenance::new();
    provenance.insert("stage_1_synthesis".into(), json!(statement));
    provenance.insert("stage_2_lensed".into(), json!(lensed));
    provenance.insert("operation".into(), json!("synthesize_D"));
    provenance.insert("problem".into(), json!(problem));
    provenance.insert("coordinates".into(), json!(lens_context.coordinates()));
    provenance.insert("traced".into(), json!(collaborators.is_traced()));

    let cell = lensed_cell("D", i, j, lensed, provenance)?;
    info!(matrix = "D", i, j, "Computed cell");
    collaborators.emit_cell(&cell, &lens_context);
    Ok(cell)
}
