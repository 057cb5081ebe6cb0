//! CLI route: single route table and run context. Dispatches to the pipeline and presentation.

use crate::cli::help::command_name;
use crate::cli::parse::{Commands, RunArgs, TargetMatrix};
use crate::cli::presentation::{
    format_cell_json, format_cell_text, format_info_json, format_info_text, format_matrix_json,
    format_matrix_text, CellReport, InfoReport, MatrixReport, MatrixSummary,
};
use crate::config::{ChiralityConfig, ConfigLoader, ResolverConfig};
use crate::error::{ApiError, PreconditionError};
use crate::export::SledWorkingMemoryExporter;
use crate::matrices::{
    matrix_a, matrix_b, matrix_j, validate_canonical_matrices, STATION_OBJECTIVES,
    STATION_REQUIREMENTS,
};
use crate::pipeline::{
    compute_cell_c, compute_cell_f, compute_matrix_c, compute_matrix_f, synthesize_cell_d,
    synthesize_matrix_d, Collaborators,
};
use crate::resolver::{CellResolver, EchoResolver, SemanticResolver};
use crate::trace::JsonlTracer;
use crate::types::{Cell, Matrix};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Runtime context for CLI execution: workspace root and the loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: ChiralityConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Self::from_config(workspace_root, config)
    }

    /// Create run context from an already-loaded configuration.
    pub fn from_config(workspace_root: PathBuf, config: ChiralityConfig) -> Result<Self, ApiError> {
        config.ensure_valid()?;
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &ChiralityConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        let result = self.execute_inner(command);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!(command = %name, elapsed_ms, "Command completed"),
            Err(e) => warn!(command = %name, elapsed_ms, error = %e, "Command failed"),
        }
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::ComputeCell { matrix, i, j, run } => {
                let report = self.compute_cell(*matrix, usize::from(*i), usize::from(*j), run)?;
                match run.format.as_str() {
                    "json" => format_cell_json(&report),
                    _ => Ok(format_cell_text(&report)),
                }
            }
            Commands::ComputeMatrix { matrix, run } => {
                let report = self.compute_matrix(*matrix, run)?;
                match run.format.as_str() {
                    "json" => format_matrix_json(&report),
                    _ => Ok(format_matrix_text(&report)),
                }
            }
            Commands::Info { format } => {
                let report = self.info_report()?;
                match format.as_str() {
                    "json" => format_info_json(&report),
                    _ => Ok(format_info_text(&report)),
                }
            }
        }
    }

    /// Compute one cell of the target matrix. F first computes all of C;
    /// D computes C and F.
    pub fn compute_cell(
        &self,
        target: TargetMatrix,
        i: usize,
        j: usize,
        run: &RunArgs,
    ) -> Result<CellReport, ApiError> {
        let session = self.open_session(run)?;
        let inputs = CanonicalInputs::load()?;
        let output = session.block_on(compute_target_cell(target, i, j, &inputs, &session))?;
        let resolver = session.resolver.name().to_string();
        let (trace_path, exported) = session.finish();
        Ok(CellReport {
            matrix: target.as_str().to_string(),
            station: output.station.to_string(),
            row_label: output.row_label,
            col_label: output.col_label,
            resolver,
            cell: output.cell,
            trace_path,
            exported,
        })
    }

    /// Compute every cell of the target matrix.
    pub fn compute_matrix(&self, target: TargetMatrix, run: &RunArgs) -> Result<MatrixReport, ApiError> {
        let session = self.open_session(run)?;
        let inputs = CanonicalInputs::load()?;
        let matrix = session.block_on(compute_target_matrix(target, &inputs, &session))?;
        let resolver = session.resolver.name().to_string();
        let (trace_path, exported) = session.finish();
        Ok(MatrixReport {
            resolver,
            matrix,
            trace_path,
            exported,
        })
    }

    pub fn info_report(&self) -> Result<InfoReport, ApiError> {
        let inputs = CanonicalInputs::load()?;
        let summary = |m: &Matrix, source: &str| MatrixSummary {
            name: m.name().to_string(),
            station: m.station().to_string(),
            rows: m.rows(),
            cols: m.cols(),
            source: source.to_string(),
        };
        let derived = |name: &str, station: &str, source: &str, (rows, cols): (usize, usize)| {
            MatrixSummary {
                name: name.to_string(),
                station: station.to_string(),
                rows,
                cols,
                source: source.to_string(),
            }
        };

        Ok(InfoReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            resolver: self.config.resolver.kind.as_str().to_string(),
            model: self.config.resolver.model_name(),
            valley: self.config.valley.summary(),
            problem: self.config.valley.problem.clone(),
            canonical: vec![
                summary(&inputs.a, "canonical"),
                summary(&inputs.b, "canonical"),
                summary(&inputs.j, "canonical"),
            ],
            derived: vec![
                derived("C", STATION_REQUIREMENTS, "A * B", (inputs.a.rows(), inputs.b.cols())),
                derived("F", STATION_OBJECTIVES, "J ⊙ C", inputs.j.shape()),
                derived("D", STATION_OBJECTIVES, "A + F", inputs.a.shape()),
            ],
            stages: vec![
                "Combinatorial (mechanical products)".to_string(),
                "Semantic (pair resolution)".to_string(),
                "Lensing (ontological interpretation)".to_string(),
            ],
        })
    }

    /// Resolver settings from config with command-line overrides applied.
    fn effective_resolver_config(&self, run: &RunArgs) -> ResolverConfig {
        let mut resolver = self.config.resolver.clone();
        if let Some(kind) = run.resolver {
            resolver.kind = kind;
        }
        if let Some(model) = &run.model {
            resolver.model = Some(model.clone());
        }
        if let Some(api_key) = &run.api_key {
            resolver.api_key = Some(api_key.clone());
        }
        if let Some(base_url) = &run.base_url {
            resolver.base_url = Some(base_url.clone());
        }
        resolver
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    fn build_resolver(&self, config: &ResolverConfig) -> Result<Box<dyn SemanticResolver>, ApiError> {
        match config.to_model_provider()? {
            None => Ok(Box::new(EchoResolver::new())),
            Some(provider) => {
                let settings = config.settings(&self.workspace_root)?;
                Ok(Box::new(CellResolver::from_provider(&provider, settings)?))
            }
        }
    }

    fn open_session(&self, run: &RunArgs) -> Result<Session, ApiError> {
        let resolver_config = self.effective_resolver_config(run);
        resolver_config.validate().map_err(ApiError::ConfigError)?;
        let resolver = self.build_resolver(&resolver_config)?;

        let tracer = if run.trace || self.config.tracing.enabled {
            Some(JsonlTracer::create(&self.resolve_path(&self.config.tracing.dir))?)
        } else {
            None
        };
        let exporter = if run.export || self.config.export.enabled {
            Some(SledWorkingMemoryExporter::open(
                &self.resolve_path(&self.config.export.path),
            )?)
        } else {
            None
        };

        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| ApiError::Runtime(format!("Failed to create runtime: {}", e)))?;

        info!(
            resolver = resolver.name(),
            traced = tracer.is_some(),
            exported = exporter.is_some(),
            "Opened pipeline session"
        );

        Ok(Session {
            resolver,
            tracer,
            exporter,
            valley: self.config.valley.summary(),
            problem: run
                .problem
                .clone()
                .unwrap_or_else(|| self.config.valley.problem.clone()),
            runtime,
        })
    }
}

/// One pipeline run: resolver, optional collaborators and the runtime
/// that drives them.
struct Session {
    resolver: Box<dyn SemanticResolver>,
    tracer: Option<JsonlTracer>,
    exporter: Option<SledWorkingMemoryExporter>,
    valley: String,
    problem: String,
    runtime: tokio::runtime::Runtime,
}

impl Session {
    fn collaborators(&self) -> Collaborators<'_> {
        let mut collaborators = Collaborators::none();
        if let Some(tracer) = &self.tracer {
            collaborators = collaborators.with_trace(tracer);
        }
        if let Some(exporter) = &self.exporter {
            collaborators = collaborators.with_export(exporter);
        }
        collaborators
    }

    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Close the tracer and flush the exporter. Failures are logged only.
    fn finish(self) -> (Option<PathBuf>, bool) {
        let trace_path = self.tracer.map(|tracer| {
            if let Err(e) = tracer.close() {
                warn!(path = %tracer.path().display(), error = %e, "Failed to close trace file");
            }
            tracer.path().to_path_buf()
        });
        let exported = match self.exporter {
            Some(exporter) => {
                if let Err(e) = exporter.flush() {
                    warn!(error = %e, "Failed to flush working memory");
                }
                true
            }
            None => false,
        };
        (trace_path, exported)
    }
}

struct CanonicalInputs {
    a: Matrix,
    b: Matrix,
    j: Matrix,
}

impl CanonicalInputs {
    fn load() -> Result<Self, PreconditionError> {
        validate_canonical_matrices()?;
        Ok(Self {
            a: matrix_a()?,
            b: matrix_b()?,
            j: matrix_j()?,
        })
    }
}

struct CellOutput {
    cell: Cell,
    station: &'static str,
    row_label: String,
    col_label: String,
}

impl CellOutput {
    fn new(cell: Cell, station: &'static str, rows: &Matrix, cols: &Matrix) -> Self {
        let row_label = rows.row_labels().get(cell.row).cloned().unwrap_or_default();
        let col_label = cols.col_labels().get(cell.col).cloned().unwrap_or_default();
        Self {
            cell,
            station,
            row_label,
            col_label,
        }
    }
}

async fn compute_target_cell(
    target: TargetMatrix,
    i: usize,
    j: usize,
    inputs: &CanonicalInputs,
    session: &Session,
) -> Result<CellOutput, PreconditionError> {
    let resolver = session.resolver.as_ref();
    let valley = session.valley.as_str();
    let collaborators = session.collaborators();
    let CanonicalInputs { a, b, j: jm } = inputs;

    match target {
        TargetMatrix::C => {
            let cell = compute_cell_c(i, j, a, b, resolver, valley, &collaborators).await?;
            Ok(CellOutput::new(cell, STATION_REQUIREMENTS, a, b))
        }
        TargetMatrix::F => {
            jm.check_coordinate(i, j)?;
            let c = compute_matrix_c(a, b, resolver, valley, &collaborators).await?;
            let cell = compute_cell_f(i, j, jm, &c, resolver, valley, &collaborators).await?;
            Ok(CellOutput::new(cell, STATION_OBJECTIVES, jm, jm))
        }
        TargetMatrix::D => {
            a.check_coordinate(i, j)?;
            let c = compute_matrix_c(a, b, resolver, valley, &collaborators).await?;
            let f = compute_matrix_f(jm, &c, resolver, valley, &collaborators).await?;
            let cell = synthesize_cell_d(
                i,
                j,
                a,
                &f,
                &session.problem,
                resolver,
                valley,
                &collaborators,
            )
            .await?;
            Ok(CellOutput::new(cell, STATION_OBJECTIVES, a, a))
        }
    }
}

async fn compute_target_matrix(
    target: TargetMatrix,
    inputs: &CanonicalInputs,
    session: &Session,
) -> Result<Matrix, PreconditionError> {
    let resolver = session.resolver.as_ref();
    let valley = session.valley.as_str();
    let collaborators = session.collaborators();
    let CanonicalInputs { a, b, j: jm } = inputs;

    let c = compute_matrix_c(a, b, resolver, valley, &collaborators).await?;
    if target == TargetMatrix::C {
        return Ok(c);
    }
    let f = compute_matrix_f(jm, &c, resolver, valley, &collaborators).await?;
    if target == TargetMatrix::F {
        return Ok(f);
    }
    synthesize_matrix_d(a, &f, &session.problem, resolver, valley, &collaborators).await
}
