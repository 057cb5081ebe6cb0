//! Stage tracing.
//!
//! The cell pipeline reports one event per stage to an optional
//! [`TraceSink`]. [`JsonlTracer`] appends those events to a JSON Lines file,
//! one object per line, so a run can be replayed or diffed afterwards.

use crate::context::SemanticContext;
use crate::error::StorageError;
use crate::resolver::ResolutionOutcome;
use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Free-form extras attached to a stage event.
pub type Extras = Map<String, Value>;

/// Receives one event per pipeline stage.
pub trait TraceSink: Send + Sync {
    fn trace_stage(
        &self,
        stage: &str,
        context: &SemanticContext,
        outcome: &ResolutionOutcome,
        extras: &Extras,
    ) -> Result<(), StorageError>;
}

/// One line of a trace file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub ts: String,
    pub stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub j: Option<usize>,
    pub station: String,
    pub row_label: String,
    pub col_label: String,
    pub operation_type: String,
    pub terms: Map<String, Value>,
    pub outcome: ResolutionOutcome,
    #[serde(default)]
    pub extras: Extras,
}

impl TraceEvent {
    pub fn new(
        stage: &str,
        context: &SemanticContext,
        outcome: &ResolutionOutcome,
        extras: &Extras,
    ) -> Self {
        Self {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            stage: stage.to_string(),
            matrix: context.matrix.clone(),
            i: context.i,
            j: context.j,
            station: context.station_context.clone(),
            row_label: context.row_label.clone(),
            col_label: context.col_label.clone(),
            operation_type: context.operation_type.as_str().to_string(),
            terms: context.terms.clone(),
            outcome: outcome.clone(),
            extras: extras.clone(),
        }
    }
}

/// Appends trace events to `<dir>/trace-<timestamp>.jsonl`.
pub struct JsonlTracer {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl JsonlTracer {
    /// Create the trace directory if needed and open a fresh trace file.
    pub fn create(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)?;
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        Self::open(dir.join(format!("trace-{}.jsonl", stamp)))
    }

    /// Open (or append to) a specific trace file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(Some(BufWriter::new(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered events and close the file. Later events are dropped
    /// with an error.
    pub fn close(&self) -> Result<(), StorageError> {
        if let Some(mut writer) = self.writer.lock().take() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Read every event back from a trace file.
    pub fn read_events(path: &Path) -> Result<Vec<TraceEvent>, StorageError> {
        let raw = fs::read_to_string(path)?;
        raw.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(StorageError::from))
            .collect()
    }
}

impl TraceSink for JsonlTracer {
    fn trace_stage(
        &self,
        stage: &str,
        context: &SemanticContext,
        outcome: &ResolutionOutcome,
        extras: &Extras,
    ) -> Result<(), StorageError> {
        let event = TraceEvent::new(stage, context, outcome, extras);
        let line = serde_json::to_string(&event)?;

        let mut guard = self.writer.lock();
        let writer = guard.as_mut().ok_or_else(|| {
            StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                format!("trace file closed: {}", self.path.display()),
            ))
        })?;
        writeln!(writer, "{}", line)?;
        Ok(())
    }
}

impl Drop for JsonlTracer {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.lock().take() {
            let _ = writer.flush();
        }
    }
}
