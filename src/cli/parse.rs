//! CLI parse: clap types for chirality. No behavior; definitions only.

use crate::config::{ResolverKind, OPENAI_API_KEY_ENV};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Chirality - semantic calculator over the canonical framework matrices
#[derive(Parser)]
#[command(name = "chirality")]
#[command(about = "Compute semantic matrix cells through a staged resolution pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute a single cell of C, F or D
    ComputeCell {
        /// Target matrix
        #[arg(value_enum)]
        matrix: TargetMatrix,
        /// Row index
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=2))]
        i: u8,
        /// Column index
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
        j: u8,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Compute every cell of C, F or D
    ComputeMatrix {
        /// Target matrix
        #[arg(value_enum)]
        matrix: TargetMatrix,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Show the framework summary and effective configuration
    Info {
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
}

/// Derived matrices the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetMatrix {
    /// C = A · B
    #[value(name = "C", alias = "c")]
    C,
    /// F = J ⊙ C
    #[value(name = "F", alias = "f")]
    F,
    /// D = A + F
    #[value(name = "D", alias = "d")]
    D,
}

impl TargetMatrix {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetMatrix::C => "C",
            TargetMatrix::F => "F",
            TargetMatrix::D => "D",
        }
    }
}

/// Options shared by the compute commands. Unset values fall back to the
/// loaded configuration.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Semantic resolver backend
    #[arg(long, value_enum)]
    pub resolver: Option<ResolverKind>,

    /// API key for the OpenAI resolver
    #[arg(long, env = OPENAI_API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model id (defaults per resolver)
    #[arg(long)]
    pub model: Option<String>,

    /// Chat-completions base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Write a JSONL trace of every pipeline stage
    #[arg(long)]
    pub trace: bool,

    /// Persist computed cells to the working-memory store
    #[arg(long)]
    pub export: bool,

    /// Problem statement used by the D synthesis
    #[arg(long)]
    pub problem: Option<String>,

    /// Output format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
}
