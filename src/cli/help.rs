//! CLI help and command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Command name string for log fields (e.g. "compute_cell.C", "info").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::ComputeCell { matrix, .. } => format!("compute_cell.{}", matrix.as_str()),
        Commands::ComputeMatrix { matrix, .. } => format!("compute_matrix.{}", matrix.as_str()),
        Commands::Info { .. } => "info".to_string(),
    }
}
