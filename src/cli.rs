//! CLI domain: parse, route, help, output, and presentation only.
//! No pipeline logic; the route table dispatches to the pipeline and formats results.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, RunArgs, TargetMatrix};
pub use presentation::{
    abbreviate_value, format_cell_json, format_cell_text, format_info_json, format_info_text,
    format_matrix_json, format_matrix_text, CellReport, InfoReport, MatrixReport, MatrixSummary,
};
pub use route::RunContext;
