//! Integration tests for the chirality semantic calculator

mod cell_pipeline;
mod cli_parse;
mod config_integration;
mod matrix_pipeline;
mod prompt_hash_properties;
mod resolver_contract;
mod test_utils;
mod trace_export;
