//! Chirality: a semantic calculator
//!
//! Computes the cells of the derived framework matrices (C = A · B,
//! F = J ⊙ C, D = A + F) through a staged pipeline: mechanical products,
//! semantic pair resolution and an ontological lens, each resolved by a
//! pluggable [`resolver::SemanticResolver`].

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod logging;
pub mod matrices;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod resolver;
pub mod trace;
pub mod types;
pub mod validate;
