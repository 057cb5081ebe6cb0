//! Configuration loader: assembles the layered sources into a
//! [`ChiralityConfig`].

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::ChiralityConfig;
use crate::error::ApiError;
use config::{Config, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, workspace
    /// files, `CHIRALITY__*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<ChiralityConfig, ApiError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: ChiralityConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            resolver = config.resolver.kind.as_str(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load configuration from a single explicit file over the defaults.
    pub fn load_from_file(path: &Path) -> Result<ChiralityConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config = merge_policy::builder_with_defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Defaults only, ignoring every file and the environment.
    pub fn defaults() -> Result<ChiralityConfig, ApiError> {
        let config: Config = merge_policy::builder_with_defaults()?.build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
