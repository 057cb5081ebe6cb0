//! Merge rules: defaults first, then each source overrides the previous one.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("resolver.kind", "echo")?
        .set_default("resolver.seed", 42)?
        .set_default("resolver.max_tokens", 200)?
        .set_default("resolver.max_retries", 3)?
        .set_default("resolver.base_delay_ms", 400)?
        .set_default("valley.problem", crate::config::DEFAULT_PROBLEM)?
        .set_default("tracing.dir", "traces")?
        .set_default("export.path", ".chirality/working_memory")
}
