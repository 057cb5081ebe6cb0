//! Integration tests for the configuration layer.

use chirality::cli::RunContext;
use chirality::config::{ConfigLoader, ResolverKind};
use chirality::error::ApiError;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_file_config_drives_resolver_settings() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("prompt.txt"), "You are a terse resolver.").unwrap();
    let config_file = temp.path().join("chirality.toml");
    std::fs::write(
        &config_file,
        r#"
[resolver]
kind = "ollama"
seed = 9
max_retries = 2
base_delay_ms = 50
system_prompt_path = "prompt.txt"

[resolver.temperatures]
multiply = 0.2
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert_eq!(config.resolver.kind, ResolverKind::Ollama);
    assert_eq!(config.resolver.model_name().as_deref(), Some("llama3.1"));

    let settings = config.resolver.settings(temp.path()).unwrap();
    assert_eq!(settings.seed, 9);
    assert_eq!(settings.retry.max_attempts(), 3);
    assert_eq!(settings.retry.delay_for(1), Duration::from_millis(100));
    assert_eq!(settings.temperatures.temperature_for("multiply"), 0.2);
    assert_eq!(settings.temperatures.temperature_for("interpret"), 0.5);
    assert_eq!(settings.system_prompt, "You are a terse resolver.");
}

#[test]
fn test_missing_system_prompt_file_is_config_error() {
    let temp = TempDir::new().unwrap();
    let config_file = temp.path().join("chirality.toml");
    std::fs::write(&config_file, "[resolver]\nsystem_prompt_path = \"absent.txt\"\n").unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(matches!(
        config.resolver.settings(temp.path()),
        Err(ApiError::ConfigError(_))
    ));
}

#[test]
fn test_run_context_rejects_invalid_config() {
    let temp = TempDir::new().unwrap();
    let config_file = temp.path().join("bad.toml");
    std::fs::write(&config_file, "[resolver]\nmax_tokens = 0\n").unwrap();

    let result = RunContext::new(temp.path().to_path_buf(), Some(config_file));
    assert!(matches!(result, Err(ApiError::ConfigError(_))));
}

#[test]
fn test_run_context_from_explicit_file() {
    let temp = TempDir::new().unwrap();
    let config_file = temp.path().join("custom.toml");
    std::fs::write(
        &config_file,
        "[valley]\nstations = [\"Problem\", \"Requirements\", \"Objectives\"]\ncurrent = 0\n",
    )
    .unwrap();

    let context = RunContext::new(temp.path().to_path_buf(), Some(config_file)).unwrap();
    assert_eq!(
        context.config().valley.summary(),
        "Semantic Valley: [Problem] → Requirements → Objectives"
    );
}
