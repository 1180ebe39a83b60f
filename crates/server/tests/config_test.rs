//! # Configuration Tests
//!
//! Environment variables are process-global, so every test that touches them
//! runs under `#[serial]`.

use docsheet::json_text::SliceStrategy;
use docsheet_server::config::{get_config, ConfigError, StorageBackend};
use docsheet_sheets::SpreadsheetFormat;
use serial_test::serial;
use std::env;
use std::path::Path;
use tempfile::TempDir;

const VARS: &[&str] = &[
    "PORT",
    "USE_CASE",
    "TEST_DOCSHEET_API_KEY",
    "DOCSHEET_STORAGE__LOCAL_ROOT",
    "DOCSHEET_EXTRACTION__TEMPERATURE",
];

fn clear_env_vars() {
    for var in VARS {
        env::remove_var(var);
    }
}

const MINIMAL_CONFIG: &str = r#"
storage:
  backend: local
providers:
  standard:
    provider: azure
    api_url: https://example.openai.azure.com
    api_key: ${TEST_DOCSHEET_API_KEY}
    model_name: gpt-35-turbo
"#;

fn write_config(dir: &Path, content: &str) -> String {
    let path = dir.join("config.yml");
    std::fs::write(&path, content).expect("write config");
    path.to_string_lossy().to_string()
}

#[test]
#[serial]
fn test_defaults_fill_unspecified_sections() {
    clear_env_vars();
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), MINIMAL_CONFIG);

    let config = get_config(Some(&path)).expect("Configuration should load successfully");

    assert_eq!(config.port, 9090);
    assert_eq!(config.use_case, "documents");
    assert_eq!(config.storage.backend, StorageBackend::Local);
    assert_eq!(config.storage.local_root, "data");
    assert!((config.extraction.temperature - 0.1).abs() < f32::EPSILON);
    assert_eq!(config.extraction.slicing, SliceStrategy::FirstLast);
    assert_eq!(config.extraction.output_format, SpreadsheetFormat::Xlsx);
    assert!(config.prompts.extraction.contains("{schema}"));
    assert!(config.prompts.extraction.contains("{documents}"));
    assert!(config.providers["standard"].api_key.is_none());
}

#[test]
#[serial]
fn test_env_substitution_and_overrides() {
    clear_env_vars();
    env::set_var("TEST_DOCSHEET_API_KEY", "secret-key");
    env::set_var("PORT", "9999");
    env::set_var("DOCSHEET_STORAGE__LOCAL_ROOT", "/srv/docs");
    env::set_var("DOCSHEET_EXTRACTION__TEMPERATURE", "0.5");
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), MINIMAL_CONFIG);

    let config = get_config(Some(&path)).expect("Configuration should load successfully");

    assert_eq!(config.providers["standard"].api_key.as_deref(), Some("secret-key"));
    assert_eq!(config.port, 9999);
    assert_eq!(config.storage.local_root, "/srv/docs");
    assert!((config.extraction.temperature - 0.5).abs() < f32::EPSILON);
    clear_env_vars();
}

#[test]
#[serial]
fn test_prompt_file_overrides_defaults() {
    clear_env_vars();
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), MINIMAL_CONFIG);
    std::fs::write(
        dir.path().join("prompt.yml"),
        "prompts:\n  not_found: \"Use 'Not found' for anything missing.\"\n",
    )
    .unwrap();

    let config = get_config(Some(&path)).unwrap();

    assert_eq!(config.prompts.not_found, "Use 'Not found' for anything missing.");
    assert!(config.prompts.schema_generation.contains("JSON object"));
    let settings = config.pipeline_settings();
    assert_eq!(settings.not_found_instruction, config.prompts.not_found);
}

#[test]
#[serial]
fn test_missing_main_config_is_reported() {
    clear_env_vars();
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.yml").to_string_lossy().to_string();

    let err = get_config(Some(&missing)).unwrap_err();

    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
#[serial]
fn test_invalid_enum_value_is_a_config_error() {
    clear_env_vars();
    let dir = TempDir::new().unwrap();
    let content = format!("{MINIMAL_CONFIG}extraction:\n  slicing: greedy\n");
    let path = write_config(dir.path(), &content);

    let err = get_config(Some(&path)).unwrap_err();

    assert!(matches!(err, ConfigError::General(_)));
}
