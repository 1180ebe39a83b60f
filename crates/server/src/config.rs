//! # Application Configuration
//!
//! Loads the `docsheet-server` configuration from a `config.yml` file, optional
//! prompt overrides and environment variables. Layers, from lowest to highest
//! precedence:
//!
//! 1. Programmatic defaults (prompts, sampling, storage root, port).
//! 2. The main YAML file with `${VAR}` substitution.
//! 3. An optional `prompt.yml` next to it.
//! 4. Unprefixed environment variables for top-level keys (`PORT`).
//! 5. `DOCSHEET_` prefixed variables with `__` nesting
//!    (e.g. `DOCSHEET_STORAGE__LOCAL_ROOT`).

use config::{Config as ConfigBuilder, Environment, File, FileFormat, Value as ConfigValue};
use docsheet::{
    json_text::SliceStrategy,
    pipeline::PipelineSettings,
    prompts::{EXTRACTION_SYSTEM_PROMPT, NOT_FOUND_INSTRUCTION, SCHEMA_GENERATION_SYSTEM_PROMPT},
    providers::factory::ProviderConfig,
    schema::SchemaSettings,
    source::TargetGrouping,
};
use docsheet_sheets::SpreadsheetFormat;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// An error from the underlying `config` crate.
    #[error("Configuration error: {0}")]
    General(String),
    /// A required configuration file was not found.
    #[error("{0}")]
    NotFound(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// The top-level blob folder that holds the selectable document folders.
    #[serde(default = "default_use_case")]
    pub use_case: String,
    pub storage: StorageConfig,
    /// Provider configurations keyed by model tier (`standard`, `advanced`).
    pub providers: HashMap<String, ProviderConfig>,
    pub extraction: ExtractionConfig,
    pub prompts: PromptsConfig,
}

fn default_port() -> u16 {
    9090
}

fn default_use_case() -> String {
    "documents".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Local,
    Azure,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory of the `local` backend.
    pub local_root: String,
    #[serde(default)]
    pub container_url: Option<String>,
    #[serde(default)]
    pub sas_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    pub temperature: f32,
    pub slicing: SliceStrategy,
    pub grouping: TargetGrouping,
    pub output_format: SpreadsheetFormat,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromptsConfig {
    pub schema_generation: String,
    /// Extraction template with `{schema}` and `{documents}` placeholders.
    pub extraction: String,
    pub not_found: String,
}

impl AppConfig {
    pub fn schema_settings(&self) -> SchemaSettings {
        SchemaSettings {
            system_prompt: self.prompts.schema_generation.clone(),
            temperature: self.extraction.temperature,
            slicing: self.extraction.slicing,
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            system_prompt: self.prompts.extraction.clone(),
            not_found_instruction: self.prompts.not_found.clone(),
            temperature: self.extraction.temperature,
            slicing: self.extraction.slicing,
        }
    }
}

fn table(entries: &[(&str, ConfigValue)]) -> HashMap<String, ConfigValue> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(format!("Regex compilation failed: {e}")))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration.
///
/// Without an override, `config.yml` in the crate directory is used; if it is
/// missing, `config.{AI_PROVIDER}.yml` is loaded instead (`azure` by default).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");
    let mut builder = ConfigBuilder::builder()
        // Layer 1: Programmatic defaults.
        .set_default("use_case", default_use_case())?
        .set_default(
            "storage",
            table(&[
                ("backend", "local".into()),
                ("local_root", "data".into()),
            ]),
        )?
        .set_default(
            "extraction",
            table(&[
                ("temperature", 0.1.into()),
                ("slicing", "first_last".into()),
                ("grouping", "per_document".into()),
                ("output_format", "xlsx".into()),
            ]),
        )?
        .set_default(
            "prompts",
            table(&[
                ("schema_generation", SCHEMA_GENERATION_SYSTEM_PROMPT.into()),
                ("extraction", EXTRACTION_SYSTEM_PROMPT.into()),
                ("not_found", NOT_FOUND_INSTRUCTION.into()),
            ]),
        )?;

    // Layer 2: Main Config (with Fallback)
    let main_config_path = if let Some(override_path) = config_path_override {
        override_path.to_string()
    } else {
        let user_config_path = format!("{base_path}/config.yml");
        if std::path::Path::new(&user_config_path).exists() {
            info!("Loading user-defined configuration from '{user_config_path}'.");
            user_config_path
        } else {
            let provider = env::var("AI_PROVIDER").unwrap_or_else(|_| "azure".to_string());
            let fallback_path = format!("{base_path}/config.{provider}.yml");
            info!("'{user_config_path}' not found. Falling back to '{fallback_path}' based on AI_PROVIDER='{provider}'.");
            fallback_path
        }
    };

    let main_content = read_and_substitute(&main_config_path)?.ok_or_else(|| {
        ConfigError::NotFound(format!(
            "Main config file not found at '{main_config_path}'. Please ensure 'config.yml' exists or your AI_PROVIDER is set to load a valid template ('azure' or 'openai')."
        ))
    })?;
    builder = builder.add_source(File::from_str(&main_content, FileFormat::Yaml));

    // Layer 3: User Prompt Overrides (Optional)
    let prompt_dir = std::path::Path::new(&main_config_path)
        .parent()
        .map(|p| p.display().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| base_path.to_string());
    let user_prompt_path = format!("{prompt_dir}/prompt.yml");
    if let Some(user_prompts_content) = read_and_substitute(&user_prompt_path)? {
        info!("Loading user prompt overrides from '{user_prompt_path}'.");
        builder = builder.add_source(File::from_str(&user_prompts_content, FileFormat::Yaml));
    }

    let settings = builder
        // Layer 4: Environment variables for top-level keys like PORT.
        .add_source(Environment::default().try_parsing(true))
        // Layer 5: Prefixed environment variables for deeper overrides.
        .add_source(
            Environment::with_prefix("DOCSHEET")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
