//! # AI Provider Factory
//!
//! Builds provider instances from configuration so the server and the CLI
//! construct identical providers from the same `config.yml` entries.

use crate::{
    errors::PromptError,
    providers::ai::{AiProvider, AzureOpenAiProvider, ModelTier, OpenAiCompatibleProvider, ProviderSet},
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";

/// A reusable configuration for a specific AI provider instance.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// The type of provider: "azure" or "openai".
    pub provider: String,
    /// The Azure resource endpoint, or the full chat completions URL for "openai".
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    /// The deployment name (azure) or model name (openai).
    pub model_name: String,
    /// The Azure REST API version.
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Creates a single provider from its configuration.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Box<dyn AiProvider>, PromptError> {
    let api_url = config.api_url.clone().filter(|u| !u.is_empty()).ok_or_else(|| {
        PromptError::MissingProvider(format!("api_url is required for provider '{name}'"))
    })?;

    let provider: Box<dyn AiProvider> = match config.provider.as_str() {
        "azure" => {
            let api_key = config.api_key.clone().filter(|k| !k.is_empty()).ok_or_else(|| {
                PromptError::MissingProvider(format!("api_key is required for azure provider '{name}'"))
            })?;
            let api_version = config
                .api_version
                .clone()
                .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());
            info!("Configuring Azure OpenAI provider '{name}' with deployment '{}'", config.model_name);
            Box::new(AzureOpenAiProvider::new(
                api_url,
                api_key,
                config.model_name.clone(),
                api_version,
            )?)
        }
        "openai" => {
            info!("Configuring OpenAI-compatible provider '{name}' with URL: {api_url}");
            Box::new(OpenAiCompatibleProvider::new(
                api_url,
                config.api_key.clone().filter(|k| !k.is_empty()),
                Some(config.model_name.clone()),
            )?)
        }
        other => {
            return Err(PromptError::MissingProvider(format!(
                "unsupported provider type '{other}' for provider '{name}'"
            )))
        }
    };
    Ok(provider)
}

/// Builds the tier-keyed provider set from a map of provider configurations.
///
/// Keys must be tier names (`standard`, `advanced`); the standard tier is required.
pub fn build_provider_set(configs: &HashMap<String, ProviderConfig>) -> Result<ProviderSet, PromptError> {
    let mut set = ProviderSet::new();
    for (name, config) in configs {
        let tier: ModelTier = name.parse().map_err(PromptError::MissingProvider)?;
        set.insert(tier, create_provider(name, config)?);
    }
    set.get(ModelTier::Standard)?;
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str, api_key: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            provider: provider.to_string(),
            api_url: Some("http://localhost:1234".to_string()),
            api_key: api_key.map(String::from),
            model_name: "gpt-35-turbo".to_string(),
            api_version: None,
        }
    }

    #[test]
    fn test_azure_requires_api_key() {
        assert!(create_provider("standard", &config("azure", None)).is_err());
        assert!(create_provider("standard", &config("azure", Some("k"))).is_ok());
    }

    #[test]
    fn test_unknown_provider_type_is_rejected() {
        assert!(create_provider("standard", &config("gemini", None)).is_err());
    }

    #[test]
    fn test_provider_set_requires_standard_tier_and_valid_names() {
        let mut configs = HashMap::new();
        configs.insert("advanced".to_string(), config("openai", None));
        assert!(build_provider_set(&configs).is_err());

        configs.insert("standard".to_string(), config("openai", None));
        let set = build_provider_set(&configs).unwrap();
        assert!(set.get(ModelTier::Advanced).is_ok());

        configs.insert("premium".to_string(), config("openai", None));
        assert!(build_provider_set(&configs).is_err());
    }
}
