//! # Application State
//!
//! The shared, immutable resources every request handler needs: the resolved
//! configuration, the tier-keyed AI providers, the blob store and the text
//! extractor.

use crate::config::{AppConfig, StorageBackend, StorageConfig};
use anyhow::anyhow;
use docsheet::{
    extract::TextExtractor,
    pipeline::PipelineSettings,
    providers::{
        ai::ProviderSet,
        factory::build_provider_set,
        storage::{AzureBlobStore, BlobStore, LocalBlobStore},
    },
    schema::SchemaSettings,
};
use docsheet_documents::DocumentTextExtractor;
use std::sync::Arc;
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub providers: Arc<ProviderSet>,
    pub store: Arc<dyn BlobStore>,
    pub extractor: Arc<dyn TextExtractor>,
    pub schema_settings: Arc<SchemaSettings>,
    pub pipeline_settings: Arc<PipelineSettings>,
}

impl AppState {
    /// Assembles a state from already constructed collaborators.
    pub fn new(
        config: AppConfig,
        providers: ProviderSet,
        store: Arc<dyn BlobStore>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            schema_settings: Arc::new(config.schema_settings()),
            pipeline_settings: Arc::new(config.pipeline_settings()),
            config: Arc::new(config),
            providers: Arc::new(providers),
            store,
            extractor,
        }
    }
}

/// Creates the blob store selected by the storage configuration.
pub fn build_blob_store(storage: &StorageConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    match storage.backend {
        StorageBackend::Local => {
            info!("Using local blob store at '{}'", storage.local_root);
            Ok(Arc::new(LocalBlobStore::new(&storage.local_root)))
        }
        StorageBackend::Azure => {
            let container_url = storage
                .container_url
                .clone()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| anyhow!("storage.container_url is required for the azure backend"))?;
            let sas_token = storage.sas_token.clone().unwrap_or_default();
            info!("Using Azure blob container '{container_url}'");
            Ok(Arc::new(AzureBlobStore::new(container_url, sas_token)?))
        }
    }
}

/// Builds the shared application state from the configuration.
pub fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let providers = build_provider_set(&config.providers)?;
    let store = build_blob_store(&config.storage)?;
    Ok(AppState::new(
        config,
        providers,
        store,
        Arc::new(DocumentTextExtractor),
    ))
}
