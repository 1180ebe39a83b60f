#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared setup for the pipeline tests: an in-memory store, a scripted provider
//! and a plain-text extractor wired into an `ExtractionPipeline`.

use docsheet::{
    pipeline::{ExtractionPipeline, PipelineSettings, Progress, RunConfig, RunReport},
    providers::ai::{ModelTier, ProviderSet},
    schema::Schema,
    source::{DocumentSource, TargetGrouping},
};
use docsheet_test_utils::{MemoryBlobStore, MockAiProvider, Utf8Extractor};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the tracing subscriber for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub const ROOT: &str = "documents";

/// A unique substring of the default extraction system prompt.
pub const EXTRACTION_KEY: &str = "Extract the exact data the user asks for";

pub struct Fixture {
    pub store: MemoryBlobStore,
    pub ai: MockAiProvider,
    pub providers: ProviderSet,
    pub extractor: Utf8Extractor,
    pub settings: PipelineSettings,
}

impl Fixture {
    pub fn new() -> Self {
        setup_tracing();
        let ai = MockAiProvider::new();
        let providers = ProviderSet::new().with(ModelTier::Standard, Box::new(ai.clone()));
        Self {
            store: MemoryBlobStore::new(),
            ai,
            providers,
            extractor: Utf8Extractor::default(),
            settings: PipelineSettings::default(),
        }
    }

    /// Runs the pipeline and returns the report together with every progress update.
    pub async fn run(&self, config: &RunConfig) -> anyhow::Result<(RunReport, Vec<Progress>)> {
        let source = DocumentSource::new(&self.store, ROOT);
        let pipeline = ExtractionPipeline::new(&self.providers, source, &self.extractor, &self.settings);
        let mut updates = Vec::new();
        let mut reporter = |p: Progress| updates.push(p);
        let report = pipeline.run(config, &mut reporter).await?;
        Ok((report, updates))
    }
}

pub fn person_schema() -> Schema {
    Schema::from_fields(vec![
        ("name".into(), "Jane Doe".into()),
        ("dob".into(), "1990-01-01".into()),
        ("age".into(), "34".into()),
    ])
    .expect("valid schema")
}

pub fn run_config(folders: &[&str], schema: Schema) -> RunConfig {
    RunConfig {
        folders: folders.iter().map(|f| f.to_string()).collect(),
        instruction: "Extract name, date of birth and age".to_string(),
        schema,
        model_tier: ModelTier::Standard,
        grouping: TargetGrouping::PerDocument,
    }
}
