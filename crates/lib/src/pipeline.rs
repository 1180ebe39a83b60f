//! # Row Extraction Pipeline
//!
//! Runs one extraction per target, strictly in order: folders in the order the
//! user selected them, targets in the order the document source enumerates them.
//!
//! Each target moves through `First -> Second -> Fallback`. A completion that
//! parses ends the target early; a second unparseable completion produces a
//! fallback row filled with sentinels. Provider conditions (context length,
//! rate limiting, other failures) are turned into completion text before parsing,
//! so a single document can never abort the batch.

use crate::{
    errors::{JsonTextError, PipelineError, PromptError, StorageError},
    extract::TextExtractor,
    json_text::{extract_json_object, SliceStrategy},
    prompts::{render_extraction_prompt, EXTRACTION_SYSTEM_PROMPT, NOT_FOUND_INSTRUCTION},
    providers::ai::{AiProvider, ChatRequest, ModelTier, ProviderSet},
    schema::Schema,
    source::{DocumentSource, TargetGrouping},
    types::{
        ExtractionTarget, ResultTable, Row, FILENAME_COLUMN, NOT_FOUND, RATE_LIMIT_EXCEEDED,
        TOO_LONG,
    },
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// The notice shown to the user when a provider call fails unexpectedly.
pub const GENERIC_FAILURE_NOTICE: &str = "Something went wrong, please contact the site admin.";

/// The per-run choices made by the user between runs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Folders in the order the user selected them.
    pub folders: Vec<String>,
    /// The user's original extraction instruction, sent as the user turn.
    pub instruction: String,
    pub schema: Schema,
    pub model_tier: ModelTier,
    pub grouping: TargetGrouping,
}

/// Prompt and sampling settings shared by every run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Template with `{schema}` and `{documents}` placeholders.
    pub system_prompt: String,
    pub not_found_instruction: String,
    pub temperature: f32,
    pub slicing: SliceStrategy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            system_prompt: EXTRACTION_SYSTEM_PROMPT.to_string(),
            not_found_instruction: NOT_FOUND_INSTRUCTION.to_string(),
            temperature: 0.1,
            slicing: SliceStrategy::default(),
        }
    }
}

// --- Progress ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    /// Whole percent completed, rounded down so only a finished run reads 100.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            100
        } else {
            (self.completed.min(self.total) * 100 / self.total) as u8
        }
    }
}

/// Receives a progress update after every completed target.
pub trait ProgressReporter: Send {
    fn on_progress(&mut self, progress: Progress);
}

impl<F: FnMut(Progress) + Send> ProgressReporter for F {
    fn on_progress(&mut self, progress: Progress) {
        self(progress)
    }
}

/// Logs progress through `tracing`.
#[derive(Debug, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn on_progress(&mut self, progress: Progress) {
        info!(
            completed = progress.completed,
            total = progress.total,
            "Extraction progress: {}%",
            progress.percent()
        );
    }
}

// --- Run results ---

/// How often each path of the state machine was taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub first_attempt: usize,
    pub second_attempt: usize,
    pub fallback: usize,
    pub too_long: usize,
    pub unreadable: usize,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub table: ResultTable,
    /// User-facing messages about absorbed failures.
    pub notices: Vec<String>,
    pub stats: RunStats,
}

enum AttemptState {
    First,
    Second,
    Fallback { too_long: bool },
}

enum TargetOutcome {
    Parsed { map: Map<String, Value>, attempts: u8 },
    Fallback { too_long: bool },
    Unreadable,
}

// --- Pipeline ---

pub struct ExtractionPipeline<'a> {
    providers: &'a ProviderSet,
    source: DocumentSource<'a>,
    extractor: &'a dyn TextExtractor,
    settings: &'a PipelineSettings,
}

impl<'a> ExtractionPipeline<'a> {
    pub fn new(
        providers: &'a ProviderSet,
        source: DocumentSource<'a>,
        extractor: &'a dyn TextExtractor,
        settings: &'a PipelineSettings,
    ) -> Self {
        Self {
            providers,
            source,
            extractor,
            settings,
        }
    }

    /// Enumerates every target of the selected folders, in processing order.
    pub async fn collect_targets(
        &self,
        config: &RunConfig,
    ) -> Result<Vec<ExtractionTarget>, PipelineError> {
        let mut targets = Vec::new();
        for folder in &config.folders {
            targets.extend(self.source.list_targets(folder, config.grouping).await?);
        }
        Ok(targets)
    }

    /// Runs the full batch for the selected folders.
    #[instrument(skip_all, fields(folders = ?config.folders, tier = %config.model_tier))]
    pub async fn run(
        &self,
        config: &RunConfig,
        progress: &mut dyn ProgressReporter,
    ) -> Result<RunReport, PipelineError> {
        let targets = self.collect_targets(config).await?;
        info!("Extracting {} target(s)", targets.len());
        self.run_targets(config, &targets, progress).await
    }

    /// Runs the batch for an already enumerated list of targets.
    pub async fn run_targets(
        &self,
        config: &RunConfig,
        targets: &[ExtractionTarget],
        progress: &mut dyn ProgressReporter,
    ) -> Result<RunReport, PipelineError> {
        let provider = self.providers.get(config.model_tier)?;
        let mut report = RunReport {
            run_id: Uuid::new_v4(),
            table: ResultTable::new(config.schema.columns()),
            notices: Vec::new(),
            stats: RunStats::default(),
        };

        for (index, target) in targets.iter().enumerate() {
            let outcome = self
                .extract_target(provider, config, target, &mut report.notices)
                .await;
            let row = match outcome {
                TargetOutcome::Parsed { map, attempts } => {
                    if attempts == 1 {
                        report.stats.first_attempt += 1;
                    } else {
                        report.stats.second_attempt += 1;
                    }
                    normalize_row(&config.schema, &target.name, &map)
                }
                TargetOutcome::Fallback { too_long } => {
                    report.stats.fallback += 1;
                    if too_long {
                        report.stats.too_long += 1;
                    }
                    fallback_row(&config.schema, &target.name, too_long)
                }
                TargetOutcome::Unreadable => {
                    report.stats.unreadable += 1;
                    fallback_row(&config.schema, &target.name, false)
                }
            };
            report.table.push(row);
            progress.on_progress(Progress {
                completed: index + 1,
                total: targets.len(),
            });
        }

        info!(run_id = %report.run_id, stats = ?report.stats, "Extraction run finished");
        Ok(report)
    }

    #[instrument(skip_all, fields(target = %target.name))]
    async fn extract_target(
        &self,
        provider: &dyn AiProvider,
        config: &RunConfig,
        target: &ExtractionTarget,
        notices: &mut Vec<String>,
    ) -> TargetOutcome {
        let documents = match self.load_documents(target).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping extraction for '{}': {e}", target.name);
                notices.push(format!(
                    "Document '{}' could not be read; its row was filled with '{NOT_FOUND}'.",
                    target.name
                ));
                return TargetOutcome::Unreadable;
            }
        };
        let request = self.build_request(config, &documents);

        let mut provider_failed = false;
        let mut state = AttemptState::First;
        let outcome = loop {
            state = match state {
                AttemptState::First => {
                    let text = self
                        .invoke(provider, &request, &target.name, &mut provider_failed)
                        .await;
                    match self.parse(&text, &target.name) {
                        Ok(map) => break TargetOutcome::Parsed { map, attempts: 1 },
                        Err(e) => {
                            debug!("First attempt unparseable, retrying: {e}");
                            AttemptState::Second
                        }
                    }
                }
                AttemptState::Second => {
                    let text = self
                        .invoke(provider, &request, &target.name, &mut provider_failed)
                        .await;
                    match self.parse(&text, &target.name) {
                        Ok(map) => break TargetOutcome::Parsed { map, attempts: 2 },
                        Err(e) => {
                            warn!("Second attempt unparseable, using fallback row: {e}");
                            AttemptState::Fallback {
                                too_long: text == TOO_LONG,
                            }
                        }
                    }
                }
                AttemptState::Fallback { too_long } => {
                    break TargetOutcome::Fallback { too_long };
                }
            };
        };

        // One notice per document, however many attempts failed.
        if provider_failed {
            notices.push(GENERIC_FAILURE_NOTICE.to_string());
        }
        outcome
    }

    /// Reads and converts every document of a target into one prompt section.
    async fn load_documents(&self, target: &ExtractionTarget) -> Result<String, StorageError> {
        let mut sections = Vec::with_capacity(target.documents.len());
        for document in &target.documents {
            let data = self.source.get_content(&document.path).await.inspect_err(|e| {
                debug!("Failed to download '{}': {e}", document.path);
            })?;
            let text = self
                .extractor
                .extract(&data, &document.file_type())
                .unwrap_or_else(|e| {
                    warn!("Text extraction failed for '{}': {e}", document.path);
                    String::new()
                });
            sections.push(match &document.source_tag {
                Some(tag) => format!("Source '{tag}':\n{text}"),
                None => text,
            });
        }
        Ok(sections.join("\n\n"))
    }

    fn build_request(&self, config: &RunConfig, documents: &str) -> ChatRequest {
        let system_prompt = render_extraction_prompt(
            &self.settings.system_prompt,
            &config.schema.canonical_json(),
            documents,
        );
        ChatRequest {
            system_messages: vec![system_prompt, self.settings.not_found_instruction.clone()],
            user_message: config.instruction.clone(),
            temperature: self.settings.temperature,
        }
    }

    /// Calls the provider once, folding classified failures into completion text.
    ///
    /// Unclassified failures set `failed` and yield an empty completion.
    async fn invoke(
        &self,
        provider: &dyn AiProvider,
        request: &ChatRequest,
        target: &str,
        failed: &mut bool,
    ) -> String {
        match provider.generate(request).await {
            Ok(text) => text,
            Err(PromptError::ContextLengthExceeded(message)) => {
                warn!("Context length exceeded for '{target}': {message}");
                TOO_LONG.to_string()
            }
            Err(PromptError::RateLimited(message)) => {
                warn!("Rate limited while extracting '{target}': {message}");
                RATE_LIMIT_EXCEEDED.to_string()
            }
            Err(e) => {
                error!("Failed to create the analysis for '{target}': {e}");
                *failed = true;
                String::new()
            }
        }
    }

    fn parse(&self, text: &str, target: &str) -> Result<Map<String, Value>, JsonTextError> {
        extract_json_object(text, target, self.settings.slicing)
    }
}

/// Projects a parsed completion onto the schema columns.
///
/// `filename` is always the target name. Missing keys and JSON `null` become
/// `Not found`; keys outside the schema are dropped.
pub fn normalize_row(schema: &Schema, target_name: &str, parsed: &Map<String, Value>) -> Row {
    let mut cells = Vec::with_capacity(schema.fields().len() + 1);
    cells.push((FILENAME_COLUMN.to_string(), target_name.to_string()));
    for field in schema.field_names() {
        let value = match parsed.get(field) {
            None | Some(Value::Null) => NOT_FOUND.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        cells.push((field.to_string(), value));
    }
    Row::new(cells)
}

/// Builds the row used when both attempts failed to parse.
pub fn fallback_row(schema: &Schema, target_name: &str, too_long: bool) -> Row {
    let sentinel = if too_long { TOO_LONG } else { NOT_FOUND };
    let mut cells = Vec::with_capacity(schema.fields().len() + 1);
    cells.push((FILENAME_COLUMN.to_string(), target_name.to_string()));
    cells.extend(
        schema
            .field_names()
            .map(|field| (field.to_string(), sentinel.to_string())),
    );
    Row::new(cells)
}
