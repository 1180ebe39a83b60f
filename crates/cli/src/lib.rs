//! # `docsheet-cli` Library Crate
//!
//! Batch extraction from the terminal, sharing configuration and state
//! construction with `docsheet-server`:
//!
//! - `folders` lists the selectable document folders.
//! - `schema` generates and previews a schema for an instruction.
//! - `run` extracts the schema from one or more folders and writes the
//!   spreadsheet locally and/or to the `results` folder of the blob store.

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use docsheet::{
    generate_schema,
    json_text::SliceStrategy,
    pipeline::{ExtractionPipeline, Progress, RunConfig},
    providers::ai::ModelTier,
    schema::Schema,
    sink::publish_result,
    source::{DocumentSource, TargetGrouping},
};
use docsheet_server::{
    config::get_config,
    handlers::COMPLETION_MESSAGE,
    state::{build_app_state, AppState},
};
use docsheet_sheets::SpreadsheetFormat;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

// --- CLI Argument Structs ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file. Defaults to the server's `config.yml`.
    #[arg(long, global = true, env = "DOCSHEET_CONFIG")]
    pub config: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the document folders available for extraction
    Folders,
    /// Generate an extraction schema from a natural-language instruction
    Schema(SchemaArgs),
    /// Extract data from the documents of one or more folders into a spreadsheet
    Run(RunArgs),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TierArg {
    #[default]
    Standard,
    Advanced,
}

impl From<TierArg> for ModelTier {
    fn from(value: TierArg) -> Self {
        match value {
            TierArg::Standard => ModelTier::Standard,
            TierArg::Advanced => ModelTier::Advanced,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum GroupingArg {
    PerDocument,
    PerEntity,
}

impl From<GroupingArg> for TargetGrouping {
    fn from(value: GroupingArg) -> Self {
        match value {
            GroupingArg::PerDocument => TargetGrouping::PerDocument,
            GroupingArg::PerEntity => TargetGrouping::PerEntity,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Xlsx,
    Csv,
}

impl From<FormatArg> for SpreadsheetFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Xlsx => SpreadsheetFormat::Xlsx,
            FormatArg::Csv => SpreadsheetFormat::Csv,
        }
    }
}

#[derive(Parser, Debug)]
pub struct SchemaArgs {
    /// What to extract, e.g. "name, date of birth and current employer".
    #[arg(long)]
    pub prompt: String,
    #[arg(long, value_enum, default_value_t = TierArg::Standard)]
    pub tier: TierArg,
    /// Write the raw schema text to this file for a later `run --schema-file`.
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// A folder to process; repeat or separate with commas to select several.
    #[arg(long = "folder", required = true, value_delimiter = ',')]
    pub folders: Vec<String>,
    /// The extraction instruction sent with every document.
    #[arg(long)]
    pub prompt: String,
    /// A schema file (raw model text or a JSON object). Generated from the prompt if omitted.
    #[arg(long)]
    pub schema_file: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = TierArg::Standard)]
    pub tier: TierArg,
    #[arg(long, value_enum)]
    pub grouping: Option<GroupingArg>,
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
    /// Also write the spreadsheet to this local path.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Do not persist the spreadsheet in the blob store.
    #[arg(long)]
    pub no_upload: bool,
}

// --- Public Entrypoint ---

/// The main entry point for the `docsheet` CLI.
pub async fn run(cli: Cli) -> Result<()> {
    let config = get_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let state = build_app_state(config)?;
    match cli.command {
        Commands::Folders => handle_folders(&state).await,
        Commands::Schema(args) => handle_schema(&state, args).await,
        Commands::Run(args) => handle_run(&state, args).await.map(|_| ()),
    }
}

// --- Command Handlers ---

async fn handle_folders(state: &AppState) -> Result<()> {
    let source = DocumentSource::new(state.store.as_ref(), &state.config.use_case);
    let folders = source.list_folders().await?;
    if folders.is_empty() {
        println!("No folders found under '{}'.", state.config.use_case);
    }
    for folder in folders {
        println!("{folder}");
    }
    Ok(())
}

async fn generate(state: &AppState, prompt: &str, tier: TierArg) -> Result<Schema> {
    let provider = state.providers.get(tier.into())?;
    Ok(generate_schema(provider, prompt, &state.schema_settings).await?)
}

async fn handle_schema(state: &AppState, args: SchemaArgs) -> Result<()> {
    let schema = generate(state, &args.prompt, args.tier).await?;
    println!("{}", serde_json::to_string_pretty(&schema.preview())?);
    if let Some(path) = args.save {
        fs::write(&path, schema.raw())
            .with_context(|| format!("Failed to write schema to '{}'", path.display()))?;
        println!("Schema saved to '{}'.", path.display());
    }
    Ok(())
}

/// Reads a schema file containing either raw model text or a JSON object.
pub fn load_schema_file(path: &Path, slicing: SliceStrategy) -> Result<Schema> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file '{}'", path.display()))?;
    Schema::from_model_text(&text, slicing)
        .with_context(|| format!("Invalid schema in '{}'", path.display()))
}

/// What a `run` produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub row_count: usize,
    pub blob_name: Option<String>,
    pub local_path: Option<PathBuf>,
    pub notices: Vec<String>,
}

/// Handles the `docsheet run` command and returns where the results went.
pub async fn handle_run(state: &AppState, args: RunArgs) -> Result<RunOutcome> {
    if args.no_upload && args.out.is_none() {
        bail!("--no-upload requires --out, otherwise the results would be discarded");
    }
    let schema = match &args.schema_file {
        Some(path) => load_schema_file(path, state.pipeline_settings.slicing)?,
        None => generate(state, &args.prompt, args.tier).await?,
    };
    println!("Columns: {}", schema.columns().join(", "));

    let config = RunConfig {
        folders: args.folders,
        instruction: args.prompt,
        schema,
        model_tier: args.tier.into(),
        grouping: args
            .grouping
            .map(Into::into)
            .unwrap_or(state.config.extraction.grouping),
    };
    let source = DocumentSource::new(state.store.as_ref(), &state.config.use_case);
    let pipeline = ExtractionPipeline::new(
        &state.providers,
        source,
        state.extractor.as_ref(),
        &state.pipeline_settings,
    );
    let mut progress = |p: Progress| {
        eprintln!("[{:>3}%] {}/{} processed", p.percent(), p.completed, p.total);
    };
    let report = pipeline.run(&config, &mut progress).await?;
    info!(run_id = %report.run_id, stats = ?report.stats, "Run complete");

    let format: SpreadsheetFormat = args
        .format
        .map(Into::into)
        .unwrap_or(state.config.extraction.output_format);
    let data = format.write(&report.table)?;

    if let Some(path) = &args.out {
        fs::write(path, &data)
            .with_context(|| format!("Failed to write results to '{}'", path.display()))?;
        println!("Results written to '{}'.", path.display());
    }
    let blob_name = if args.no_upload {
        None
    } else {
        let published =
            publish_result(state.store.as_ref(), data, &Local::now(), format.extension()).await?;
        println!("{COMPLETION_MESSAGE} ({})", published.blob_name);
        Some(published.blob_name)
    };
    for notice in &report.notices {
        eprintln!("Notice: {notice}");
    }

    Ok(RunOutcome {
        row_count: report.table.len(),
        blob_name,
        local_path: args.out,
        notices: report.notices,
    })
}
