//! # `docsheet-cli` Integration Tests

use anyhow::Result;
use clap::Parser;
use docsheet::json_text::SliceStrategy;
use docsheet_cli::{handle_run, load_schema_file, Cli, Commands, FormatArg, GroupingArg, RunArgs, TierArg};
use docsheet_server::{config::get_config, state::build_app_state};
use docsheet_test_utils::docx::generate_test_docx;
use httpmock::{Method::POST, MockServer};
use serde_json::json;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_run_arguments_parse() -> Result<()> {
    let cli = Cli::try_parse_from([
        "docsheet",
        "--config",
        "custom.yml",
        "run",
        "--folder",
        "hr,finance",
        "--folder",
        "legal",
        "--prompt",
        "Name and salary",
        "--tier",
        "advanced",
        "--grouping",
        "per-entity",
        "--format",
        "csv",
    ])?;

    assert_eq!(cli.config.as_deref(), Some("custom.yml"));
    let Commands::Run(args) = cli.command else {
        panic!("expected the run command");
    };
    assert_eq!(args.folders, vec!["hr", "finance", "legal"]);
    assert_eq!(args.tier, TierArg::Advanced);
    assert_eq!(args.grouping, Some(GroupingArg::PerEntity));
    assert_eq!(args.format, Some(FormatArg::Csv));
    assert!(!args.no_upload);
    Ok(())
}

#[test]
fn test_run_requires_a_folder() {
    let result = Cli::try_parse_from(["docsheet", "run", "--prompt", "x"]);
    assert!(result.is_err());
}

#[test]
fn test_load_schema_file_accepts_model_text_and_json() -> Result<()> {
    let dir = tempdir()?;
    let raw = dir.path().join("raw.txt");
    fs::write(&raw, "Sure:\n{\"name\": \"Jane\", \"salary\": 50000}\nDone.")?;
    let schema = load_schema_file(&raw, SliceStrategy::FirstLast)?;
    assert_eq!(schema.columns(), vec!["filename", "name", "salary"]);

    let missing = dir.path().join("missing.json");
    let err = load_schema_file(&missing, SliceStrategy::FirstLast).unwrap_err();
    assert!(err.to_string().contains("Failed to read schema file"));
    Ok(())
}

#[tokio::test]
async fn test_run_writes_local_csv_without_upload() -> Result<()> {
    let mock_server = MockServer::start_async().await;
    let ai_mock = mock_server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"name\": \"Jane Roe\", \"salary\": \"61000\"}"}}]
        }));
    });

    let data_dir = tempdir()?;
    let hr = data_dir.path().join("documents/hr");
    fs::create_dir_all(&hr)?;
    fs::write(hr.join("jane.docx"), generate_test_docx(&["Jane Roe earns 61000"])?)?;

    let config_path = data_dir.path().join("config.yml");
    fs::write(
        &config_path,
        format!(
            "storage:\n  backend: local\n  local_root: \"{}\"\nproviders:\n  standard:\n    provider: openai\n    api_url: \"{}\"\n    model_name: test\n",
            data_dir.path().display(),
            mock_server.url("/v1/chat/completions")
        ),
    )?;
    let schema_path = data_dir.path().join("schema.json");
    fs::write(&schema_path, r#"{"name": "Jane Doe", "salary": "50000"}"#)?;
    let out = data_dir.path().join("out.csv");

    let config = get_config(Some(&config_path.to_string_lossy()))?;
    let state = build_app_state(config)?;
    let outcome = handle_run(
        &state,
        RunArgs {
            folders: vec!["hr".into()],
            prompt: "Name and salary".into(),
            schema_file: Some(schema_path),
            tier: TierArg::Standard,
            grouping: None,
            format: Some(FormatArg::Csv),
            out: Some(out.clone()),
            no_upload: true,
        },
    )
    .await?;

    ai_mock.assert();
    assert_eq!(outcome.row_count, 1);
    assert!(outcome.blob_name.is_none());
    assert_eq!(
        fs::read_to_string(&out)?,
        "filename,name,salary\njane.docx,Jane Roe,61000\n"
    );
    assert!(!data_dir.path().join("results").exists());
    Ok(())
}
