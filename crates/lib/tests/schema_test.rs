//! # Schema Generation Tests

mod common;

use anyhow::Result;
use docsheet::{
    errors::{PromptError, SchemaError},
    generate_schema,
    json_text::SliceStrategy,
    SchemaSettings,
};
use docsheet_test_utils::{MockAiProvider, MockReply};
use serde_json::json;

const SCHEMA_KEY: &str = "Restructure the data the user wants extracted";

#[tokio::test]
async fn test_generates_schema_from_instruction() -> Result<()> {
    common::setup_tracing();
    let ai = MockAiProvider::new();
    ai.add_response(
        SCHEMA_KEY,
        r#"Here is the object:
```json
{"name": "Jane Doe", "date_of_birth": "1990-01-01", "age": 34}
```"#,
    );

    let schema = generate_schema(&ai, "Give me name, DOB and age", &SchemaSettings::default()).await?;

    assert_eq!(schema.columns(), vec!["filename", "name", "date_of_birth", "age"]);
    let preview = schema.preview();
    assert_eq!(
        serde_json::Value::Object(preview.example_row),
        json!({"filename": "example.pdf", "name": "Jane Doe", "date_of_birth": "1990-01-01", "age": "34"})
    );

    let calls = ai.get_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].user_message, "Give me name, DOB and age");
    assert_eq!(calls[0].system_messages.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_empty_instruction_makes_no_call() {
    let ai = MockAiProvider::new();
    for instruction in ["", "   \n\t"] {
        let err = generate_schema(&ai, instruction, &SchemaSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SchemaError::EmptyInstruction));
        assert_eq!(err.to_string(), "Please enter your prompt.");
    }
    assert_eq!(ai.call_count(), 0);
}

#[tokio::test]
async fn test_unparseable_response_is_not_retried() {
    let ai = MockAiProvider::new();
    ai.add_response(SCHEMA_KEY, "Sorry, I can't help with that.");

    let err = generate_schema(&ai, "Extract totals", &SchemaSettings::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SchemaError::Parse(_)));
    assert_eq!(ai.call_count(), 1);
}

#[tokio::test]
async fn test_provider_errors_are_surfaced() {
    let ai = MockAiProvider::new();
    ai.push_reply(MockReply::RateLimited);

    let err = generate_schema(&ai, "Extract totals", &SchemaSettings::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SchemaError::Provider(PromptError::RateLimited(_))));
}

#[tokio::test]
async fn test_balanced_slicing_ignores_trailing_braces() -> Result<()> {
    let ai = MockAiProvider::new();
    ai.add_response(SCHEMA_KEY, r#"{"total": "12.50"} Note: use {curly} placeholders."#);
    let settings = SchemaSettings {
        slicing: SliceStrategy::Balanced,
        ..SchemaSettings::default()
    };

    let schema = generate_schema(&ai, "Extract totals", &settings).await?;
    assert_eq!(schema.fields(), &[("total".to_string(), "12.50".to_string())]);

    let err = generate_schema(&ai, "Extract totals", &SchemaSettings::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SchemaError::Parse(_)));
    Ok(())
}
