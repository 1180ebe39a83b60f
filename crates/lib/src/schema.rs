//! # Schema Inference
//!
//! Turns a natural-language extraction request into a flat schema of field names
//! and example values with a single model call. The schema is then reused
//! unchanged for every document of a run.

use crate::{
    errors::SchemaError,
    json_text::{extract_json_object, SliceStrategy},
    prompts::SCHEMA_GENERATION_SYSTEM_PROMPT,
    providers::ai::{AiProvider, ChatRequest},
    types::FILENAME_COLUMN,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, instrument};

/// The example value shown for `filename` in a schema preview.
pub const EXAMPLE_FILE_NAME: &str = "example.pdf";

/// Settings for the schema generation call.
#[derive(Debug, Clone)]
pub struct SchemaSettings {
    pub system_prompt: String,
    pub temperature: f32,
    pub slicing: SliceStrategy,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            system_prompt: SCHEMA_GENERATION_SYSTEM_PROMPT.to_string(),
            temperature: 0.1,
            slicing: SliceStrategy::default(),
        }
    }
}

/// An ordered, flat mapping from field name to example value.
///
/// `filename` is not stored as a field; it is always the first column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    raw: String,
    fields: Vec<(String, String)>,
}

/// The tabular preview of a schema: its columns and one row of example values.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SchemaPreview {
    pub columns: Vec<String>,
    pub example_row: Map<String, Value>,
}

impl Schema {
    /// Parses a schema out of free model text.
    pub fn from_model_text(raw: &str, slicing: SliceStrategy) -> Result<Self, SchemaError> {
        let parsed = extract_json_object(raw, EXAMPLE_FILE_NAME, slicing)?;
        Ok(Self {
            raw: raw.to_string(),
            fields: flat_fields(parsed)?,
        })
    }

    /// Builds a schema from a JSON object of field names and example values.
    pub fn from_object(object: Map<String, Value>) -> Result<Self, SchemaError> {
        Self::from_fields(flat_fields(object)?)
    }

    /// Builds a schema from explicit fields, rendering them as canonical JSON.
    pub fn from_fields(fields: Vec<(String, String)>) -> Result<Self, SchemaError> {
        let fields: Vec<_> = fields
            .into_iter()
            .filter(|(k, _)| k != FILENAME_COLUMN)
            .collect();
        if fields.is_empty() {
            return Err(SchemaError::NoFields);
        }
        let mut schema = Self {
            raw: String::new(),
            fields,
        };
        schema.raw = schema.canonical_json();
        Ok(schema)
    }

    /// The model text the schema was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Field names and example values, without `filename`.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// All result columns: `filename` followed by the schema fields.
    pub fn columns(&self) -> Vec<String> {
        std::iter::once(FILENAME_COLUMN.to_string())
            .chain(self.fields.iter().map(|(name, _)| name.clone()))
            .collect()
    }

    /// The schema as a compact JSON object of example values, as embedded in prompts.
    pub fn canonical_json(&self) -> String {
        let map = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<_, _>>();
        Value::Object(map).to_string()
    }

    pub fn preview(&self) -> SchemaPreview {
        let mut example_row = Map::new();
        example_row.insert(
            FILENAME_COLUMN.to_string(),
            Value::String(EXAMPLE_FILE_NAME.to_string()),
        );
        for (name, example) in &self.fields {
            example_row.insert(name.clone(), Value::String(example.clone()));
        }
        SchemaPreview {
            columns: self.columns(),
            example_row,
        }
    }
}

/// Flattens a JSON object into `(field, example)` pairs, skipping `filename`.
fn flat_fields(object: Map<String, Value>) -> Result<Vec<(String, String)>, SchemaError> {
    let mut fields = Vec::with_capacity(object.len());
    for (key, value) in object {
        if key == FILENAME_COLUMN {
            continue;
        }
        let example = match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            Value::Object(_) | Value::Array(_) => return Err(SchemaError::Nested(key)),
            other => other.to_string(),
        };
        fields.push((key, example));
    }
    if fields.is_empty() {
        return Err(SchemaError::NoFields);
    }
    Ok(fields)
}

/// Generates a schema from a user's extraction instruction.
///
/// An empty instruction is rejected without calling the provider. Provider and
/// parse failures are returned as-is; there is no retry.
#[instrument(skip(provider, settings))]
pub async fn generate_schema(
    provider: &dyn AiProvider,
    instruction: &str,
    settings: &SchemaSettings,
) -> Result<Schema, SchemaError> {
    if instruction.trim().is_empty() {
        return Err(SchemaError::EmptyInstruction);
    }

    let request = ChatRequest {
        system_messages: vec![settings.system_prompt.clone()],
        user_message: instruction.to_string(),
        temperature: settings.temperature,
    };
    let response = provider.generate(&request).await?;
    let schema = Schema::from_model_text(&response, settings.slicing)?;
    info!(fields = schema.fields.len(), "Generated extraction schema");
    Ok(schema)
}
