//! # JSON-from-text Extraction
//!
//! Model completions are free text that is expected to contain one JSON object.
//! The default strategy takes everything between the first `{` and the last `}`
//! without matching braces, so prose containing extra braces produces a
//! malformed slice. The pipeline's retry and fallback absorb that case.

use crate::{errors::JsonTextError, types::FILENAME_COLUMN};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How the JSON object is located inside a model response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceStrategy {
    /// Slice from the first `{` to the last `}` inclusive.
    #[default]
    FirstLast,
    /// Take the first brace-balanced object (string-literal aware) that parses.
    Balanced,
}

/// Extracts a JSON object from `text` and prepends `filename`.
///
/// The returned map starts with the `filename` key set to `file_name`; every key of
/// the parsed object is merged in afterwards, so a `filename` key produced by the
/// model replaces the value but keeps the first position.
pub fn extract_json_object(
    text: &str,
    file_name: &str,
    strategy: SliceStrategy,
) -> Result<Map<String, Value>, JsonTextError> {
    let parsed = match strategy {
        SliceStrategy::FirstLast => parse_first_last(text)?,
        SliceStrategy::Balanced => parse_balanced(text)?,
    };

    let mut merged = Map::new();
    merged.insert(
        FILENAME_COLUMN.to_string(),
        Value::String(file_name.to_string()),
    );
    for (key, value) in parsed {
        merged.insert(key, value);
    }
    Ok(merged)
}

fn parse_first_last(text: &str) -> Result<Map<String, Value>, JsonTextError> {
    let (start, end) = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => (start, end),
        _ => return Err(JsonTextError::NoObject),
    };
    into_object(serde_json::from_str(&text[start..=end])?)
}

fn parse_balanced(text: &str) -> Result<Map<String, Value>, JsonTextError> {
    let mut last_error = None;
    for (start, _) in text.match_indices('{') {
        let Some(end) = balanced_end(&text[start..]) else {
            continue;
        };
        match serde_json::from_str::<Value>(&text[start..start + end + 1]) {
            Ok(value) => return into_object(value),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.map_or(JsonTextError::NoObject, JsonTextError::Malformed))
}

/// Byte offset of the `}` closing the object that opens at offset 0.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn into_object(value: Value) -> Result<Map<String, Value>, JsonTextError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(JsonTextError::NotAnObject),
    }
}
