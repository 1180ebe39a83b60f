//! # Core Data Types
//!
//! Rows, result tables and extraction targets shared by the pipeline, the
//! spreadsheet writers and the front-ends.

use serde::{Deserialize, Serialize};

/// The column every row starts with.
pub const FILENAME_COLUMN: &str = "filename";
/// Written for a field whose value could not be determined.
pub const NOT_FOUND: &str = "Not found";
/// Written when a document exceeded the model's context window.
pub const TOO_LONG: &str = "TOO_LONG";
/// Returned in place of a completion when the provider rate-limited the call.
pub const RATE_LIMIT_EXCEEDED: &str = "Rate limit exceeded";

/// One document that contributes text to an extraction target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// The full blob path of the document.
    pub path: String,
    /// A label shown to the model when a target has several documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_tag: Option<String>,
}

impl SourceDocument {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source_tag: None,
        }
    }

    pub fn tagged(path: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source_tag: Some(tag.into()),
        }
    }

    /// The last `/`-separated segment of the path.
    pub fn file_name(&self) -> &str {
        file_name_of(&self.path)
    }

    /// The lower-cased extension used to pick a text extractor.
    pub fn file_type(&self) -> String {
        file_type_of(&self.path)
    }
}

/// One entity to extract a row for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionTarget {
    /// The value written into the `filename` column.
    pub name: String,
    pub documents: Vec<SourceDocument>,
}

impl ExtractionTarget {
    /// A target backed by a single document, named after its file.
    pub fn single(path: impl Into<String>) -> Self {
        let document = SourceDocument::new(path);
        Self {
            name: document.file_name().to_string(),
            documents: vec![document],
        }
    }
}

/// One extracted row, columns in schema order with `filename` first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    pub fn new(cells: Vec<(String, String)>) -> Self {
        Self { cells }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(_, value)| value.as_str())
    }

    pub fn cells(&self) -> &[(String, String)] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Renders the row as a JSON map preserving column order.
    pub fn to_map(&self) -> serde_json::Map<String, serde_json::Value> {
        self.cells
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(self.to_map())
    }
}

/// The ordered collection of rows produced by one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub(crate) fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

pub(crate) fn file_type_of(path: &str) -> String {
    let name = file_name_of(path);
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_map_keeps_column_order() {
        let row = Row::new(vec![
            ("filename".to_string(), "b.pdf".to_string()),
            ("zeta".to_string(), "1".to_string()),
            ("alpha".to_string(), "Not found".to_string()),
        ]);
        let map = row.to_map();
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, ["filename", "zeta", "alpha"]);
        assert_eq!(row.to_json()["alpha"], "Not found");
    }

    #[test]
    fn test_file_type_is_last_extension_lowercased() {
        assert_eq!(SourceDocument::new("docs/cv/Jane.Doe.PDF").file_type(), "pdf");
        assert_eq!(SourceDocument::new("docs/cv/readme").file_type(), "");
        assert_eq!(SourceDocument::new("docs/cv/a.docx").file_name(), "a.docx");
    }

    #[test]
    fn test_row_lookup_and_json_order() {
        let row = Row::new(vec![
            ("filename".into(), "a.pdf".into()),
            ("name".into(), "Jane".into()),
        ]);
        assert_eq!(row.get("name"), Some("Jane"));
        assert_eq!(row.get("missing"), None);
        assert_eq!(
            row.to_json().to_string(),
            r#"{"filename":"a.pdf","name":"Jane"}"#
        );
    }
}
