use docsheet::{pipeline::RunStats, providers::ai::ModelTier, source::TargetGrouping};
use docsheet_sheets::SpreadsheetFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize, Default)]
pub struct DebugParams {
    pub debug: Option<bool>,
}

#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
    pub result: T,
}

// --- Schema ---

#[derive(Debug, Deserialize)]
pub struct SchemaRequest {
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub model_tier: ModelTier,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub columns: Vec<String>,
    pub example_row: Map<String, Value>,
    /// The raw model text, to be sent back unchanged with `/extract`.
    pub raw: String,
}

// --- Extraction ---

/// The schema of an extraction request, either as raw model text or as an
/// object of field names and example values.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SchemaInput {
    Raw(String),
    Fields(Map<String, Value>),
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub folders: Vec<String>,
    #[serde(default)]
    pub instruction: String,
    pub schema: SchemaInput,
    #[serde(default)]
    pub model_tier: ModelTier,
    #[serde(default)]
    pub grouping: Option<TargetGrouping>,
    #[serde(default)]
    pub format: Option<SpreadsheetFormat>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub message: String,
    pub blob_name: String,
    pub download_url: String,
    pub row_count: usize,
    pub rows: Vec<Map<String, Value>>,
    pub notices: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RunDebugInfo {
    pub run_id: String,
    pub stats: RunStats,
    pub targets: usize,
}
