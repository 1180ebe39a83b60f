use super::{wrap_response, ApiResponse, AppError, AppState, DebugParams};
use crate::types::{SchemaRequest, SchemaResponse};
use axum::{
    extract::{Query, State},
    Json,
};
use docsheet::{generate_schema, SchemaError};
use serde_json::json;
use tracing::info;

/// Generates an extraction schema from the user's instruction and returns its
/// tabular preview.
pub async fn schema_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<SchemaRequest>,
) -> Result<Json<ApiResponse<SchemaResponse>>, AppError> {
    info!(tier = %payload.model_tier, "Received schema request");
    let provider = app_state
        .providers
        .get(payload.model_tier)
        .map_err(SchemaError::Provider)?;
    let schema = generate_schema(provider, &payload.instruction, &app_state.schema_settings).await?;

    let preview = schema.preview();
    let debug_info = json!({
        "model_tier": payload.model_tier,
        "canonical_schema": schema.canonical_json(),
    });
    let response = SchemaResponse {
        columns: preview.columns,
        example_row: preview.example_row,
        raw: schema.raw().to_string(),
    };
    Ok(wrap_response(response, debug_params, Some(debug_info)))
}
