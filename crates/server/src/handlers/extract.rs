//! # Extraction Handlers
//!
//! `POST /extract` runs the pipeline over the selected folders, writes the
//! spreadsheet and persists it in the `results` folder of the blob store.
//! `GET /results/{file_name}` serves a persisted spreadsheet for download.

use super::{wrap_response, ApiResponse, AppError, AppState, DebugParams};
use crate::types::{ExtractRequest, ExtractResponse, RunDebugInfo, SchemaInput};
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::Response,
    Json,
};
use chrono::Local;
use docsheet::{
    pipeline::{ExtractionPipeline, RunConfig, TracingProgress},
    schema::Schema,
    sink::{publish_result, result_blob_name, DOWNLOAD_MIME_TYPE, RESULTS_FOLDER},
    source::DocumentSource,
    types::Row,
    SchemaError,
};
use tracing::info;

pub const COMPLETION_MESSAGE: &str =
    "The results have been compiled. Please look in the 'results' folder of the blob storage.";

pub async fn extract_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<ExtractRequest>,
) -> Result<Json<ApiResponse<ExtractResponse>>, AppError> {
    if payload.folders.is_empty() {
        return Err(AppError::BadRequest(
            "Please select at least one folder.".to_string(),
        ));
    }
    if payload.instruction.trim().is_empty() {
        return Err(SchemaError::EmptyInstruction.into());
    }

    let schema = match payload.schema {
        SchemaInput::Raw(raw) => Schema::from_model_text(&raw, app_state.pipeline_settings.slicing),
        SchemaInput::Fields(object) => Schema::from_object(object),
    }
    .map_err(|e| AppError::BadRequest(format!("Invalid schema: {e}")))?;
    let config = RunConfig {
        folders: payload.folders,
        instruction: payload.instruction,
        schema,
        model_tier: payload.model_tier,
        grouping: payload
            .grouping
            .unwrap_or(app_state.config.extraction.grouping),
    };
    info!(folders = ?config.folders, tier = %config.model_tier, "Received extraction request");

    let source = DocumentSource::new(app_state.store.as_ref(), &app_state.config.use_case);
    let pipeline = ExtractionPipeline::new(
        &app_state.providers,
        source,
        app_state.extractor.as_ref(),
        &app_state.pipeline_settings,
    );
    let report = pipeline.run(&config, &mut TracingProgress).await?;

    let format = payload
        .format
        .unwrap_or(app_state.config.extraction.output_format);
    let data = format.write(&report.table)?;
    let published = publish_result(
        app_state.store.as_ref(),
        data,
        &Local::now(),
        format.extension(),
    )
    .await?;

    let debug_info = serde_json::to_value(RunDebugInfo {
        run_id: report.run_id.to_string(),
        stats: report.stats,
        targets: report.table.len(),
    })
    .ok();
    let response = ExtractResponse {
        message: COMPLETION_MESSAGE.to_string(),
        download_url: format!("/{RESULTS_FOLDER}/{}", published.file_name),
        blob_name: published.blob_name,
        row_count: report.table.len(),
        rows: report.table.rows().iter().map(Row::to_map).collect(),
        notices: report.notices,
    };
    Ok(wrap_response(response, debug_params, debug_info))
}

/// Serves a persisted result spreadsheet as an attachment.
pub async fn download_result_handler(
    State(app_state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, AppError> {
    if file_name.is_empty() || file_name.contains('/') || file_name.contains("..") {
        return Err(AppError::BadRequest(format!(
            "Invalid result file name '{file_name}'."
        )));
    }
    let data = app_state.store.get_blob(&result_blob_name(&file_name)).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, DOWNLOAD_MIME_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(e.into()))
}
