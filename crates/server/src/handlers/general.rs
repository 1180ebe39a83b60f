use super::{wrap_response, ApiResponse, AppError, AppState, DebugParams};
use axum::{
    extract::{Query, State},
    Json,
};
use docsheet::source::DocumentSource;
use serde_json::json;
use tracing::info;

/// The handler for the root (`/`) endpoint.
pub async fn root() -> &'static str {
    "docsheet server is running."
}

/// The handler for the health check (`/health`) endpoint.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Lists the selectable document folders below the configured use-case root.
pub async fn list_folders_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let source = DocumentSource::new(app_state.store.as_ref(), &app_state.config.use_case);
    let folders: Vec<String> = source.list_folders().await?.into_iter().collect();
    info!("Listed {} folder(s)", folders.len());

    let debug_info = json!({
        "store": app_state.store.name(),
        "use_case": app_state.config.use_case,
    });
    Ok(wrap_response(folders, debug_params, Some(debug_info)))
}
