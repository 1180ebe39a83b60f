use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docsheet::{PipelineError, PromptError, SchemaError, StorageError};
use docsheet_sheets::SheetError;
use serde_json::json;
use tracing::{error, warn};

/// A custom error type for the server application.
///
/// Each variant is converted into an HTTP response with a JSON body. User input
/// problems are answered with a `warning`, everything else with an `error`.
pub enum AppError {
    /// Errors from schema generation, including the empty-instruction warning.
    Schema(SchemaError),
    /// Errors that aborted an extraction run.
    Pipeline(PipelineError),
    Storage(StorageError),
    Sheet(SheetError),
    /// A malformed request.
    BadRequest(String),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        AppError::Schema(err)
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::Pipeline(err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

impl From<SheetError> for AppError {
    fn from(err: SheetError) -> Self {
        AppError::Sheet(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

const GENERIC_ERROR: &str = "Something went wrong, please contact the site admin.";

fn provider_status(err: &PromptError) -> StatusCode {
    match err {
        PromptError::MissingProvider(_) | PromptError::ReqwestClientBuild(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        PromptError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, key, message) = match self {
            AppError::Schema(SchemaError::EmptyInstruction) => {
                warn!("Rejected schema request with an empty instruction");
                (
                    StatusCode::BAD_REQUEST,
                    "warning",
                    SchemaError::EmptyInstruction.to_string(),
                )
            }
            AppError::Schema(SchemaError::Provider(err)) => {
                error!("Schema generation failed: {:?}", err);
                (provider_status(&err), "error", GENERIC_ERROR.to_string())
            }
            AppError::Schema(err) => {
                error!("Schema generation failed: {:?}", err);
                (StatusCode::BAD_GATEWAY, "error", GENERIC_ERROR.to_string())
            }
            AppError::Pipeline(PipelineError::Provider(err)) => {
                error!("Extraction run failed: {:?}", err);
                (provider_status(&err), "error", err.to_string())
            }
            AppError::Pipeline(PipelineError::Storage(err)) | AppError::Storage(err) => {
                error!("Storage error: {:?}", err);
                match err {
                    StorageError::NotFound(name) => (
                        StatusCode::NOT_FOUND,
                        "error",
                        format!("'{name}' was not found."),
                    ),
                    StorageError::Config(msg) => (StatusCode::BAD_REQUEST, "error", msg),
                    _ => (
                        StatusCode::BAD_GATEWAY,
                        "error",
                        "Blob storage is unavailable.".to_string(),
                    ),
                }
            }
            AppError::Sheet(err) => {
                error!("Spreadsheet serialization failed: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "error",
                    "Failed to write the result spreadsheet.".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "error", msg),
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "error",
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        (status_code, Json(json!({ key: message }))).into_response()
    }
}
