//! # API Route Handlers
//!
//! The handlers are split by concern: `general` (banner, health, folder
//! listing), `schema` (schema generation) and `extract` (extraction runs and
//! result downloads).

pub mod extract;
pub mod general;
pub mod schema;

pub use extract::*;
pub use general::*;
pub use schema::*;

// Shared items used by multiple handler modules.
use super::{
    errors::AppError,
    state::AppState,
    types::{ApiResponse, DebugParams},
};
use axum::{extract::Query, Json};
use serde_json::Value;

/// Wraps a successful result in the standard `ApiResponse` format, including
/// debug information only when `?debug=true` was requested.
pub(crate) fn wrap_response<T>(
    result: T,
    debug_params: Query<DebugParams>,
    debug_info: Option<Value>,
) -> Json<ApiResponse<T>> {
    let debug = if debug_params.debug.unwrap_or(false) {
        debug_info
    } else {
        None
    };
    Json(ApiResponse { debug, result })
}
