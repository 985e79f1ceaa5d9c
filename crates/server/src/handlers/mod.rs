//! # API Route Handlers
//!
//! This module organizes all the Axum route handlers for the
//! `ragstore-server`. The handlers are split into logical sub-modules per
//! resource (e.g., `role_handlers`, `document_handlers`).

// Sub-modules for different handler categories.
pub mod admin_handlers;
pub mod auth_handlers;
pub mod department_handlers;
pub mod document_handlers;
pub mod general;
pub mod knowledge_base_handlers;
pub mod permission_handlers;
pub mod role_assignment_handlers;
pub mod role_handlers;
pub mod role_permission_handlers;

// Re-export all handlers from the sub-modules to make them easily accessible
// to the router under a single `handlers::` path.
pub use admin_handlers::*;
pub use auth_handlers::*;
pub use department_handlers::*;
pub use document_handlers::*;
pub use general::*;
pub use knowledge_base_handlers::*;
pub use permission_handlers::*;
pub use role_assignment_handlers::*;
pub use role_handlers::*;
pub use role_permission_handlers::*;

use axum::{extract::Query, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize, Default)]
pub struct DebugParams {
    pub debug: Option<bool>,
}

/// The standard envelope for resource read responses, optionally carrying
/// debug information when `?debug=true` is requested.
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
    pub result: T,
}

/// A simple message body for operations without a resource result.
#[derive(Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// A shared helper function to wrap a successful result in the standard
/// `ApiResponse` format, optionally including debug information if requested.
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
