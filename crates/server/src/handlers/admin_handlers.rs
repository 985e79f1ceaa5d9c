//! # Admin Route Handlers
//!
//! This module contains handlers for endpoints that require an
//! administrative role.

use crate::{
    auth::guards::AdminUser,
    errors::AppError,
    handlers::{wrap_response, ApiResponse, DebugParams},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use core_access::{get_user, list_users, User};
use serde_json::json;
use tracing::info;

/// Handler for retrieving a list of all users.
pub async fn get_users_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    info!(admin_id = admin.0.id, "Listing all users.");

    let users = list_users(&app_state.sqlite_provider.db).await?;

    let debug_info = json!({ "requesting_user_id": admin.0.id, "user_count": users.len() });
    Ok(wrap_response(users, debug_params, Some(debug_info)))
}

/// Handler for retrieving a single user by id.
pub async fn get_user_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<i64>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = get_user(&app_state.sqlite_provider.db, user_id).await?;
    Ok(wrap_response(user, debug_params, None))
}
