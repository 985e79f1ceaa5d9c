//! # Permission Route Handlers
//!
//! Permission CRUD, restricted to administrative callers.

use crate::{
    auth::guards::AdminUser,
    errors::AppError,
    handlers::{wrap_response, ApiResponse, DebugParams},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use core_access::{
    create_permission, delete_permission, get_permission, list_permissions, update_permission,
    Permission, PermissionUpdate,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Deserialize)]
pub struct PermissionCreateRequest {
    pub code: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn create_permission_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<PermissionCreateRequest>,
) -> Result<(StatusCode, Json<Permission>), AppError> {
    if payload.code.trim().is_empty() || payload.display_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Permission code and display name are required.".to_string(),
        ));
    }

    let permission = create_permission(
        &app_state.sqlite_provider.db,
        payload.code.trim(),
        payload.display_name.trim(),
        payload.description.as_deref(),
    )
    .await?;

    info!(
        admin_id = admin.0.id,
        permission_id = permission.id,
        "Created permission '{}'.",
        permission.code
    );
    Ok((StatusCode::CREATED, Json(permission)))
}

pub async fn list_permissions_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<Permission>>>, AppError> {
    let permissions = list_permissions(&app_state.sqlite_provider.db).await?;
    let debug_info = json!({ "permission_count": permissions.len() });
    Ok(wrap_response(permissions, debug_params, Some(debug_info)))
}

pub async fn get_permission_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(permission_id): Path<i64>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Permission>>, AppError> {
    let permission = get_permission(&app_state.sqlite_provider.db, permission_id).await?;
    Ok(wrap_response(permission, debug_params, None))
}

pub async fn update_permission_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Path(permission_id): Path<i64>,
    Json(payload): Json<PermissionUpdate>,
) -> Result<Json<Permission>, AppError> {
    let permission =
        update_permission(&app_state.sqlite_provider.db, permission_id, &payload).await?;
    info!(
        admin_id = admin.0.id,
        permission_id, "Updated permission '{}'.", permission.code
    );
    Ok(Json(permission))
}

pub async fn delete_permission_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Path(permission_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_permission(&app_state.sqlite_provider.db, permission_id).await?;
    info!(admin_id = admin.0.id, permission_id, "Deleted permission.");
    Ok(StatusCode::NO_CONTENT)
}
