//! # Role Route Handlers
//!
//! Role CRUD, restricted to administrative callers.

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
use core_access::{create_role, delete_role, get_role, list_roles, update_role, Role, RoleUpdate};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Deserialize)]
pub struct RoleCreateRequest {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn create_role_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<RoleCreateRequest>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    if payload.name.trim().is_empty() || payload.display_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Role name and display name are required.".to_string(),
        ));
    }

    let role = create_role(
        &app_state.sqlite_provider.db,
        payload.name.trim(),
        payload.display_name.trim(),
        payload.description.as_deref(),
    )
    .await?;

    info!(admin_id = admin.0.id, role_id = role.id, "Created role '{}'.", role.name);
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn list_roles_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<Role>>>, AppError> {
    let roles = list_roles(&app_state.sqlite_provider.db).await?;
    let debug_info = json!({ "role_count": roles.len() });
    Ok(wrap_response(roles, debug_params, Some(debug_info)))
}

pub async fn get_role_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(role_id): Path<i64>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Role>>, AppError> {
    let role = get_role(&app_state.sqlite_provider.db, role_id).await?;
    Ok(wrap_response(role, debug_params, None))
}

pub async fn update_role_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Path(role_id): Path<i64>,
    Json(payload): Json<RoleUpdate>,
) -> Result<Json<Role>, AppError> {
    let role = update_role(&app_state.sqlite_provider.db, role_id, &payload).await?;
    info!(admin_id = admin.0.id, role_id, "Updated role '{}'.", role.name);
    Ok(Json(role))
}

pub async fn delete_role_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Path(role_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_role(&app_state.sqlite_provider.db, role_id).await?;
    info!(admin_id = admin.0.id, role_id, "Deleted role.");
    Ok(StatusCode::NO_CONTENT)
}
