//! # Role-Permission Binding Handlers

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
use core_access::{bind_permissions, list_role_permissions, Permission};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

#[derive(Deserialize)]
pub struct RolePermissionAssignRequest {
    pub role_id: i64,
    pub permission_ids: Vec<i64>,
}

#[derive(Serialize, Deserialize)]
pub struct RolePermissionAssignResponse {
    pub message: String,
    /// The number of bindings actually created. Unknown permission ids and
    /// already-bound ids do not count.
    pub newly_bound: u64,
}

/// Attaches a batch of permissions to a role.
///
/// Best-effort: unknown permission ids are skipped and duplicates are
/// deduplicated rather than failing the batch.
pub async fn assign_role_permissions_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<RolePermissionAssignRequest>,
) -> Result<Json<RolePermissionAssignResponse>, AppError> {
    let newly_bound = bind_permissions(
        &app_state.sqlite_provider.db,
        payload.role_id,
        &payload.permission_ids,
    )
    .await?;

    info!(
        admin_id = admin.0.id,
        role_id = payload.role_id,
        newly_bound,
        "Assigned permissions to role."
    );
    Ok(Json(RolePermissionAssignResponse {
        message: "Permissions assigned".to_string(),
        newly_bound,
    }))
}

/// Lists the permissions bound to a role.
pub async fn list_role_permissions_handler(
    State(app_state): State<AppState>,
    _admin: AdminUser,
    Path(role_id): Path<i64>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<Permission>>>, AppError> {
    let permissions = list_role_permissions(&app_state.sqlite_provider.db, role_id).await?;
    let debug_info = json!({ "role_id": role_id, "permission_count": permissions.len() });
    Ok(wrap_response(permissions, debug_params, Some(debug_info)))
}
