//! # Role Assignment Handlers
//!
//! Granting and revoking a user's role within a knowledge base.

use crate::{auth::guards::AdminUser, errors::AppError, handlers::MessageResponse, state::AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use core_access::{assign_role, remove_assignment};
use serde::Deserialize;
use tracing::info;

#[derive(Deserialize)]
pub struct RoleAssignRequest {
    pub user_id: i64,
    pub knowledge_base_id: i64,
    pub role_id: i64,
}

#[derive(Deserialize)]
pub struct RoleAssignmentDeleteParams {
    pub user_id: i64,
    pub knowledge_base_id: i64,
}

/// Grants a role to a user within a knowledge base.
///
/// Idempotent per (user, knowledge base): a second assignment overwrites
/// the existing row's role instead of inserting a duplicate.
pub async fn assign_role_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<RoleAssignRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    assign_role(
        &app_state.sqlite_provider.db,
        payload.user_id,
        payload.knowledge_base_id,
        payload.role_id,
    )
    .await?;

    info!(
        admin_id = admin.0.id,
        user_id = payload.user_id,
        knowledge_base_id = payload.knowledge_base_id,
        role_id = payload.role_id,
        "Assigned role."
    );
    Ok(Json(MessageResponse {
        message: "Role assigned successfully".to_string(),
    }))
}

/// Removes a user's role assignment within a knowledge base.
pub async fn delete_role_assignment_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Query(params): Query<RoleAssignmentDeleteParams>,
) -> Result<StatusCode, AppError> {
    remove_assignment(
        &app_state.sqlite_provider.db,
        params.user_id,
        params.knowledge_base_id,
    )
    .await?;

    info!(
        admin_id = admin.0.id,
        user_id = params.user_id,
        knowledge_base_id = params.knowledge_base_id,
        "Removed role assignment."
    );
    Ok(StatusCode::NO_CONTENT)
}
