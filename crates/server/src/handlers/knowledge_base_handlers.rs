//! # Knowledge Base Route Handlers
//!
//! Reads require authentication; mutations require an administrative role.
//! Deleting a knowledge base also deletes the documents it contains.

use crate::{
    auth::{guards::AdminUser, middleware::AuthenticatedUser},
    errors::AppError,
    handlers::{wrap_response, ApiResponse, DebugParams},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use ragstore::store::knowledge_bases::{
    create_knowledge_base, delete_knowledge_base, get_knowledge_base, list_knowledge_bases,
    update_knowledge_base, KnowledgeBase, KnowledgeBaseUpdate,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Deserialize)]
pub struct KnowledgeBaseCreateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn create_knowledge_base_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<KnowledgeBaseCreateRequest>,
) -> Result<(StatusCode, Json<KnowledgeBase>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Knowledge base name is required.".to_string(),
        ));
    }

    let knowledge_base = create_knowledge_base(
        &app_state.sqlite_provider.db,
        payload.name.trim(),
        payload.description.as_deref(),
    )
    .await?;

    info!(
        admin_id = admin.0.id,
        kb_id = knowledge_base.id,
        "Created knowledge base '{}'.",
        knowledge_base.name
    );
    Ok((StatusCode::CREATED, Json(knowledge_base)))
}

pub async fn list_knowledge_bases_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<KnowledgeBase>>>, AppError> {
    let knowledge_bases = list_knowledge_bases(&app_state.sqlite_provider.db).await?;
    let debug_info = json!({
        "requesting_user_id": user.0.id,
        "knowledge_base_count": knowledge_bases.len(),
    });
    Ok(wrap_response(knowledge_bases, debug_params, Some(debug_info)))
}

pub async fn get_knowledge_base_handler(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(kb_id): Path<i64>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<KnowledgeBase>>, AppError> {
    let knowledge_base = get_knowledge_base(&app_state.sqlite_provider.db, kb_id).await?;
    Ok(wrap_response(knowledge_base, debug_params, None))
}

pub async fn update_knowledge_base_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Path(kb_id): Path<i64>,
    Json(payload): Json<KnowledgeBaseUpdate>,
) -> Result<Json<KnowledgeBase>, AppError> {
    let knowledge_base =
        update_knowledge_base(&app_state.sqlite_provider.db, kb_id, &payload).await?;
    info!(
        admin_id = admin.0.id,
        kb_id, "Updated knowledge base '{}'.", knowledge_base.name
    );
    Ok(Json(knowledge_base))
}

/// Deletes a knowledge base and, with it, every document it contains.
pub async fn delete_knowledge_base_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Path(kb_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    delete_knowledge_base(&app_state.sqlite_provider.db, kb_id).await?;
    info!(admin_id = admin.0.id, kb_id, "Deleted knowledge base.");
    Ok(StatusCode::NO_CONTENT)
}
