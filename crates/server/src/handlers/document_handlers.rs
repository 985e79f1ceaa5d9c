//! # Document Route Handlers
//!
//! Upload and CRUD for documents.
//!
//! **Authorization**: access is scoped. Administrators see and mutate every
//! document; other callers only documents whose knowledge base they hold a
//! role assignment in. Out-of-scope document ids read as absent so their
//! existence is not revealed.

use crate::{
    auth::middleware::AuthenticatedUser,
    errors::AppError,
    handlers::{wrap_response, ApiResponse, DebugParams},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Multipart;
use core_access::{user_knowledge_base_ids, user_role_names, ADMIN_ROLES};
use ragstore::{
    ingest::{ingest_document, FileType},
    store::documents::{self, Document, DocumentUpdate},
};
use serde_json::json;
use tracing::info;

/// The caller's document scope: `None` means unrestricted (administrator),
/// otherwise the set of knowledge base ids the caller holds a role in.
async fn caller_scope(app_state: &AppState, user_id: i64) -> Result<Option<Vec<i64>>, AppError> {
    let db = &app_state.sqlite_provider.db;
    let roles = user_role_names(db, user_id).await?;
    if roles.iter().any(|r| ADMIN_ROLES.contains(&r.as_str())) {
        return Ok(None);
    }
    Ok(Some(user_knowledge_base_ids(db, user_id).await?))
}

/// Handler for uploading a document into a knowledge base.
///
/// Expects a multipart form with a `knowledge_base_id` field and a `file`
/// field. The filetype is inferred from the filename extension and must be
/// on the allow-list.
pub async fn create_document_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Document>), AppError> {
    let mut knowledge_base_id: Option<i64> = None;
    let mut filename: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(anyhow::Error::from)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                filename = Some(field.file_name().unwrap_or("uploaded_file").to_string());
                data = Some(field.bytes().await.map_err(anyhow::Error::from)?.to_vec());
            }
            "knowledge_base_id" => {
                let text = field.text().await.map_err(anyhow::Error::from)?;
                knowledge_base_id = Some(text.trim().parse().map_err(|_| {
                    AppError::BadRequest("'knowledge_base_id' must be an integer.".to_string())
                })?);
            }
            _ => {}
        }
    }

    let knowledge_base_id = knowledge_base_id.ok_or_else(|| {
        AppError::BadRequest("'knowledge_base_id' field is required.".to_string())
    })?;
    let filename =
        filename.ok_or_else(|| AppError::BadRequest("'file' field is required.".to_string()))?;
    let data =
        data.ok_or_else(|| AppError::BadRequest("File data not found in request.".to_string()))?;

    if let Some(allowed) = caller_scope(&app_state, user.0.id).await? {
        if !allowed.contains(&knowledge_base_id) {
            return Err(AppError::Forbidden("Not authorized.".to_string()));
        }
    }

    let document = ingest_document(
        &app_state.sqlite_provider.db,
        knowledge_base_id,
        &filename,
        &data,
    )
    .await?;

    info!(
        user_id = user.0.id,
        document_id = document.id,
        "Uploaded document '{filename}'."
    );
    Ok((StatusCode::CREATED, Json(document)))
}

/// Handler for retrieving the list of documents visible to the caller.
pub async fn list_documents_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<Document>>>, AppError> {
    let db = &app_state.sqlite_provider.db;
    let documents = match caller_scope(&app_state, user.0.id).await? {
        None => documents::list_documents(db).await?,
        Some(kb_ids) => documents::list_documents_for_knowledge_bases(db, &kb_ids).await?,
    };

    let debug_info =
        json!({ "requesting_user_id": user.0.id, "document_count": documents.len() });
    Ok(wrap_response(documents, debug_params, Some(debug_info)))
}

pub async fn get_document_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(doc_id): Path<i64>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    let document = fetch_in_scope(&app_state, &user, doc_id).await?;
    Ok(wrap_response(document, debug_params, None))
}

pub async fn update_document_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(doc_id): Path<i64>,
    Json(payload): Json<DocumentUpdate>,
) -> Result<Json<Document>, AppError> {
    if let Some(filetype) = &payload.filetype {
        if FileType::from_tag(filetype).is_none() {
            return Err(AppError::BadRequest(format!(
                "Unsupported filetype '{filetype}'. Only 'md' and 'csv' are supported."
            )));
        }
    }

    fetch_in_scope(&app_state, &user, doc_id).await?;
    let document =
        documents::update_document(&app_state.sqlite_provider.db, doc_id, &payload).await?;
    info!(user_id = user.0.id, doc_id, "Updated document.");
    Ok(Json(document))
}

pub async fn delete_document_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(doc_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    fetch_in_scope(&app_state, &user, doc_id).await?;
    documents::delete_document(&app_state.sqlite_provider.db, doc_id).await?;
    info!(user_id = user.0.id, doc_id, "Deleted document.");
    Ok(StatusCode::NO_CONTENT)
}

/// Loads a document and verifies it falls within the caller's scope.
/// Documents outside the scope read as absent.
async fn fetch_in_scope(
    app_state: &AppState,
    user: &AuthenticatedUser,
    doc_id: i64,
) -> Result<Document, AppError> {
    let document = documents::get_document(&app_state.sqlite_provider.db, doc_id).await?;
    if let Some(allowed) = caller_scope(app_state, user.0.id).await? {
        if !allowed.contains(&document.knowledge_base_id) {
            return Err(AppError::NotFound("Document not found.".to_string()));
        }
    }
    Ok(document)
}
