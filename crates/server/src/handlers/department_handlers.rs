//! # Department Route Handlers
//!
//! Departments are a standalone organizational entity outside the
//! role/permission graph. Reads require authentication; creation requires
//! an administrative role.

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
use ragstore::store::departments::{
    create_department, get_department, list_departments, Department,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Deserialize)]
pub struct DepartmentCreateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn create_department_handler(
    State(app_state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<DepartmentCreateRequest>,
) -> Result<(StatusCode, Json<Department>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Department name is required.".to_string(),
        ));
    }

    let department = create_department(
        &app_state.sqlite_provider.db,
        payload.name.trim(),
        payload.description.as_deref(),
    )
    .await?;

    info!(
        admin_id = admin.0.id,
        department_id = department.id,
        "Created department '{}'.",
        department.name
    );
    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn list_departments_handler(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Vec<Department>>>, AppError> {
    let departments = list_departments(&app_state.sqlite_provider.db).await?;
    let debug_info = json!({ "department_count": departments.len() });
    Ok(wrap_response(departments, debug_params, Some(debug_info)))
}

pub async fn get_department_handler(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(department_id): Path<i64>,
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Department>>, AppError> {
    let department = get_department(&app_state.sqlite_provider.db, department_id).await?;
    Ok(wrap_response(department, debug_params, None))
}
