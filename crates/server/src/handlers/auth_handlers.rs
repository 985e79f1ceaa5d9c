//! # Authentication Route Handlers
//!
//! Registration, login, and the caller's own identity and assignment views.

use crate::{
    auth::{middleware::AuthenticatedUser, token::create_token},
    errors::AppError,
    state::AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use core_access::{authenticate_user, list_role_assignments, register_user, RoleAssignment, User};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The response body for a successful login.
#[derive(Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Creates a new user, bound to the default role within the default
/// knowledge base.
pub async fn register_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    if payload.username.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(AppError::BadRequest(
            "Username, email and password are required.".to_string(),
        ));
    }

    let user = register_user(
        &app_state.sqlite_provider.db,
        payload.username.trim(),
        payload.email.trim(),
        &payload.password,
        &app_state.config.default_role,
        &app_state.config.default_knowledge_base,
    )
    .await?;

    info!(user_id = user.id, "Registered new user '{}'.", user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchanges a username/password pair for a bearer token.
pub async fn login_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = authenticate_user(
        &app_state.sqlite_provider.db,
        &payload.username,
        &payload.password,
    )
    .await?;

    let access_token = create_token(
        user.id,
        &app_state.config.jwt_secret,
        app_state.config.token_expiry_secs,
    )?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Returns the details of the currently authenticated user.
pub async fn get_me_handler(user: AuthenticatedUser) -> Result<Json<User>, AppError> {
    Ok(Json(user.0))
}

/// Lists the caller's role assignments across all knowledge bases.
pub async fn get_my_roles_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<RoleAssignment>>, AppError> {
    let assignments = list_role_assignments(&app_state.sqlite_provider.db, user.0.id).await?;
    Ok(Json(assignments))
}
