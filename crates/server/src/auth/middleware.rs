//! # Authentication Middleware
//!
//! This module provides the Axum middleware for handling JWT-based
//! authentication. It defines an `AuthenticatedUser` extractor that handlers
//! use to require a valid caller identity.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use core_access::{get_user, CoreAccessError, User};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, warn};

use crate::state::AppState;

/// Represents the claims we expect to find in the JWT.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The subject of the token: the user's database id.
    pub sub: String,
    /// The expiration timestamp.
    pub exp: usize,
}

/// An Axum extractor that provides the currently authenticated user.
///
/// 1. **No token present**: rejects with `401 Unauthorized`.
/// 2. **Invalid/expired token present**: rejects with `401 Unauthorized`.
/// 3. **Valid token present**: resolves the subject to a `User` row. A
///    subject that no longer exists is treated like an invalid token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// A custom rejection type for authentication failures.
///
/// This allows the `FromRequestParts` implementations to return a specific
/// HTTP status code and error message, which Axum then turns into a response.
pub struct AuthError(pub StatusCode, pub String);

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer_header =
            Option::<TypedHeader<Authorization<Bearer>>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    warn!("Unexpected error during header extraction: {}", e);
                    AuthError(
                        StatusCode::BAD_REQUEST,
                        "Invalid Authorization header format.".to_string(),
                    )
                })?;

        let Some(TypedHeader(Authorization(bearer))) = bearer_header else {
            return Err(AuthError(
                StatusCode::UNAUTHORIZED,
                "Missing authentication token.".to_string(),
            ));
        };

        let token_data = decode::<Claims>(
            bearer.token(),
            &DecodingKey::from_secret(state.config.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|e| {
            warn!("JWT validation failed: {}", e);
            AuthError(
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token.".to_string(),
            )
        })?;

        // The `jsonwebtoken` validation allows a leeway window around `exp`;
        // enforce the embedded timestamp exactly.
        let current_timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| {
                AuthError(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "System time is before UNIX EPOCH.".to_string(),
                )
            })?
            .as_secs();

        if token_data.claims.exp < current_timestamp as usize {
            warn!(
                "Token has expired. exp: {}, current: {}",
                token_data.claims.exp, current_timestamp
            );
            return Err(AuthError(
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token.".to_string(),
            ));
        }

        let user_id: i64 = token_data.claims.sub.parse().map_err(|_| {
            warn!("Token subject is not a valid user id.");
            AuthError(
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token.".to_string(),
            )
        })?;

        let user = get_user(&state.sqlite_provider.db, user_id)
            .await
            .map_err(|e| match e {
                CoreAccessError::NotFound(_) => {
                    warn!(user_id, "Token subject does not resolve to a user.");
                    AuthError(
                        StatusCode::UNAUTHORIZED,
                        "Invalid or expired token.".to_string(),
                    )
                }
                other => {
                    error!("Failed to load user for token subject: {other}");
                    AuthError(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Could not retrieve user.".to_string(),
                    )
                }
            })?;

        Ok(AuthenticatedUser(user))
    }
}
