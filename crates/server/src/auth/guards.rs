//! # Authorization Guards
//!
//! Request-scoped guards composed in front of handlers. Each guard runs after
//! authentication and yields either the authorized caller or a typed denial,
//! distinct from the `401` the middleware produces for a missing or invalid
//! token.

use crate::{
    auth::middleware::{AuthError, AuthenticatedUser},
    state::AppState,
};
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use core_access::{require_any_permission, require_any_role, CoreAccessError, User, ADMIN_ROLES};
use tracing::{error, warn};

/// An extractor that requires the caller to hold an administrative role.
///
/// The role check is knowledge-base-agnostic: `admin` or `super_admin`
/// granted in any knowledge base passes this gate.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        require_any_role(&state.sqlite_provider.db, user.id, ADMIN_ROLES)
            .await
            .map_err(|e| deny(e, user.id))?;

        Ok(AdminUser(user))
    }
}

/// Fails with a typed `403` unless the caller holds at least one of the
/// accepted permission codes through any of their roles.
pub async fn assert_permission(
    state: &AppState,
    user: &User,
    accepted: &[&str],
) -> Result<(), AuthError> {
    require_any_permission(&state.sqlite_provider.db, user.id, accepted)
        .await
        .map_err(|e| deny(e, user.id))
}

fn deny(err: CoreAccessError, user_id: i64) -> AuthError {
    match err {
        CoreAccessError::Forbidden => {
            warn!(user_id, "Caller failed an authorization check.");
            AuthError(StatusCode::FORBIDDEN, "Not authorized.".to_string())
        }
        other => {
            error!("Authorization check failed: {other}");
            AuthError(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred.".to_string(),
            )
        }
    }
}
