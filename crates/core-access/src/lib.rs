//! # Core Access Crate
//!
//! This crate is the central authority for all identity, authentication (AuthN),
//! and authorization (AuthZ) logic for the `ragstore` application: users and
//! their credentials, roles, permissions, role-permission bindings, and
//! per-knowledge-base role assignments.

mod assignments;
mod password;
mod permissions;
mod roles;
mod users;

pub use assignments::{
    assign_role, ensure_defaults, list_role_assignments, remove_assignment, require_any_permission,
    require_any_role, user_knowledge_base_ids, user_permission_codes, user_role_names,
    RoleAssignment,
};
pub use password::{hash_password, verify_password};
pub use permissions::{
    bind_permissions, create_permission, delete_permission, get_permission, list_permissions,
    list_role_permissions, update_permission, Permission, PermissionUpdate,
};
pub use roles::{create_role, delete_role, get_role, list_roles, update_role, Role, RoleUpdate};
pub use users::{authenticate_user, get_user, list_users, register_user, User};

use chrono::{DateTime, Utc};
use thiserror::Error;
use turso::Error as TursoError;

/// Role names that grant administrative access anywhere in the system.
pub const ADMIN_ROLES: &[&str] = &["admin", "super_admin"];

#[derive(Error, Debug)]
pub enum CoreAccessError {
    #[error("Database error: {0}")]
    Database(#[from] TursoError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("Invalid username or password.")]
    InvalidCredentials,
    #[error("Not authorized.")]
    Forbidden,
    #[error("Missing seed data: {0}")]
    MissingSeedData(String),
    #[error("Password hashing failed")]
    PasswordHash,
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
}

/// Parses the `CURRENT_TIMESTAMP` text format SQLite stores into a UTC datetime.
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, CoreAccessError> {
    chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
        .map_err(|e| CoreAccessError::DataIntegrity(format!("Failed to parse date '{value}': {e}")))
}
