//! User identity: registration, authentication, and lookups.

use crate::{
    assignments,
    password::{hash_password, verify_password},
    parse_timestamp, CoreAccessError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use turso::{params, Connection, Database, Row};

/// Represents a user in the system. The password hash never leaves the
/// storage layer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, username, email, created_at";

impl TryFrom<&Row> for User {
    type Error = CoreAccessError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let created_at_str: String = row.get(3)?;
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            created_at: parse_timestamp(&created_at_str)?,
        })
    }
}

/// Creates a new user and binds them to the default role within the
/// default knowledge base.
///
/// A taken username or email is a conflict. A missing default role or
/// knowledge base is a configuration error, not a user-facing validation
/// error.
pub async fn register_user(
    db: &Database,
    username: &str,
    email: &str,
    password: &str,
    default_role: &str,
    default_kb: &str,
) -> Result<User, CoreAccessError> {
    let conn = db.connect()?;

    let mut rows = conn
        .query("SELECT 1 FROM users WHERE username = ?", params![username])
        .await?;
    if rows.next().await?.is_some() {
        return Err(CoreAccessError::Conflict(format!(
            "Username '{username}' is already taken."
        )));
    }

    let mut rows = conn
        .query("SELECT 1 FROM users WHERE email = ?", params![email])
        .await?;
    if rows.next().await?.is_some() {
        return Err(CoreAccessError::Conflict(format!(
            "Email '{email}' is already registered."
        )));
    }

    // Resolve the default grant before creating the user so a misconfigured
    // deployment fails without leaving a partial account behind.
    let role_id = find_role_id_by_name(&conn, default_role).await?.ok_or_else(|| {
        CoreAccessError::MissingSeedData(format!("default role '{default_role}'"))
    })?;
    let kb_id = find_knowledge_base_id_by_name(&conn, default_kb)
        .await?
        .ok_or_else(|| {
            CoreAccessError::MissingSeedData(format!("default knowledge base '{default_kb}'"))
        })?;

    let password_hash = hash_password(password)?;
    conn.execute(
        "INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)",
        params![username, email, password_hash],
    )
    .await?;

    let mut rows = conn
        .query(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"),
            params![username],
        )
        .await?;
    let row = rows.next().await?.ok_or_else(|| {
        CoreAccessError::DataIntegrity(format!("User '{username}' vanished after insert"))
    })?;
    let user = User::try_from(&row)?;

    assignments::assign_role(db, user.id, kb_id, role_id).await?;
    info!(
        user_id = user.id,
        role_id,
        knowledge_base_id = kb_id,
        "Registered user '{username}' with the default grant."
    );

    Ok(user)
}

/// Verifies a username/password pair.
///
/// Unknown usernames and wrong passwords produce the same
/// `InvalidCredentials` outcome so callers cannot probe for accounts.
pub async fn authenticate_user(
    db: &Database,
    username: &str,
    password: &str,
) -> Result<User, CoreAccessError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = ?"),
            params![username],
        )
        .await?;

    let Some(row) = rows.next().await? else {
        warn!("Login attempt for unknown username.");
        return Err(CoreAccessError::InvalidCredentials);
    };

    let stored_hash: String = row.get(4)?;
    if !verify_password(password, &stored_hash) {
        warn!("Invalid password for user '{username}'.");
        return Err(CoreAccessError::InvalidCredentials);
    }

    User::try_from(&row)
}

pub async fn get_user(db: &Database, user_id: i64) -> Result<User, CoreAccessError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
            params![user_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => User::try_from(&row),
        None => Err(CoreAccessError::NotFound("User")),
    }
}

pub async fn list_users(db: &Database) -> Result<Vec<User>, CoreAccessError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"),
            (),
        )
        .await?;

    let mut users = Vec::new();
    while let Some(row) = rows.next().await? {
        users.push(User::try_from(&row)?);
    }
    Ok(users)
}

async fn find_role_id_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<i64>, CoreAccessError> {
    let mut rows = conn
        .query("SELECT id FROM roles WHERE name = ?", params![name])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

async fn find_knowledge_base_id_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<i64>, CoreAccessError> {
    let mut rows = conn
        .query("SELECT id FROM knowledge_bases WHERE name = ?", params![name])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}
