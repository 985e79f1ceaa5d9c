//! Permission CRUD and role-permission bindings.

use crate::CoreAccessError;
use serde::{Deserialize, Serialize};
use tracing::warn;
use turso::{params, Database, Row};

/// An atomic capability code, granted to roles via bindings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Permission {
    pub id: i64,
    pub code: String,
    pub display_name: String,
    pub description: Option<String>,
}

/// A partial update. Fields left as `None` keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct PermissionUpdate {
    pub code: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

const PERMISSION_COLUMNS: &str = "id, code, display_name, description";

impl TryFrom<&Row> for Permission {
    type Error = CoreAccessError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Permission {
            id: row.get(0)?,
            code: row.get(1)?,
            display_name: row.get(2)?,
            description: match row.get_value(3)? {
                turso::Value::Text(s) => Some(s),
                _ => None,
            },
        })
    }
}

pub async fn create_permission(
    db: &Database,
    code: &str,
    display_name: &str,
    description: Option<&str>,
) -> Result<Permission, CoreAccessError> {
    let conn = db.connect()?;

    let mut existing = conn
        .query("SELECT 1 FROM permissions WHERE code = ?", params![code])
        .await?;
    if existing.next().await?.is_some() {
        return Err(CoreAccessError::Conflict(format!(
            "A permission with code '{code}' already exists."
        )));
    }

    let description_value = match description {
        Some(d) => turso::Value::Text(d.to_string()),
        None => turso::Value::Null,
    };
    conn.execute(
        "INSERT INTO permissions (code, display_name, description) VALUES (?, ?, ?)",
        vec![
            turso::Value::Text(code.to_string()),
            turso::Value::Text(display_name.to_string()),
            description_value,
        ],
    )
    .await?;

    let mut rows = conn
        .query(
            &format!("SELECT {PERMISSION_COLUMNS} FROM permissions WHERE code = ?"),
            params![code],
        )
        .await?;
    let row = rows.next().await?.ok_or_else(|| {
        CoreAccessError::DataIntegrity(format!("Permission '{code}' vanished after insert"))
    })?;
    Permission::try_from(&row)
}

pub async fn list_permissions(db: &Database) -> Result<Vec<Permission>, CoreAccessError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {PERMISSION_COLUMNS} FROM permissions ORDER BY id"),
            (),
        )
        .await?;

    let mut permissions = Vec::new();
    while let Some(row) = rows.next().await? {
        permissions.push(Permission::try_from(&row)?);
    }
    Ok(permissions)
}

pub async fn get_permission(
    db: &Database,
    permission_id: i64,
) -> Result<Permission, CoreAccessError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {PERMISSION_COLUMNS} FROM permissions WHERE id = ?"),
            params![permission_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Permission::try_from(&row),
        None => Err(CoreAccessError::NotFound("Permission")),
    }
}

pub async fn update_permission(
    db: &Database,
    permission_id: i64,
    update: &PermissionUpdate,
) -> Result<Permission, CoreAccessError> {
    let conn = db.connect()?;

    let mut assignments: Vec<&str> = Vec::new();
    let mut query_params: Vec<turso::Value> = Vec::new();

    if let Some(code) = &update.code {
        let mut existing = conn
            .query(
                "SELECT 1 FROM permissions WHERE code = ? AND id != ?",
                params![code.as_str(), permission_id],
            )
            .await?;
        if existing.next().await?.is_some() {
            return Err(CoreAccessError::Conflict(format!(
                "A permission with code '{code}' already exists."
            )));
        }
        assignments.push("code = ?");
        query_params.push(turso::Value::Text(code.clone()));
    }
    if let Some(display_name) = &update.display_name {
        assignments.push("display_name = ?");
        query_params.push(turso::Value::Text(display_name.clone()));
    }
    if let Some(description) = &update.description {
        assignments.push("description = ?");
        query_params.push(turso::Value::Text(description.clone()));
    }

    if assignments.is_empty() {
        return get_permission(db, permission_id).await;
    }

    query_params.push(turso::Value::Integer(permission_id));
    let sql = format!(
        "UPDATE permissions SET {} WHERE id = ?",
        assignments.join(", ")
    );
    let changed = conn.execute(&sql, query_params).await?;
    if changed == 0 {
        return Err(CoreAccessError::NotFound("Permission"));
    }

    get_permission(db, permission_id).await
}

pub async fn delete_permission(db: &Database, permission_id: i64) -> Result<(), CoreAccessError> {
    let conn = db.connect()?;
    let removed = conn
        .execute(
            "DELETE FROM permissions WHERE id = ?",
            params![permission_id],
        )
        .await?;
    if removed == 0 {
        return Err(CoreAccessError::NotFound("Permission"));
    }
    Ok(())
}

/// Attaches a batch of permissions to a role.
///
/// Bulk and best-effort: unknown permission ids are skipped rather than
/// aborting the batch, and already-bound ids are deduplicated by the
/// unique (role_id, permission_id) index. Only the role itself must
/// exist. Returns the number of new bindings created.
pub async fn bind_permissions(
    db: &Database,
    role_id: i64,
    permission_ids: &[i64],
) -> Result<u64, CoreAccessError> {
    let conn = db.connect()?;

    let mut rows = conn
        .query("SELECT 1 FROM roles WHERE id = ?", params![role_id])
        .await?;
    if rows.next().await?.is_none() {
        return Err(CoreAccessError::NotFound("Role"));
    }

    let mut newly_bound = 0;
    for &permission_id in permission_ids {
        let mut existing = conn
            .query(
                "SELECT 1 FROM permissions WHERE id = ?",
                params![permission_id],
            )
            .await?;
        if existing.next().await?.is_none() {
            warn!(role_id, permission_id, "Skipping unknown permission id in bulk bind.");
            continue;
        }

        newly_bound += conn
            .execute(
                "INSERT OR IGNORE INTO role_permissions (role_id, permission_id) VALUES (?, ?)",
                params![role_id, permission_id],
            )
            .await?;
    }
    Ok(newly_bound)
}

/// Lists the permissions bound to a role.
pub async fn list_role_permissions(
    db: &Database,
    role_id: i64,
) -> Result<Vec<Permission>, CoreAccessError> {
    let conn = db.connect()?;

    let mut rows = conn
        .query("SELECT 1 FROM roles WHERE id = ?", params![role_id])
        .await?;
    if rows.next().await?.is_none() {
        return Err(CoreAccessError::NotFound("Role"));
    }

    let mut rows = conn
        .query(
            "SELECT p.id, p.code, p.display_name, p.description
             FROM role_permissions rp
             JOIN permissions p ON p.id = rp.permission_id
             WHERE rp.role_id = ?
             ORDER BY p.id",
            params![role_id],
        )
        .await?;

    let mut permissions = Vec::new();
    while let Some(row) = rows.next().await? {
        permissions.push(Permission::try_from(&row)?);
    }
    Ok(permissions)
}
