//! Role CRUD.

use crate::CoreAccessError;
use serde::{Deserialize, Serialize};
use turso::{params, Database, Row};

/// A named bundle of permissions, assignable to a user within a knowledge base.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
}

/// A partial update. Fields left as `None` keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

const ROLE_COLUMNS: &str = "id, name, display_name, description";

impl TryFrom<&Row> for Role {
    type Error = CoreAccessError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Role {
            id: row.get(0)?,
            name: row.get(1)?,
            display_name: row.get(2)?,
            description: match row.get_value(3)? {
                turso::Value::Text(s) => Some(s),
                _ => None,
            },
        })
    }
}

pub async fn create_role(
    db: &Database,
    name: &str,
    display_name: &str,
    description: Option<&str>,
) -> Result<Role, CoreAccessError> {
    let conn = db.connect()?;

    let mut existing = conn
        .query("SELECT 1 FROM roles WHERE name = ?", params![name])
        .await?;
    if existing.next().await?.is_some() {
        return Err(CoreAccessError::Conflict(format!(
            "A role named '{name}' already exists."
        )));
    }

    let description_value = match description {
        Some(d) => turso::Value::Text(d.to_string()),
        None => turso::Value::Null,
    };
    conn.execute(
        "INSERT INTO roles (name, display_name, description) VALUES (?, ?, ?)",
        vec![
            turso::Value::Text(name.to_string()),
            turso::Value::Text(display_name.to_string()),
            description_value,
        ],
    )
    .await?;

    let mut rows = conn
        .query(
            &format!("SELECT {ROLE_COLUMNS} FROM roles WHERE name = ?"),
            params![name],
        )
        .await?;
    let row = rows.next().await?.ok_or_else(|| {
        CoreAccessError::DataIntegrity(format!("Role '{name}' vanished after insert"))
    })?;
    Role::try_from(&row)
}

pub async fn list_roles(db: &Database) -> Result<Vec<Role>, CoreAccessError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(&format!("SELECT {ROLE_COLUMNS} FROM roles ORDER BY id"), ())
        .await?;

    let mut roles = Vec::new();
    while let Some(row) = rows.next().await? {
        roles.push(Role::try_from(&row)?);
    }
    Ok(roles)
}

pub async fn get_role(db: &Database, role_id: i64) -> Result<Role, CoreAccessError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = ?"),
            params![role_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Role::try_from(&row),
        None => Err(CoreAccessError::NotFound("Role")),
    }
}

pub async fn update_role(
    db: &Database,
    role_id: i64,
    update: &RoleUpdate,
) -> Result<Role, CoreAccessError> {
    let conn = db.connect()?;

    let mut assignments: Vec<&str> = Vec::new();
    let mut query_params: Vec<turso::Value> = Vec::new();

    if let Some(name) = &update.name {
        let mut existing = conn
            .query(
                "SELECT 1 FROM roles WHERE name = ? AND id != ?",
                params![name.as_str(), role_id],
            )
            .await?;
        if existing.next().await?.is_some() {
            return Err(CoreAccessError::Conflict(format!(
                "A role named '{name}' already exists."
            )));
        }
        assignments.push("name = ?");
        query_params.push(turso::Value::Text(name.clone()));
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
        return get_role(db, role_id).await;
    }

    query_params.push(turso::Value::Integer(role_id));
    let sql = format!("UPDATE roles SET {} WHERE id = ?", assignments.join(", "));
    let changed = conn.execute(&sql, query_params).await?;
    if changed == 0 {
        return Err(CoreAccessError::NotFound("Role"));
    }

    get_role(db, role_id).await
}

pub async fn delete_role(db: &Database, role_id: i64) -> Result<(), CoreAccessError> {
    let conn = db.connect()?;
    let removed = conn
        .execute("DELETE FROM roles WHERE id = ?", params![role_id])
        .await?;
    if removed == 0 {
        return Err(CoreAccessError::NotFound("Role"));
    }
    Ok(())
}
