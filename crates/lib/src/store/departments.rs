//! Department store operations.
//!
//! Departments are a standalone organizational entity; they are not part
//! of the role/permission graph.

use crate::errors::StoreError;
use serde::{Deserialize, Serialize};
use turso::{params, Database, Row};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl TryFrom<&Row> for Department {
    type Error = StoreError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Department {
            id: row.get(0)?,
            name: row.get(1)?,
            description: match row.get_value(2)? {
                turso::Value::Text(s) => Some(s),
                _ => None,
            },
        })
    }
}

const DEPARTMENT_COLUMNS: &str = "id, name, description";

pub async fn create_department(
    db: &Database,
    name: &str,
    description: Option<&str>,
) -> Result<Department, StoreError> {
    let conn = db.connect()?;

    let mut existing = conn
        .query("SELECT 1 FROM departments WHERE name = ?", params![name])
        .await?;
    if existing.next().await?.is_some() {
        return Err(StoreError::Conflict(format!(
            "A department named '{name}' already exists."
        )));
    }

    let description_value = match description {
        Some(d) => turso::Value::Text(d.to_string()),
        None => turso::Value::Null,
    };
    conn.execute(
        "INSERT INTO departments (name, description) VALUES (?, ?)",
        vec![turso::Value::Text(name.to_string()), description_value],
    )
    .await?;

    let mut rows = conn
        .query(
            &format!("SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE name = ?"),
            params![name],
        )
        .await?;
    let row = rows.next().await?.ok_or_else(|| {
        StoreError::DataIntegrity(format!("Department '{name}' vanished after insert"))
    })?;
    Department::try_from(&row)
}

pub async fn list_departments(db: &Database) -> Result<Vec<Department>, StoreError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {DEPARTMENT_COLUMNS} FROM departments ORDER BY id"),
            (),
        )
        .await?;

    let mut departments = Vec::new();
    while let Some(row) = rows.next().await? {
        departments.push(Department::try_from(&row)?);
    }
    Ok(departments)
}

pub async fn get_department(db: &Database, department_id: i64) -> Result<Department, StoreError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = ?"),
            params![department_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Department::try_from(&row),
        None => Err(StoreError::NotFound("Department")),
    }
}
