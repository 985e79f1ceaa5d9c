//! Per-knowledge-base role assignments and the authorization predicates
//! built on them.

use crate::CoreAccessError;
use serde::{Deserialize, Serialize};
use turso::{params, Database, Row};

/// A user's role within one knowledge base, joined with display metadata.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoleAssignment {
    pub knowledge_base_id: i64,
    pub knowledge_base_name: String,
    pub role_id: i64,
    pub role_name: String,
    pub role_display_name: String,
}

impl TryFrom<&Row> for RoleAssignment {
    type Error = CoreAccessError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(RoleAssignment {
            knowledge_base_id: row.get(0)?,
            knowledge_base_name: row.get(1)?,
            role_id: row.get(2)?,
            role_name: row.get(3)?,
            role_display_name: row.get(4)?,
        })
    }
}

/// Grants `role_id` to `user_id` within `knowledge_base_id`.
///
/// Idempotent per (user, knowledge base): an existing assignment has its
/// role overwritten. The write is a single upsert statement backed by the
/// unique (user_id, knowledge_base_id) index, so concurrent callers
/// cannot create duplicate rows.
pub async fn assign_role(
    db: &Database,
    user_id: i64,
    knowledge_base_id: i64,
    role_id: i64,
) -> Result<(), CoreAccessError> {
    let conn = db.connect()?;

    for (sql, id, entity) in [
        ("SELECT 1 FROM users WHERE id = ?", user_id, "User"),
        (
            "SELECT 1 FROM knowledge_bases WHERE id = ?",
            knowledge_base_id,
            "Knowledge base",
        ),
        ("SELECT 1 FROM roles WHERE id = ?", role_id, "Role"),
    ] {
        let mut rows = conn.query(sql, params![id]).await?;
        if rows.next().await?.is_none() {
            return Err(CoreAccessError::NotFound(entity));
        }
    }

    conn.execute(
        "INSERT INTO knowledge_base_user_roles (user_id, knowledge_base_id, role_id)
         VALUES (?, ?, ?)
         ON CONFLICT (user_id, knowledge_base_id) DO UPDATE SET role_id = excluded.role_id",
        params![user_id, knowledge_base_id, role_id],
    )
    .await?;
    Ok(())
}

/// Removes a user's role assignment within a knowledge base.
pub async fn remove_assignment(
    db: &Database,
    user_id: i64,
    knowledge_base_id: i64,
) -> Result<(), CoreAccessError> {
    let conn = db.connect()?;
    let removed = conn
        .execute(
            "DELETE FROM knowledge_base_user_roles WHERE user_id = ? AND knowledge_base_id = ?",
            params![user_id, knowledge_base_id],
        )
        .await?;
    if removed == 0 {
        return Err(CoreAccessError::NotFound("Role assignment"));
    }
    Ok(())
}

/// Lists a user's role assignments across all knowledge bases.
pub async fn list_role_assignments(
    db: &Database,
    user_id: i64,
) -> Result<Vec<RoleAssignment>, CoreAccessError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            "SELECT kur.knowledge_base_id, kb.name, kur.role_id, r.name, r.display_name
             FROM knowledge_base_user_roles kur
             JOIN knowledge_bases kb ON kb.id = kur.knowledge_base_id
             JOIN roles r ON r.id = kur.role_id
             WHERE kur.user_id = ?
             ORDER BY kur.knowledge_base_id",
            params![user_id],
        )
        .await?;

    let mut assignments = Vec::new();
    while let Some(row) = rows.next().await? {
        assignments.push(RoleAssignment::try_from(&row)?);
    }
    Ok(assignments)
}

/// Role names held by the user across all knowledge bases.
///
/// Deliberately knowledge-base-agnostic: a role granted anywhere counts
/// everywhere a role gate is used.
pub async fn user_role_names(db: &Database, user_id: i64) -> Result<Vec<String>, CoreAccessError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            "SELECT DISTINCT r.name
             FROM knowledge_base_user_roles kur
             JOIN roles r ON r.id = kur.role_id
             WHERE kur.user_id = ?",
            params![user_id],
        )
        .await?;

    let mut names = Vec::new();
    while let Some(row) = rows.next().await? {
        names.push(row.get(0)?);
    }
    Ok(names)
}

/// Permission codes reachable through any role the user holds anywhere.
pub async fn user_permission_codes(
    db: &Database,
    user_id: i64,
) -> Result<Vec<String>, CoreAccessError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            "SELECT DISTINCT p.code
             FROM knowledge_base_user_roles kur
             JOIN role_permissions rp ON rp.role_id = kur.role_id
             JOIN permissions p ON p.id = rp.permission_id
             WHERE kur.user_id = ?",
            params![user_id],
        )
        .await?;

    let mut codes = Vec::new();
    while let Some(row) = rows.next().await? {
        codes.push(row.get(0)?);
    }
    Ok(codes)
}

/// Knowledge base ids the user holds a role assignment in.
pub async fn user_knowledge_base_ids(
    db: &Database,
    user_id: i64,
) -> Result<Vec<i64>, CoreAccessError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            "SELECT DISTINCT knowledge_base_id FROM knowledge_base_user_roles WHERE user_id = ?",
            params![user_id],
        )
        .await?;

    let mut ids = Vec::new();
    while let Some(row) = rows.next().await? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

/// Fails closed unless the user holds at least one of the accepted role names.
pub async fn require_any_role(
    db: &Database,
    user_id: i64,
    accepted: &[&str],
) -> Result<(), CoreAccessError> {
    let held = user_role_names(db, user_id).await?;
    if held.iter().any(|name| accepted.contains(&name.as_str())) {
        Ok(())
    } else {
        Err(CoreAccessError::Forbidden)
    }
}

/// Fails closed unless the user holds at least one of the accepted
/// permission codes through any of their roles.
pub async fn require_any_permission(
    db: &Database,
    user_id: i64,
    accepted: &[&str],
) -> Result<(), CoreAccessError> {
    let held = user_permission_codes(db, user_id).await?;
    if held.iter().any(|code| accepted.contains(&code.as_str())) {
        Ok(())
    } else {
        Err(CoreAccessError::Forbidden)
    }
}

/// Idempotently creates the configured default role and knowledge base so
/// registration has a grant target on a fresh database.
pub async fn ensure_defaults(
    db: &Database,
    default_role: &str,
    default_kb: &str,
) -> Result<(), CoreAccessError> {
    let conn = db.connect()?;
    conn.execute(
        "INSERT OR IGNORE INTO roles (name, display_name) VALUES (?, ?)",
        params![default_role, default_role],
    )
    .await?;
    conn.execute(
        "INSERT OR IGNORE INTO knowledge_bases (name) VALUES (?)",
        params![default_kb],
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        permissions::{bind_permissions, create_permission},
        roles::create_role,
        users::register_user,
    };
    use ragstore::{store::knowledge_bases::create_knowledge_base, SqliteProvider};

    async fn setup() -> (SqliteProvider, i64) {
        let provider = SqliteProvider::new(":memory:").await.unwrap();
        provider.initialize_schema().await.unwrap();
        ensure_defaults(&provider.db, "employee", "general")
            .await
            .unwrap();
        let user = register_user(
            &provider.db,
            "alice",
            "alice@example.com",
            "hunter22",
            "employee",
            "general",
        )
        .await
        .unwrap();
        (provider, user.id)
    }

    async fn count_assignments(db: &turso::Database, user_id: i64, kb_id: i64) -> i64 {
        let conn = db.connect().unwrap();
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM knowledge_base_user_roles WHERE user_id = ? AND knowledge_base_id = ?",
                params![user_id, kb_id],
            )
            .await
            .unwrap();
        rows.next().await.unwrap().unwrap().get(0).unwrap()
    }

    #[tokio::test]
    async fn test_reassignment_overwrites_in_place() {
        let (provider, user_id) = setup().await;
        let db = &provider.db;

        let kb = create_knowledge_base(db, "handbook", None).await.unwrap();
        let viewer = create_role(db, "viewer", "Viewer", None).await.unwrap();
        let editor = create_role(db, "editor", "Editor", None).await.unwrap();

        assign_role(db, user_id, kb.id, viewer.id).await.unwrap();
        assign_role(db, user_id, kb.id, editor.id).await.unwrap();

        // Exactly one row, reflecting the latest role.
        assert_eq!(count_assignments(db, user_id, kb.id).await, 1);
        let assignments = list_role_assignments(db, user_id).await.unwrap();
        let handbook = assignments
            .iter()
            .find(|a| a.knowledge_base_id == kb.id)
            .unwrap();
        assert_eq!(handbook.role_name, "editor");
    }

    #[tokio::test]
    async fn test_assignment_requires_existing_entities() {
        let (provider, user_id) = setup().await;
        let db = &provider.db;
        let kb = create_knowledge_base(db, "handbook", None).await.unwrap();

        let err = assign_role(db, 9999, kb.id, 1).await.unwrap_err();
        assert!(matches!(err, CoreAccessError::NotFound("User")));
        let err = assign_role(db, user_id, 9999, 1).await.unwrap_err();
        assert!(matches!(err, CoreAccessError::NotFound("Knowledge base")));
        let err = assign_role(db, user_id, kb.id, 9999).await.unwrap_err();
        assert!(matches!(err, CoreAccessError::NotFound("Role")));
    }

    #[tokio::test]
    async fn test_remove_assignment() {
        let (provider, user_id) = setup().await;
        let db = &provider.db;

        let kb = create_knowledge_base(db, "handbook", None).await.unwrap();
        let viewer = create_role(db, "viewer", "Viewer", None).await.unwrap();
        assign_role(db, user_id, kb.id, viewer.id).await.unwrap();

        remove_assignment(db, user_id, kb.id).await.unwrap();
        assert_eq!(count_assignments(db, user_id, kb.id).await, 0);

        let err = remove_assignment(db, user_id, kb.id).await.unwrap_err();
        assert!(matches!(err, CoreAccessError::NotFound("Role assignment")));
    }

    #[tokio::test]
    async fn test_role_gate_is_knowledge_base_agnostic() {
        let (provider, user_id) = setup().await;
        let db = &provider.db;

        let err = require_any_role(db, user_id, crate::ADMIN_ROLES)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreAccessError::Forbidden));

        // Granting admin in any knowledge base passes the global gate.
        let kb = create_knowledge_base(db, "side-project", None).await.unwrap();
        let admin = create_role(db, "admin", "Administrator", None).await.unwrap();
        assign_role(db, user_id, kb.id, admin.id).await.unwrap();

        require_any_role(db, user_id, crate::ADMIN_ROLES).await.unwrap();
    }

    #[tokio::test]
    async fn test_permission_gate_follows_role_bindings() {
        let (provider, user_id) = setup().await;
        let db = &provider.db;

        let read = create_permission(db, "kb:read", "Read", None).await.unwrap();

        // The default employee role grants nothing yet.
        let err = require_any_permission(db, user_id, &["kb:read"])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreAccessError::Forbidden));

        // Binding the permission to a role the user holds opens the gate.
        let assignments = list_role_assignments(db, user_id).await.unwrap();
        bind_permissions(db, assignments[0].role_id, &[read.id])
            .await
            .unwrap();

        require_any_permission(db, user_id, &["kb:read"]).await.unwrap();
        let err = require_any_permission(db, user_id, &["kb:admin"])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreAccessError::Forbidden));
    }
}
