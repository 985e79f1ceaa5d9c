//! Knowledge base store operations.

use super::parse_timestamp;
use crate::errors::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use turso::{params, Database, Row};

/// A named container that groups documents and scopes user role assignments.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KnowledgeBase {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Row> for KnowledgeBase {
    type Error = StoreError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let created_at_str: String = row.get(3)?;
        Ok(KnowledgeBase {
            id: row.get(0)?,
            name: row.get(1)?,
            description: match row.get_value(2)? {
                turso::Value::Text(s) => Some(s),
                _ => None,
            },
            created_at: parse_timestamp(&created_at_str)?,
        })
    }
}

/// A partial update. Fields left as `None` keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct KnowledgeBaseUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

const KB_COLUMNS: &str = "id, name, description, created_at";

pub async fn create_knowledge_base(
    db: &Database,
    name: &str,
    description: Option<&str>,
) -> Result<KnowledgeBase, StoreError> {
    let conn = db.connect()?;

    let mut existing = conn
        .query(
            "SELECT 1 FROM knowledge_bases WHERE name = ?",
            params![name],
        )
        .await?;
    if existing.next().await?.is_some() {
        return Err(StoreError::Conflict(format!(
            "A knowledge base named '{name}' already exists."
        )));
    }

    let description_value = match description {
        Some(d) => turso::Value::Text(d.to_string()),
        None => turso::Value::Null,
    };
    conn.execute(
        "INSERT INTO knowledge_bases (name, description) VALUES (?, ?)",
        vec![turso::Value::Text(name.to_string()), description_value],
    )
    .await?;

    let mut rows = conn
        .query(
            &format!("SELECT {KB_COLUMNS} FROM knowledge_bases WHERE name = ?"),
            params![name],
        )
        .await?;
    let row = rows.next().await?.ok_or_else(|| {
        StoreError::DataIntegrity(format!("Knowledge base '{name}' vanished after insert"))
    })?;
    KnowledgeBase::try_from(&row)
}

pub async fn list_knowledge_bases(db: &Database) -> Result<Vec<KnowledgeBase>, StoreError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {KB_COLUMNS} FROM knowledge_bases ORDER BY id"),
            (),
        )
        .await?;

    let mut knowledge_bases = Vec::new();
    while let Some(row) = rows.next().await? {
        knowledge_bases.push(KnowledgeBase::try_from(&row)?);
    }
    Ok(knowledge_bases)
}

pub async fn get_knowledge_base(db: &Database, kb_id: i64) -> Result<KnowledgeBase, StoreError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {KB_COLUMNS} FROM knowledge_bases WHERE id = ?"),
            params![kb_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => KnowledgeBase::try_from(&row),
        None => Err(StoreError::NotFound("Knowledge base")),
    }
}

pub async fn update_knowledge_base(
    db: &Database,
    kb_id: i64,
    update: &KnowledgeBaseUpdate,
) -> Result<KnowledgeBase, StoreError> {
    let conn = db.connect()?;

    let mut assignments: Vec<&str> = Vec::new();
    let mut query_params: Vec<turso::Value> = Vec::new();

    if let Some(name) = &update.name {
        // Renaming onto another knowledge base's name is a conflict;
        // renaming onto the current name is a no-op.
        let mut existing = conn
            .query(
                "SELECT 1 FROM knowledge_bases WHERE name = ? AND id != ?",
                params![name.as_str(), kb_id],
            )
            .await?;
        if existing.next().await?.is_some() {
            return Err(StoreError::Conflict(format!(
                "A knowledge base named '{name}' already exists."
            )));
        }
        assignments.push("name = ?");
        query_params.push(turso::Value::Text(name.clone()));
    }
    if let Some(description) = &update.description {
        assignments.push("description = ?");
        query_params.push(turso::Value::Text(description.clone()));
    }

    if assignments.is_empty() {
        return get_knowledge_base(db, kb_id).await;
    }

    query_params.push(turso::Value::Integer(kb_id));
    let sql = format!(
        "UPDATE knowledge_bases SET {} WHERE id = ?",
        assignments.join(", ")
    );
    let changed = conn.execute(&sql, query_params).await?;
    if changed == 0 {
        return Err(StoreError::NotFound("Knowledge base"));
    }

    get_knowledge_base(db, kb_id).await
}

/// Deletes a knowledge base together with every document it contains.
pub async fn delete_knowledge_base(db: &Database, kb_id: i64) -> Result<(), StoreError> {
    let conn = db.connect()?;

    let mut rows = conn
        .query(
            "SELECT 1 FROM knowledge_bases WHERE id = ?",
            params![kb_id],
        )
        .await?;
    if rows.next().await?.is_none() {
        return Err(StoreError::NotFound("Knowledge base"));
    }

    // Documents go first so the container row never points at orphans.
    let removed_documents = conn
        .execute(
            "DELETE FROM documents WHERE knowledge_base_id = ?",
            params![kb_id],
        )
        .await?;
    conn.execute("DELETE FROM knowledge_bases WHERE id = ?", params![kb_id])
        .await?;

    info!(kb_id, removed_documents, "Deleted knowledge base and its documents.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::documents;
    use crate::SqliteProvider;

    #[tokio::test]
    async fn test_duplicate_name_is_a_conflict() {
        let provider = SqliteProvider::new(":memory:").await.unwrap();
        provider.initialize_schema().await.unwrap();
        let db = &provider.db;

        create_knowledge_base(db, "general", None).await.unwrap();
        let err = create_knowledge_base(db, "general", Some("again"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_documents() {
        let provider = SqliteProvider::new(":memory:").await.unwrap();
        provider.initialize_schema().await.unwrap();
        let db = &provider.db;

        let kb = create_knowledge_base(db, "handbook", None).await.unwrap();
        let other = create_knowledge_base(db, "other", None).await.unwrap();
        let doc = documents::insert_document(db, kb.id, "intro.md", "md", "# Intro")
            .await
            .unwrap();
        documents::insert_document(db, kb.id, "data.csv", "csv", "a,b\n1,2")
            .await
            .unwrap();
        let kept = documents::insert_document(db, other.id, "keep.md", "md", "kept")
            .await
            .unwrap();

        delete_knowledge_base(db, kb.id).await.unwrap();

        let err = get_knowledge_base(db, kb.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        let err = documents::get_document(db, doc.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        // Documents in other knowledge bases are untouched.
        let remaining = documents::list_documents(db).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let provider = SqliteProvider::new(":memory:").await.unwrap();
        provider.initialize_schema().await.unwrap();
        let db = &provider.db;

        let kb = create_knowledge_base(db, "handbook", Some("docs")).await.unwrap();
        let update = KnowledgeBaseUpdate {
            name: None,
            description: Some("company docs".to_string()),
        };
        let updated = update_knowledge_base(db, kb.id, &update).await.unwrap();
        assert_eq!(updated.name, "handbook");
        assert_eq!(updated.description.as_deref(), Some("company docs"));
    }
}
