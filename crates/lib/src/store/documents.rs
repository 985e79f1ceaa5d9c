//! Document store operations.

use super::parse_timestamp;
use crate::errors::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use turso::{params, Database, Row};

/// A text document stored verbatim inside a knowledge base.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Document {
    pub id: i64,
    pub knowledge_base_id: i64,
    pub filename: String,
    pub filetype: String,
    pub content: String,
    pub uploaded_at: DateTime<Utc>,
}

impl TryFrom<&Row> for Document {
    type Error = StoreError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let uploaded_at_str: String = row.get(5)?;
        Ok(Document {
            id: row.get(0)?,
            knowledge_base_id: row.get(1)?,
            filename: row.get(2)?,
            filetype: row.get(3)?,
            content: row.get(4)?,
            uploaded_at: parse_timestamp(&uploaded_at_str)?,
        })
    }
}

/// A partial update. Fields left as `None` keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentUpdate {
    pub filename: Option<String>,
    pub filetype: Option<String>,
    pub content: Option<String>,
}

const DOCUMENT_COLUMNS: &str = "id, knowledge_base_id, filename, filetype, content, uploaded_at";

pub async fn insert_document(
    db: &Database,
    knowledge_base_id: i64,
    filename: &str,
    filetype: &str,
    content: &str,
) -> Result<Document, StoreError> {
    let conn = db.connect()?;

    conn.execute(
        "INSERT INTO documents (knowledge_base_id, filename, filetype, content) VALUES (?, ?, ?, ?)",
        params![knowledge_base_id, filename, filetype, content],
    )
    .await?;

    // Re-select on the same connection so last_insert_rowid() is ours.
    let mut rows = conn
        .query(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = last_insert_rowid()"),
            (),
        )
        .await?;
    let row = rows.next().await?.ok_or_else(|| {
        StoreError::DataIntegrity(format!("Document '{filename}' vanished after insert"))
    })?;
    Document::try_from(&row)
}

pub async fn list_documents(db: &Database) -> Result<Vec<Document>, StoreError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY id"),
            (),
        )
        .await?;

    let mut documents = Vec::new();
    while let Some(row) = rows.next().await? {
        documents.push(Document::try_from(&row)?);
    }
    Ok(documents)
}

/// Lists the documents contained in any of the given knowledge bases.
pub async fn list_documents_for_knowledge_bases(
    db: &Database,
    knowledge_base_ids: &[i64],
) -> Result<Vec<Document>, StoreError> {
    if knowledge_base_ids.is_empty() {
        return Ok(Vec::new());
    }

    let conn = db.connect()?;
    let placeholders = knowledge_base_ids
        .iter()
        .map(|_| "?")
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE knowledge_base_id IN ({placeholders}) ORDER BY id"
    );
    let query_params: Vec<turso::Value> = knowledge_base_ids
        .iter()
        .map(|id| turso::Value::Integer(*id))
        .collect();

    let mut rows = conn.query(&sql, query_params).await?;
    let mut documents = Vec::new();
    while let Some(row) = rows.next().await? {
        documents.push(Document::try_from(&row)?);
    }
    Ok(documents)
}

pub async fn get_document(db: &Database, doc_id: i64) -> Result<Document, StoreError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?"),
            params![doc_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Document::try_from(&row),
        None => Err(StoreError::NotFound("Document")),
    }
}

pub async fn update_document(
    db: &Database,
    doc_id: i64,
    update: &DocumentUpdate,
) -> Result<Document, StoreError> {
    let conn = db.connect()?;

    let mut assignments: Vec<&str> = Vec::new();
    let mut query_params: Vec<turso::Value> = Vec::new();

    if let Some(filename) = &update.filename {
        assignments.push("filename = ?");
        query_params.push(turso::Value::Text(filename.clone()));
    }
    if let Some(filetype) = &update.filetype {
        assignments.push("filetype = ?");
        query_params.push(turso::Value::Text(filetype.clone()));
    }
    if let Some(content) = &update.content {
        assignments.push("content = ?");
        query_params.push(turso::Value::Text(content.clone()));
    }

    if assignments.is_empty() {
        return get_document(db, doc_id).await;
    }

    query_params.push(turso::Value::Integer(doc_id));
    let sql = format!("UPDATE documents SET {} WHERE id = ?", assignments.join(", "));
    let changed = conn.execute(&sql, query_params).await?;
    if changed == 0 {
        return Err(StoreError::NotFound("Document"));
    }

    get_document(db, doc_id).await
}

pub async fn delete_document(db: &Database, doc_id: i64) -> Result<(), StoreError> {
    let conn = db.connect()?;
    let removed = conn
        .execute("DELETE FROM documents WHERE id = ?", params![doc_id])
        .await?;
    if removed == 0 {
        return Err(StoreError::NotFound("Document"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::knowledge_bases::create_knowledge_base;
    use crate::SqliteProvider;

    async fn setup() -> (SqliteProvider, i64) {
        let provider = SqliteProvider::new(":memory:").await.unwrap();
        provider.initialize_schema().await.unwrap();
        let kb = create_knowledge_base(&provider.db, "general", None)
            .await
            .unwrap();
        (provider, kb.id)
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let (provider, kb_id) = setup().await;
        let db = &provider.db;

        let doc = insert_document(db, kb_id, "notes.md", "md", "# Notes")
            .await
            .unwrap();
        let fetched = get_document(db, doc.id).await.unwrap();
        assert_eq!(fetched.filename, "notes.md");
        assert_eq!(fetched.filetype, "md");
        assert_eq!(fetched.content, "# Notes");
        assert_eq!(fetched.knowledge_base_id, kb_id);
    }

    #[tokio::test]
    async fn test_listing_scoped_to_knowledge_bases() {
        let (provider, kb_id) = setup().await;
        let db = &provider.db;
        let other = create_knowledge_base(db, "other", None).await.unwrap();

        insert_document(db, kb_id, "a.md", "md", "a").await.unwrap();
        insert_document(db, other.id, "b.md", "md", "b").await.unwrap();

        let scoped = list_documents_for_knowledge_bases(db, &[kb_id])
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].filename, "a.md");

        let none = list_documents_for_knowledge_bases(db, &[]).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (provider, kb_id) = setup().await;
        let db = &provider.db;

        let doc = insert_document(db, kb_id, "a.md", "md", "old").await.unwrap();
        let update = DocumentUpdate {
            content: Some("new".to_string()),
            ..Default::default()
        };
        let updated = update_document(db, doc.id, &update).await.unwrap();
        assert_eq!(updated.content, "new");
        assert_eq!(updated.filename, "a.md");

        delete_document(db, doc.id).await.unwrap();
        let err = get_document(db, doc.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        let err = delete_document(db, doc.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
