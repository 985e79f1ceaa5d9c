//! # Document Ingestion
//!
//! Accepts an uploaded file for a target knowledge base. The filetype is
//! inferred solely from the filename extension and restricted to an
//! allow-list; content is decoded as text and stored verbatim.

use crate::{
    errors::StoreError,
    store::{
        documents::{insert_document, Document},
        knowledge_bases,
    },
};
use tracing::info;
use turso::Database;

/// The file types accepted for ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Markdown,
    Csv,
}

impl FileType {
    /// Infers the file type from a filename extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, extension) = filename.rsplit_once('.')?;
        Self::from_tag(&extension.to_ascii_lowercase())
    }

    /// Resolves a stored filetype tag back to a `FileType`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "md" => Some(Self::Markdown),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// The canonical tag stored in the `filetype` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Csv => "csv",
        }
    }
}

/// Stores an uploaded file as a document in the target knowledge base.
///
/// Rejects unknown extensions and unknown knowledge base ids. The content
/// must decode as UTF-8 and is stored without modification.
pub async fn ingest_document(
    db: &Database,
    knowledge_base_id: i64,
    filename: &str,
    data: &[u8],
) -> Result<Document, StoreError> {
    let filetype = FileType::from_filename(filename)
        .ok_or_else(|| StoreError::UnsupportedFileType(filename.to_string()))?;

    // The target container must exist before any content is stored.
    knowledge_bases::get_knowledge_base(db, knowledge_base_id).await?;

    let content = std::str::from_utf8(data).map_err(|_| StoreError::InvalidEncoding)?;

    let document =
        insert_document(db, knowledge_base_id, filename, filetype.as_str(), content).await?;
    info!(
        document_id = document.id,
        knowledge_base_id,
        filetype = filetype.as_str(),
        "Ingested document '{filename}'."
    );
    Ok(document)
}
