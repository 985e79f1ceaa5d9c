//! # Resource Store
//!
//! Row types and query functions for the entities the server persists:
//! knowledge bases, the documents they contain, and departments. All
//! functions take a `turso::Database` handle and acquire a fresh
//! connection per operation.

pub mod departments;
pub mod documents;
pub mod knowledge_bases;

use crate::errors::StoreError;
use chrono::{DateTime, Utc};

/// Parses the `CURRENT_TIMESTAMP` text format SQLite stores into a UTC datetime.
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
        .map_err(|e| StoreError::DataIntegrity(format!("Failed to parse date '{value}': {e}")))
}
