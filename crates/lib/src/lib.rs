//! # Ragstore Core Library
//!
//! The storage layer for the `ragstore` backend: the SQLite provider that
//! owns the application schema, the resource store (knowledge bases,
//! documents, departments), and document ingestion.

pub mod errors;
pub mod ingest;
pub mod providers;
pub mod store;

pub use errors::StoreError;
pub use providers::db::sqlite::SqliteProvider;
