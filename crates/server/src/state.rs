//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The `AppState` holds the configuration and the
//! database provider, making them accessible to all request handlers.

use crate::config::AppConfig;
use ragstore::SqliteProvider;
use std::sync::Arc;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<AppConfig>,
    /// The primary database provider.
    pub sqlite_provider: Arc<SqliteProvider>,
}

/// Builds the shared application state from the configuration.
///
/// Sets up the connection to the SQLite database, ensures the schema is
/// up-to-date, and seeds the configured default role and knowledge base so
/// registration has a grant target on a fresh database.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let sqlite_provider = SqliteProvider::new(&config.db_url).await?;
    tracing::info!(db_path = %config.db_url, "Initialized local storage provider (SQLite).");
    sqlite_provider.initialize_schema().await?;

    core_access::ensure_defaults(
        &sqlite_provider.db,
        &config.default_role,
        &config.default_knowledge_base,
    )
    .await?;

    Ok(AppState {
        config: Arc::new(config),
        sqlite_provider: Arc::new(sqlite_provider),
    })
}
