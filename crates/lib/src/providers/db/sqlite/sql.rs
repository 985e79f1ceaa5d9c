//! # SQLite Schema Definition
//!
//! This module centralizes the DDL for the application tables so the
//! provider logic stays clean and database-specific syntax lives in one place.

/// Every table and index the application needs. Statements are idempotent
/// and safe to run on every startup.
pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );",
    "CREATE TABLE IF NOT EXISTS roles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        description TEXT
    );",
    "CREATE TABLE IF NOT EXISTS permissions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        description TEXT
    );",
    "CREATE TABLE IF NOT EXISTS role_permissions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        role_id INTEGER NOT NULL,
        permission_id INTEGER NOT NULL,
        UNIQUE (role_id, permission_id)
    );",
    "CREATE TABLE IF NOT EXISTS knowledge_bases (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );",
    "CREATE TABLE IF NOT EXISTS knowledge_base_user_roles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        knowledge_base_id INTEGER NOT NULL,
        role_id INTEGER NOT NULL,
        UNIQUE (user_id, knowledge_base_id)
    );",
    "CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        knowledge_base_id INTEGER NOT NULL,
        filename TEXT NOT NULL,
        filetype TEXT NOT NULL,
        content TEXT NOT NULL,
        uploaded_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );",
    "CREATE TABLE IF NOT EXISTS departments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT
    );",
    "CREATE INDEX IF NOT EXISTS idx_documents_knowledge_base_id
        ON documents (knowledge_base_id);",
    "CREATE INDEX IF NOT EXISTS idx_kb_user_roles_user_id
        ON knowledge_base_user_roles (user_id);",
];
