//! # Common Test Utilities
//!
//! This module centralizes the test harness and helper functions used across
//! the `ragstore-server` integration tests:
//!
//! - `TestApp`: spawns the real server on a random port against a temporary
//!   SQLite database, with a `reqwest` client and API helpers.
//! - `TestDataBuilder`: seeds and inspects rows directly in the database.
//! - `generate_jwt_with_expiry`: crafts tokens outside the login flow for
//!   negative tests.

// Allow unused code because this is a test utility module, and not all
// functions might be used by every test file that includes it.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use jsonwebtoken::{encode, EncodingKey, Header};
use ragstore_server::{
    auth::middleware::Claims,
    config, router,
    state::{build_app_state, AppState},
};
use reqwest::Client;
use std::{
    fs::File,
    io::Write,
    net::SocketAddr,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};
use tempfile::{tempdir, NamedTempFile, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

/// The secret the test configuration signs tokens with.
pub const TEST_JWT_SECRET: &str = "test-secret-key";

/// A harness for end-to-end testing of the Axum server.
///
/// This struct spawns the server on a random available port and sets up a
/// temporary SQLite database seeded with the default role and knowledge base.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub db_path: PathBuf,
    pub app_state: AppState,
    _db_file: Option<NamedTempFile>,
    _config_dir: Option<TempDir>,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server and returns a `TestApp` instance.
    pub async fn spawn() -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let db_file = NamedTempFile::new()?;
        let db_path = db_file.path().to_path_buf();

        let config_dir = tempdir()?;
        let config_path = config_dir.path().join("config.yml");
        let config_content = format!(
            r#"
port: 0
db_url: "{}"
jwt_secret: "{TEST_JWT_SECRET}"
token_expiry_secs: 3600
default_role: "employee"
default_knowledge_base: "general"
"#,
            db_path.to_str().unwrap(),
        );
        let mut file = File::create(&config_path)?;
        file.write_all(config_content.as_bytes())?;

        let config = config::get_config(Some(config_path.to_str().unwrap()))?;
        let app_state = build_app_state(config).await?;
        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                eprintln!("[TestApp] Server error: {e}");
            }
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Ok(Self {
            address,
            client: Client::new(),
            db_path,
            app_state: app_state_for_harness,
            _db_file: Some(db_file),
            _config_dir: Some(config_dir),
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Registers a user through the API and returns their id.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<i64> {
        let response = self
            .client
            .post(format!("{}/api/v1/user/register", self.address))
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }))
            .send()
            .await?
            .error_for_status()?;
        let body: serde_json::Value = response.json().await?;
        Ok(body["id"].as_i64().expect("register response has an id"))
    }

    /// Logs a user in through the API and returns a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/api/v1/user/login", self.address))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?
            .error_for_status()?;
        let body: serde_json::Value = response.json().await?;
        Ok(body["access_token"]
            .as_str()
            .expect("login response has an access_token")
            .to_string())
    }

    /// Registers a user, grants them `role_name` in the default knowledge
    /// base, and returns (user_id, bearer_token).
    pub async fn register_with_role(&self, username: &str, role_name: &str) -> Result<(i64, String)> {
        let password = "password123";
        let user_id = self
            .register(username, &format!("{username}@example.com"), password)
            .await?;

        let builder = TestDataBuilder::new(self).await?;
        let role_id = builder.ensure_role(role_name).await?;
        let kb_id = builder.ensure_knowledge_base("general").await?;
        builder.assign_role(user_id, kb_id, role_id).await?;

        let token = self.login(username, password).await?;
        Ok((user_id, token))
    }

    /// Uploads a document through the multipart endpoint.
    pub async fn upload_document(
        &self,
        token: &str,
        knowledge_base_id: i64,
        filename: &str,
        content: &str,
    ) -> Result<reqwest::Response> {
        let form = reqwest::multipart::Form::new()
            .text("knowledge_base_id", knowledge_base_id.to_string())
            .part(
                "file",
                reqwest::multipart::Part::bytes(content.as_bytes().to_vec())
                    .file_name(filename.to_string()),
            );
        Ok(self
            .client
            .post(format!("{}/api/v1/document", self.address))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

// --- Test Data Builder ---

/// A fluent helper for seeding and inspecting data in the test database.
pub struct TestDataBuilder<'a> {
    // We hold a reference to the TestApp to ensure the database outlives the builder.
    _app: &'a TestApp,
    conn: turso::Connection,
}

impl<'a> TestDataBuilder<'a> {
    pub async fn new(app: &'a TestApp) -> Result<Self> {
        let conn = app.app_state.sqlite_provider.db.connect()?;
        Ok(Self { _app: app, conn })
    }

    /// Creates a role if it does not exist yet and returns its id.
    pub async fn ensure_role(&self, name: &str) -> Result<i64> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO roles (name, display_name) VALUES (?, ?)",
                turso::params![name, name],
            )
            .await?;
        let mut rows = self
            .conn
            .query("SELECT id FROM roles WHERE name = ?", turso::params![name])
            .await?;
        let row = rows.next().await?.expect("role exists after insert");
        Ok(row.get(0)?)
    }

    /// Creates a knowledge base if it does not exist yet and returns its id.
    pub async fn ensure_knowledge_base(&self, name: &str) -> Result<i64> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO knowledge_bases (name) VALUES (?)",
                turso::params![name],
            )
            .await?;
        let mut rows = self
            .conn
            .query(
                "SELECT id FROM knowledge_bases WHERE name = ?",
                turso::params![name],
            )
            .await?;
        let row = rows.next().await?.expect("knowledge base exists after insert");
        Ok(row.get(0)?)
    }

    /// Creates a permission and returns its id.
    pub async fn add_permission(&self, code: &str) -> Result<i64> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO permissions (code, display_name) VALUES (?, ?)",
                turso::params![code, code],
            )
            .await?;
        let mut rows = self
            .conn
            .query(
                "SELECT id FROM permissions WHERE code = ?",
                turso::params![code],
            )
            .await?;
        let row = rows.next().await?.expect("permission exists after insert");
        Ok(row.get(0)?)
    }

    /// Upserts a (user, knowledge base, role) assignment.
    pub async fn assign_role(&self, user_id: i64, knowledge_base_id: i64, role_id: i64) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO knowledge_base_user_roles (user_id, knowledge_base_id, role_id)
                 VALUES (?, ?, ?)
                 ON CONFLICT (user_id, knowledge_base_id) DO UPDATE SET role_id = excluded.role_id",
                turso::params![user_id, knowledge_base_id, role_id],
            )
            .await?;
        Ok(())
    }

    /// Runs a `SELECT COUNT(*)` query and returns the count.
    pub async fn count_rows(&self, sql: &str) -> Result<i64> {
        let mut rows = self.conn.query(sql, ()).await?;
        let row = rows.next().await?.expect("count query returns a row");
        Ok(row.get(0)?)
    }
}

// --- Token Helpers ---

/// Generates a JWT for a user id with a custom expiration offset, signed with
/// the test secret. Negative offsets produce already-expired tokens.
pub fn generate_jwt_with_expiry(user_id: i64, expires_in_secs: i64) -> Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;
    let expiration = (now + expires_in_secs).max(0);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_ref()),
    )?;
    Ok(token)
}
