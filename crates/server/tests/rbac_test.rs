//! # RBAC Integration Tests
//!
//! Exercises role and permission CRUD, bulk permission binding with its
//! skip-unknown/skip-duplicate policy, the role-assignment upsert, and the
//! permission-check guard.

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{TestApp, TestDataBuilder};
use serde_json::{json, Value};

#[tokio::test]
async fn test_role_crud_is_admin_gated() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.register("worker", "worker@example.com", "secret123").await?;
    let worker_token = app.login("worker", "secret123").await?;

    // A regular employee cannot create roles.
    let response = app
        .client
        .post(format!("{}/api/v1/role", app.address))
        .bearer_auth(&worker_token)
        .json(&json!({ "name": "editor", "display_name": "Editor" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let (_admin_id, admin_token) = app.register_with_role("boss", "admin").await?;

    // Create.
    let response = app
        .client
        .post(format!("{}/api/v1/role", app.address))
        .bearer_auth(&admin_token)
        .json(&json!({
            "name": "editor",
            "display_name": "Editor",
            "description": "Can edit documents",
        }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let role: Value = response.json().await?;
    let role_id = role["id"].as_i64().unwrap();

    // Duplicate name conflicts.
    let response = app
        .client
        .post(format!("{}/api/v1/role", app.address))
        .bearer_auth(&admin_token)
        .json(&json!({ "name": "editor", "display_name": "Editor Again" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Update.
    let response = app
        .client
        .put(format!("{}/api/v1/role/{role_id}", app.address))
        .bearer_auth(&admin_token)
        .json(&json!({ "display_name": "Content Editor" }))
        .send()
        .await?
        .error_for_status()?;
    let updated: Value = response.json().await?;
    assert_eq!(updated["display_name"], "Content Editor");
    assert_eq!(updated["name"], "editor");

    // Delete, then the lookup is a 404.
    let response = app
        .client
        .delete(format!("{}/api/v1/role/{role_id}", app.address))
        .bearer_auth(&admin_token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app
        .client
        .get(format!("{}/api/v1/role/{role_id}", app.address))
        .bearer_auth(&admin_token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_permission_crud() -> Result<()> {
    let app = TestApp::spawn().await?;
    let (_admin_id, admin_token) = app.register_with_role("boss", "admin").await?;

    let response = app
        .client
        .post(format!("{}/api/v1/permission", app.address))
        .bearer_auth(&admin_token)
        .json(&json!({ "code": "kb:read", "display_name": "Read knowledge bases" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let permission: Value = response.json().await?;
    let permission_id = permission["id"].as_i64().unwrap();

    let response = app
        .client
        .get(format!("{}/api/v1/permission", app.address))
        .bearer_auth(&admin_token)
        .send()
        .await?
        .error_for_status()?;
    let body: Value = response.json().await?;
    assert_eq!(body["result"].as_array().unwrap().len(), 1);

    let response = app
        .client
        .delete(format!("{}/api/v1/permission/{permission_id}", app.address))
        .bearer_auth(&admin_token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    Ok(())
}

#[tokio::test]
async fn test_bulk_binding_skips_unknown_and_duplicate_ids() -> Result<()> {
    let app = TestApp::spawn().await?;
    let (_admin_id, admin_token) = app.register_with_role("boss", "admin").await?;

    let builder = TestDataBuilder::new(&app).await?;
    let role_id = builder.ensure_role("editor").await?;
    let read_id = builder.add_permission("kb:read").await?;
    let write_id = builder.add_permission("kb:write").await?;

    // One unknown id in the batch does not fail the call.
    let response = app
        .client
        .post(format!("{}/api/v1/role-permission/assign", app.address))
        .bearer_auth(&admin_token)
        .json(&json!({
            "role_id": role_id,
            "permission_ids": [read_id, 99999, write_id],
        }))
        .send()
        .await?
        .error_for_status()?;
    let body: Value = response.json().await?;
    assert_eq!(body["newly_bound"].as_u64(), Some(2));

    // Rebinding an already-bound id creates no extra rows.
    let response = app
        .client
        .post(format!("{}/api/v1/role-permission/assign", app.address))
        .bearer_auth(&admin_token)
        .json(&json!({ "role_id": role_id, "permission_ids": [read_id] }))
        .send()
        .await?
        .error_for_status()?;
    let body: Value = response.json().await?;
    assert_eq!(body["newly_bound"].as_u64(), Some(0));

    let count = builder
        .count_rows("SELECT COUNT(*) FROM role_permissions")
        .await?;
    assert_eq!(count, 2);

    // The listing reflects exactly the two bound permissions.
    let response = app
        .client
        .get(format!("{}/api/v1/role-permission/{role_id}", app.address))
        .bearer_auth(&admin_token)
        .send()
        .await?
        .error_for_status()?;
    let body: Value = response.json().await?;
    let codes: Vec<&str> = body["result"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["kb:read", "kb:write"]);

    Ok(())
}

#[tokio::test]
async fn test_binding_to_unknown_role_is_not_found() -> Result<()> {
    let app = TestApp::spawn().await?;
    let (_admin_id, admin_token) = app.register_with_role("boss", "admin").await?;
    let builder = TestDataBuilder::new(&app).await?;
    let read_id = builder.add_permission("kb:read").await?;

    let response = app
        .client
        .post(format!("{}/api/v1/role-permission/assign", app.address))
        .bearer_auth(&admin_token)
        .json(&json!({ "role_id": 99999, "permission_ids": [read_id] }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_role_assignment_upsert_keeps_a_single_row() -> Result<()> {
    let app = TestApp::spawn().await?;
    let (_admin_id, admin_token) = app.register_with_role("boss", "admin").await?;
    let target_id = app.register("worker", "worker@example.com", "secret123").await?;

    let builder = TestDataBuilder::new(&app).await?;
    let kb_id = builder.ensure_knowledge_base("handbook").await?;
    let viewer_id = builder.ensure_role("viewer").await?;
    let editor_id = builder.ensure_role("editor").await?;

    for role_id in [viewer_id, editor_id] {
        app.client
            .post(format!("{}/api/v1/role-assignment/assign", app.address))
            .bearer_auth(&admin_token)
            .json(&json!({
                "user_id": target_id,
                "knowledge_base_id": kb_id,
                "role_id": role_id,
            }))
            .send()
            .await?
            .error_for_status()?;
    }

    // Exactly one assignment row remains, reflecting the latest role.
    let count = builder
        .count_rows(&format!(
            "SELECT COUNT(*) FROM knowledge_base_user_roles \
             WHERE user_id = {target_id} AND knowledge_base_id = {kb_id}"
        ))
        .await?;
    assert_eq!(count, 1);

    let worker_token = app.login("worker", "secret123").await?;
    let response = app
        .client
        .get(format!("{}/api/v1/user/roles", app.address))
        .bearer_auth(&worker_token)
        .send()
        .await?
        .error_for_status()?;
    let assignments: Value = response.json().await?;
    let handbook = assignments
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["knowledge_base_id"].as_i64() == Some(kb_id))
        .expect("handbook assignment present")
        .clone();
    assert_eq!(handbook["role_name"], "editor");

    Ok(())
}

#[tokio::test]
async fn test_role_assignment_delete() -> Result<()> {
    let app = TestApp::spawn().await?;
    let (_admin_id, admin_token) = app.register_with_role("boss", "admin").await?;
    let target_id = app.register("worker", "worker@example.com", "secret123").await?;

    let builder = TestDataBuilder::new(&app).await?;
    let kb_id = builder.ensure_knowledge_base("handbook").await?;
    let viewer_id = builder.ensure_role("viewer").await?;
    builder.assign_role(target_id, kb_id, viewer_id).await?;

    let url = format!(
        "{}/api/v1/role-assignment/delete?user_id={target_id}&knowledge_base_id={kb_id}",
        app.address
    );
    let response = app
        .client
        .delete(&url)
        .bearer_auth(&admin_token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Deleting the same assignment again is a 404.
    let response = app
        .client
        .delete(&url)
        .bearer_auth(&admin_token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_permission_guard_follows_role_bindings() -> Result<()> {
    let app = TestApp::spawn().await?;
    let user_id = app.register("worker", "worker@example.com", "secret123").await?;

    let user = core_access::get_user(&app.app_state.sqlite_provider.db, user_id).await?;

    // The default employee role grants no permission codes.
    let denied =
        ragstore_server::auth::guards::assert_permission(&app.app_state, &user, &["kb:read"])
            .await;
    let err = denied.err().expect("permission check fails closed");
    assert_eq!(err.0, StatusCode::FORBIDDEN);

    // Binding the code to the user's role opens the gate.
    let builder = TestDataBuilder::new(&app).await?;
    let read_id = builder.add_permission("kb:read").await?;
    let employee_id = builder.ensure_role("employee").await?;
    core_access::bind_permissions(&app.app_state.sqlite_provider.db, employee_id, &[read_id])
        .await?;

    let allowed =
        ragstore_server::auth::guards::assert_permission(&app.app_state, &user, &["kb:read"])
            .await;
    assert!(allowed.is_ok(), "permission check passes with a matching code");

    Ok(())
}
