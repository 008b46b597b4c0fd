/// HTTP-level tests for the OrgTask API
///
/// Every request goes through the full router: authentication, per-route
/// permission checks, handlers, services and the in-memory store.

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::json;

fn task_body(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "description": "from the API",
        "category": "WORK",
        "status": "TODO",
    })
}

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_register_and_duplicate() {
    let ctx = TestContext::new();

    let session = ctx.register("owner@acme.com", "Acme").await;
    assert!(!session.access_token.is_empty());
    assert!(!session.refresh_token.is_empty());

    let (status, body) = ctx
        .send(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({
                "email": "owner@acme.com",
                "password": common::TEST_PASSWORD,
                "org_name": "Another",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "123", "org_name": "Acme" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["email", "password"]);
    assert_eq!(ctx.store.write_count(), 0);
}

#[tokio::test]
async fn test_login_and_refresh() {
    let ctx = TestContext::new();
    ctx.register("owner@acme.com", "Acme").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "owner@acme.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let session = ctx.login("owner@acme.com").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": session.refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access_token"].as_str().unwrap();

    let (status, _) = ctx.send(Method::GET, "/v1/tasks", Some(access), None).await;
    assert_eq!(status, StatusCode::OK);

    // An access token is not a refresh token
    let (status, _) = ctx
        .send(
            Method::POST,
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": session.access_token })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new();

    let (status, _) = ctx.send(Method::GET, "/v1/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .send(Method::GET, "/v1/tasks", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .send(Method::POST, "/v1/tasks", None, Some(task_body("Nope")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.store.write_count(), 0);
}

#[tokio::test]
async fn test_viewer_cannot_mutate_tasks() {
    let ctx = TestContext::new();
    let owner = ctx.register("owner@acme.com", "Acme").await;
    let viewer = ctx.member(&owner, "viewer@acme.com", "VIEWER").await;

    let (status, body) = ctx
        .send(Method::POST, "/v1/tasks", Some(&owner.access_token), Some(task_body("Plan")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = body["id"].as_str().unwrap().to_string();

    let writes = ctx.store.write_count();

    let (status, body) = ctx
        .send(Method::POST, "/v1/tasks", Some(&viewer.access_token), Some(task_body("Sneaky")))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Missing required permission: TASK_CREATE");

    let uri = format!("/v1/tasks/{}", task_id);
    let (status, _) = ctx
        .send(Method::PUT, &uri, Some(&viewer.access_token), Some(json!({ "title": "Mine" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send(Method::DELETE, &uri, Some(&viewer.access_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(ctx.store.write_count(), writes);

    let (status, body) = ctx.send(Method::GET, &uri, Some(&viewer.access_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Plan");
}

#[tokio::test]
async fn test_task_crud_flow() {
    let ctx = TestContext::new();
    let owner = ctx.register("owner@acme.com", "Acme").await;
    let token = Some(owner.access_token.as_str());

    let (status, created) = ctx
        .send(Method::POST, "/v1/tasks", token, Some(task_body("Write report")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["organization_id"], owner.organization_id.as_str());
    assert_eq!(created["owner_id"], owner.user_id.as_str());
    assert_eq!(created["status"], "TODO");
    let uri = format!("/v1/tasks/{}", created["id"].as_str().unwrap());

    let (status, list) = ctx.send(Method::GET, "/v1/tasks", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, updated) = ctx
        .send(
            Method::PUT,
            &uri,
            token,
            Some(json!({ "status": "IN_PROGRESS", "description": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "IN_PROGRESS");
    assert_eq!(updated["title"], "Write report");
    assert!(updated["description"].is_null());

    let (status, deleted) = ctx.send(Method::DELETE, &uri, token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["id"], created["id"]);

    let (status, body) = ctx.send(Method::GET, &uri, token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = ctx.send(Method::DELETE, &uri, token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_task_payloads() {
    let ctx = TestContext::new();
    let owner = ctx.register("owner@acme.com", "Acme").await;
    let token = Some(owner.access_token.as_str());

    let (status, _) = ctx
        .send(Method::POST, "/v1/tasks", token, Some(task_body("")))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = ctx
        .send(
            Method::POST,
            "/v1/tasks",
            token,
            Some(json!({ "title": "Odd", "category": "HOBBY", "status": "TODO" })),
        )
        .await;
    assert!(status.is_client_error());

    let (status, _) = ctx
        .send(Method::GET, "/v1/tasks/not-a-uuid", token, None)
        .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_sibling_organizations_are_isolated() {
    let ctx = TestContext::new();
    let acme = ctx.register("owner@acme.com", "Acme").await;
    let other = ctx.register("owner@other.com", "Other").await;

    let (_, task) = ctx
        .send(Method::POST, "/v1/tasks", Some(&acme.access_token), Some(task_body("Secret")))
        .await;
    let uri = format!("/v1/tasks/{}", task["id"].as_str().unwrap());

    let (status, _) = ctx.send(Method::GET, &uri, Some(&other.access_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, list) = ctx.send(Method::GET, "/v1/tasks", Some(&other.access_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_child_organization_rolls_up() {
    let ctx = TestContext::new();
    let owner = ctx.register("owner@acme.com", "Acme").await;

    let (status, child) = ctx
        .send(
            Method::POST,
            "/v1/organizations",
            Some(&owner.access_token),
            Some(json!({ "name": "Acme Engineering" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(child["type"], "TEAM");
    assert_eq!(child["parent_id"], owner.organization_id.as_str());
    let child_id = child["id"].as_str().unwrap();

    let (status, user) = ctx
        .send(
            Method::POST,
            "/v1/users",
            Some(&owner.access_token),
            Some(json!({
                "email": "admin@acme-team.com",
                "password": common::TEST_PASSWORD,
                "role": "ADMIN",
                "organization_id": child_id,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["organization_id"], child_id);
    assert!(user.get("password_hash").is_none());

    let team_admin = ctx.login("admin@acme-team.com").await;
    let (status, _) = ctx
        .send(Method::POST, "/v1/tasks", Some(&team_admin.access_token), Some(task_body("Sprint")))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // The root sees the child's task; the child does not see the root's
    ctx.send(Method::POST, "/v1/tasks", Some(&owner.access_token), Some(task_body("Budget")))
        .await;

    let (_, root_list) = ctx.send(Method::GET, "/v1/tasks", Some(&owner.access_token), None).await;
    assert_eq!(root_list.as_array().unwrap().len(), 2);

    let (_, team_list) = ctx
        .send(Method::GET, "/v1/tasks", Some(&team_admin.access_token), None)
        .await;
    let team_list = team_list.as_array().unwrap();
    assert_eq!(team_list.len(), 1);
    assert_eq!(team_list[0]["title"], "Sprint");
}

#[tokio::test]
async fn test_admin_cannot_manage_organization() {
    let ctx = TestContext::new();
    let owner = ctx.register("owner@acme.com", "Acme").await;
    let admin = ctx.member(&owner, "admin@acme.com", "ADMIN").await;

    let (status, _) = ctx
        .send(
            Method::POST,
            "/v1/organizations",
            Some(&admin.access_token),
            Some(json!({ "name": "Rogue Team" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(
            Method::POST,
            "/v1/users",
            Some(&admin.access_token),
            Some(json!({
                "email": "friend@acme.com",
                "password": common::TEST_PASSWORD,
                "role": "OWNER",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .send(Method::GET, "/v1/audit-logs", Some(&admin.access_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Missing required permission: AUDIT_READ");
}

#[tokio::test]
async fn test_audit_logs_capture_client_metadata() {
    let ctx = TestContext::new();
    let owner = ctx.register("owner@acme.com", "Acme").await;

    let (status, task) = ctx
        .send_with_headers(
            Method::POST,
            "/v1/tasks",
            Some(&owner.access_token),
            Some(task_body("Traced")),
            &[
                ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
                ("user-agent", "api-tests/1.0"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, entries) = ctx
        .send(Method::GET, "/v1/audit-logs", Some(&owner.access_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let entries = entries.as_array().unwrap();
    let created = entries
        .iter()
        .find(|e| e["action"] == "TASK_CREATE")
        .expect("task creation audited");
    assert_eq!(created["success"], true);
    assert_eq!(created["resource_type"], "TASK");
    assert_eq!(created["resource_id"], task["id"]);
    assert_eq!(created["actor_user_id"], owner.user_id.as_str());
    assert_eq!(created["ip_address"], "203.0.113.7");
    assert_eq!(created["user_agent"], "api-tests/1.0");
    assert!(entries.iter().any(|e| e["action"] == "REGISTER_SUCCESS"));

    let uri = format!("/v1/audit-logs/{}", created["id"].as_str().unwrap());
    let (status, single) = ctx.send(Method::GET, &uri, Some(&owner.access_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(single["id"], created["id"]);

    let missing = format!("/v1/audit-logs/{}", uuid::Uuid::new_v4());
    let (status, _) = ctx.send(Method::GET, &missing, Some(&owner.access_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_forwarded_for_still_audited() {
    let ctx = TestContext::new();
    let owner = ctx.register("owner@acme.com", "Acme").await;
    let bogus = "x".repeat(200);

    for forwarded in [bogus.as_str(), "not-an-ip, 10.0.0.1"] {
        let (status, _) = ctx
            .send_with_headers(
                Method::POST,
                "/v1/tasks",
                Some(&owner.access_token),
                Some(task_body("Hidden")),
                &[("x-forwarded-for", forwarded)],
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let created: Vec<_> = ctx
        .store
        .all_audit_entries()
        .await
        .into_iter()
        .filter(|e| e.action == "TASK_CREATE")
        .collect();
    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|e| e.success && e.ip_address.is_none()));
}

#[tokio::test]
async fn test_forwarded_headers_ignored_without_trusted_proxy() {
    let mut config = common::test_config();
    config.api.trust_proxy_headers = false;
    let ctx = TestContext::with_config(config);

    let (status, _) = ctx
        .send_with_headers(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "ghost@acme.com", "password": "whatever" })),
            &[("x-forwarded-for", "1.2.3.4"), ("x-real-ip", "5.6.7.8")],
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let entries = ctx.store.all_audit_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "LOGIN_FAIL");
    assert!(entries[0].ip_address.is_none());
}

#[tokio::test]
async fn test_security_headers_on_api_responses() {
    let ctx = TestContext::new();

    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(ctx.app.clone(), request).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.get("strict-transport-security").is_none());
}
