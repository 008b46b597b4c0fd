/// Common test utilities for API integration tests
///
/// Builds the full router over an in-memory store so the HTTP surface can
/// be exercised without PostgreSQL.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use orgtask_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig, JwtConfig},
};
use orgtask_shared::store::MemoryStore;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "password123";

/// Test context with router and backing store
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: Router,
}

/// Tokens and identifiers returned by registration or login
pub struct Session {
    pub user_id: String,
    pub organization_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl Session {
    fn from_json(body: &Value) -> Self {
        let field = |name: &str| body[name].as_str().unwrap_or_default().to_string();
        Self {
            user_id: field("user_id"),
            organization_id: field("organization_id"),
            access_token: field("access_token"),
            refresh_token: field("refresh_token"),
        }
    }
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
            trust_proxy_headers: true,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: "test-secret-key-at-least-32-bytes-long".to_string(),
        },
        seed_demo_data: false,
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let app = build_router(AppState::new(store.clone(), config));
        Self { store, app }
    }

    /// Sends a request and returns the status and parsed JSON body
    ///
    /// Empty bodies come back as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send_with_headers(method, uri, token, body, &[]).await
    }

    pub async fn send_with_headers(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    /// Registers a new organization and returns the owner's session
    pub async fn register(&self, email: &str, org_name: &str) -> Session {
        let (status, body) = self
            .send(
                Method::POST,
                "/v1/auth/register",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": TEST_PASSWORD,
                    "org_name": org_name,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        Session::from_json(&body)
    }

    pub async fn login(&self, email: &str) -> Session {
        let (status, body) = self
            .send(
                Method::POST,
                "/v1/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": TEST_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        Session::from_json(&body)
    }

    /// Creates a user through the API and logs them in
    pub async fn member(&self, owner: &Session, email: &str, role: &str) -> Session {
        let (status, body) = self
            .send(
                Method::POST,
                "/v1/users",
                Some(&owner.access_token),
                Some(serde_json::json!({
                    "email": email,
                    "password": TEST_PASSWORD,
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create user failed: {}", body);
        self.login(email).await
    }
}
