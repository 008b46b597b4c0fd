/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use orgtask_api::{app::{build_router, AppState}, config::Config};
/// use orgtask_shared::db::pool::{create_pool, DatabaseConfig};
/// use orgtask_shared::store::PgStore;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::from_url(config.database.url.clone())).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{permission::require_permission_layer, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use orgtask_shared::{
    auth::{authorization::Permission, middleware::jwt_auth_middleware},
    services::Services,
    store::Store,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend (PostgreSQL in production, in-memory in tests)
    pub store: Arc<dyn Store>,

    /// Business services wired to `store`
    pub services: Services,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let services = Services::new(store.clone(), config.jwt.secret.as_str());
        Self {
            store,
            services,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// └── /v1/
///     ├── /auth/                    # Public
///     │   ├── POST /register
///     │   ├── POST /login
///     │   └── POST /refresh
///     ├── /tasks                    # JWT + per-route permission
///     │   ├── GET    /              TASK_READ
///     │   ├── POST   /              TASK_CREATE
///     │   ├── GET    /:id           TASK_READ
///     │   ├── PUT    /:id           TASK_UPDATE
///     │   └── DELETE /:id           TASK_DELETE
///     ├── /audit-logs
///     │   ├── GET    /              AUDIT_READ
///     │   └── GET    /:id           AUDIT_READ
///     ├── POST /organizations       ORG_CREATE
///     └── POST /users               USER_CREATE
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (protected routes only)
/// 5. Permission check (per route)
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let protected_routes = Router::new()
        .route(
            "/tasks",
            get(routes::tasks::list_tasks)
                .layer(middleware::from_fn(require_permission_layer(Permission::TaskRead))),
        )
        .route(
            "/tasks",
            post(routes::tasks::create_task)
                .layer(middleware::from_fn(require_permission_layer(Permission::TaskCreate))),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .layer(middleware::from_fn(require_permission_layer(Permission::TaskRead))),
        )
        .route(
            "/tasks/:id",
            put(routes::tasks::update_task)
                .layer(middleware::from_fn(require_permission_layer(Permission::TaskUpdate))),
        )
        .route(
            "/tasks/:id",
            delete(routes::tasks::delete_task)
                .layer(middleware::from_fn(require_permission_layer(Permission::TaskDelete))),
        )
        .route(
            "/audit-logs",
            get(routes::audit_logs::list_audit_logs)
                .layer(middleware::from_fn(require_permission_layer(Permission::AuditRead))),
        )
        .route(
            "/audit-logs/:id",
            get(routes::audit_logs::get_audit_log)
                .layer(middleware::from_fn(require_permission_layer(Permission::AuditRead))),
        )
        .route(
            "/organizations",
            post(routes::organizations::create_organization)
                .layer(middleware::from_fn(require_permission_layer(Permission::OrgCreate))),
        )
        .route(
            "/users",
            post(routes::users::create_user)
                .layer(middleware::from_fn(require_permission_layer(Permission::UserCreate))),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    let cors = if state.config.allows_any_origin() {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication layer
///
/// Validates the bearer token, injects [`orgtask_shared::auth::middleware::AuthContext`]
/// into the request extensions, and renders failures as JSON API errors.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    jwt_auth_middleware(state.jwt_secret().to_string(), req, next)
        .await
        .map_err(ApiError::from)
}
