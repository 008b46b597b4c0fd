/// Route-level permission checks
///
/// Each protected route declares the [`Permission`] it needs with
/// [`require_permission_layer`]. The check reads the [`AuthContext`] left by the
/// JWT middleware, so it must sit inside the authentication layer. Services
/// repeat the same check before touching storage.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use orgtask_api::middleware::permission::require_permission_layer;
/// use orgtask_shared::auth::authorization::Permission;
///
/// async fn list() -> &'static str { "[]" }
///
/// let app: Router = Router::new().route(
///     "/tasks",
///     get(list).layer(middleware::from_fn(require_permission_layer(Permission::TaskRead))),
/// );
/// ```

use axum::{extract::Request, middleware::Next, response::Response};
use orgtask_shared::auth::authorization::{require_permission, Permission};
use orgtask_shared::auth::middleware::AuthContext;
use std::{future::Future, pin::Pin};
use tracing::debug;

use crate::error::ApiError;

/// Rejects the request unless the caller's role grants `permission`
pub async fn enforce_permission(
    permission: Permission,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let role = req.extensions().get::<AuthContext>().map(|auth| auth.role);
    if role.is_none() {
        return Err(ApiError::Unauthorized("Missing credentials".to_string()));
    }

    if let Err(e) = require_permission(role, permission) {
        debug!(permission = permission.as_str(), "Permission denied");
        return Err(ApiError::Forbidden(e.to_string()));
    }

    Ok(next.run(req).await)
}

type PermissionFuture = Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send>>;

/// Captures `permission` and returns a closure usable with `middleware::from_fn`
pub fn require_permission_layer(
    permission: Permission,
) -> impl Fn(Request, Next) -> PermissionFuture + Clone {
    move |req, next| Box::pin(enforce_permission(permission, req, next))
}
