/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: HS256 access and refresh tokens carrying the caller identity
/// - [`middleware`]: Axum bearer-token middleware and the `AuthContext` extractor
/// - [`authorization`]: The role → permission table and permission checks
///
/// # Example
///
/// ```no_run
/// use orgtask_shared::auth::authorization::{authorize, Permission};
/// use orgtask_shared::auth::jwt::{validate_access_token};
/// use orgtask_shared::auth::middleware::AuthContext;
///
/// # fn example(token: &str, secret: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let caller = AuthContext::from(validate_access_token(token, secret)?);
/// authorize(Some(&caller), Permission::TaskCreate)?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
