/// Middleware modules for the API server
///
/// - `security`: Security response headers
/// - `permission`: Per-route permission checks
/// - `request_meta`: Client IP and user agent for audit entries

pub mod permission;
pub mod request_meta;
pub mod security;
