/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, token refresh
/// - `tasks`: Organization-scoped task CRUD
/// - `audit_logs`: Audit trail reads
/// - `organizations`: Child organization creation
/// - `users`: User creation

pub mod audit_logs;
pub mod auth;
pub mod health;
pub mod organizations;
pub mod tasks;
pub mod users;
