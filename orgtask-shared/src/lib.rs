//! # OrgTask Shared Library
//!
//! Domain types, storage and business logic used by the OrgTask API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries
//! - `db`: Connection pool and migrations
//! - `store`: Storage traits with PostgreSQL and in-memory backends
//! - `auth`: Passwords, JWTs, the role permission table and the auth middleware
//! - `services`: Task access, audit trail, accounts and administration
//! - `seed`: Idempotent demo dataset

pub mod auth;
pub mod db;
pub mod models;
pub mod seed;
pub mod services;
pub mod store;

/// Current version of the OrgTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
