//! # Taskmate Shared Library
//!
//! Data layer and business rules shared by the Taskmate API server.
//!
//! ## Module Organization
//!
//! - `db`: connection pool and embedded migrations
//! - `models`: tenant, user, task and comment records
//! - `scope`: tenant-scoped façade, the only public path to tasks and comments
//! - `lifecycle`: ACTIVE/OVERDUE/DONE rules and the overdue sweep
//! - `account`: registration and login
//! - `auth`: password hashing and session tokens
//! - `timezone`: the supported timezone table
//! - `clock`: injectable time source
//! - `error`: common error types

pub mod account;
pub mod auth;
pub mod clock;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod scope;
pub mod timezone;

/// Current version of the Taskmate shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
