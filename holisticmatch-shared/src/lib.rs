//! # HolisticMatch Shared Library
//!
//! Domain types, persistence and account services used by the HolisticMatch
//! API server.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, session JWTs and one-time token primitives
//! - `catalog`: Service catalogue, state codes and city directory
//! - `db`: Connection pool and embedded migrations
//! - `models`: Database models and their queries
//! - `services`: Token ledger, authentication, registration, profiles
//! - `store`: Persistence seam (PostgreSQL and in-memory)
//! - `validation`: Profile field rules

pub mod auth;
pub mod catalog;
pub mod db;
pub mod models;
pub mod services;
pub mod store;
pub mod validation;

/// Current version of the HolisticMatch shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
