/// Middleware modules for the API server
///
/// - `auth`: bearer token validation for owner-only routes
/// - `security`: security response headers

pub mod auth;
pub mod security;
