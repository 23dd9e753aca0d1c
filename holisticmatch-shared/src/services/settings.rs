/// Settings handed to the account services at construction

use chrono::Duration;

use crate::auth::password::HashParams;

/// Signing key, lifetimes and hashing cost for the account services
///
/// Built once by the binary from its configuration. Nothing reads global
/// state after that.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// HMAC secret for session tokens
    pub jwt_secret: String,

    /// Access token lifetime
    pub access_ttl: Duration,

    /// Refresh token lifetime
    pub refresh_ttl: Duration,

    /// Email-verification token lifetime
    pub verification_ttl: Duration,

    /// Password-reset token lifetime
    pub reset_ttl: Duration,

    /// Argon2id cost for new password hashes
    pub hash_params: HashParams,
}

impl AuthSettings {
    /// Production lifetimes: 24h access, 7 days refresh, 24h for both one-time tokens
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_ttl: Duration::hours(24),
            refresh_ttl: Duration::hours(168),
            verification_ttl: Duration::hours(24),
            reset_ttl: Duration::hours(24),
            hash_params: HashParams::default(),
        }
    }

    /// Same lifetimes with cheap hashing, for tests
    pub fn for_tests(jwt_secret: impl Into<String>) -> Self {
        Self {
            hash_params: HashParams::fast_insecure(),
            ..Self::new(jwt_secret)
        }
    }
}
