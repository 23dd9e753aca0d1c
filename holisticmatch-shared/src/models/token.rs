/// One-time token records
///
/// Email-verification and password-reset tokens share a shape but live in
/// separate tables with separate rules:
///
/// - a verification token stays queryable after it is consumed, and
///   re-verifying it is a harmless no-op;
/// - a reset token is strictly single use: once `used`, it is dead.
///
/// Each account holds at most one row per table. Issuing a new token upserts
/// on `account_id`, which silently invalidates the previous one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE email_verification_tokens (
///     id BIGSERIAL PRIMARY KEY,
///     account_id BIGINT NOT NULL UNIQUE REFERENCES accounts(id) ON DELETE CASCADE,
///     token_hash CHAR(64) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     expires_at TIMESTAMPTZ NOT NULL,
///     verified BOOLEAN NOT NULL DEFAULT FALSE
/// );
/// -- password_reset_tokens is identical with `used` in place of `verified`
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Common view over both token kinds
pub trait OneTimeToken {
    fn account_id(&self) -> i64;
    fn token_hash(&self) -> &str;
    fn expires_at(&self) -> DateTime<Utc>;

    /// `verified` for verification tokens, `used` for reset tokens
    fn is_consumed(&self) -> bool;

    /// True once `now` is past `expires_at`, regardless of consumption
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }

    /// True iff not consumed and `now` is before `expires_at`
    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_consumed() && now < self.expires_at()
    }

    fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

/// Email-verification token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VerificationToken {
    pub id: i64,
    pub account_id: i64,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
}

/// Password-reset token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PasswordResetToken {
    pub id: i64,
    pub account_id: i64,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

/// A freshly minted token, not yet bound to a row
///
/// Registration builds one before the account exists so that account,
/// profile and token can be written in a single transaction.
#[derive(Debug, Clone)]
pub struct TokenDraft {
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OneTimeToken for VerificationToken {
    fn account_id(&self) -> i64 {
        self.account_id
    }

    fn token_hash(&self) -> &str {
        &self.token_hash
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    fn is_consumed(&self) -> bool {
        self.verified
    }
}

impl OneTimeToken for PasswordResetToken {
    fn account_id(&self) -> i64 {
        self.account_id
    }

    fn token_hash(&self) -> &str {
        &self.token_hash
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    fn is_consumed(&self) -> bool {
        self.used
    }
}

impl VerificationToken {
    /// Replaces the account's verification token with `draft`
    pub async fn upsert<'e, E: PgExecutor<'e>>(
        executor: E,
        account_id: i64,
        draft: &TokenDraft,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, VerificationToken>(
            r#"
            INSERT INTO email_verification_tokens (account_id, token_hash, created_at, expires_at, verified)
            VALUES ($1, $2, $3, $4, FALSE)
            ON CONFLICT (account_id) DO UPDATE
               SET token_hash = EXCLUDED.token_hash,
                   created_at = EXCLUDED.created_at,
                   expires_at = EXCLUDED.expires_at,
                   verified = FALSE
            RETURNING id, account_id, token_hash, created_at, expires_at, verified
            "#,
        )
        .bind(account_id)
        .bind(&draft.token_hash)
        .bind(draft.created_at)
        .bind(draft.expires_at)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_hash<'e, E: PgExecutor<'e>>(
        executor: E,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, VerificationToken>(
            r#"
            SELECT id, account_id, token_hash, created_at, expires_at, verified
            FROM email_verification_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(executor)
        .await
    }

    /// Marks the token verified and returns its account id
    ///
    /// Matches on the hash as well as the id: a re-issue keeps the row id, so
    /// `None` here also means the token was superseded after it was read.
    pub async fn mark_verified<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
        token_hash: &str,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE email_verification_tokens
               SET verified = TRUE
             WHERE id = $1 AND token_hash = $2
            RETURNING account_id
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .fetch_optional(executor)
        .await
    }
}

impl PasswordResetToken {
    /// Replaces the account's reset token with `draft`
    pub async fn upsert<'e, E: PgExecutor<'e>>(
        executor: E,
        account_id: i64,
        draft: &TokenDraft,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PasswordResetToken>(
            r#"
            INSERT INTO password_reset_tokens (account_id, token_hash, created_at, expires_at, used)
            VALUES ($1, $2, $3, $4, FALSE)
            ON CONFLICT (account_id) DO UPDATE
               SET token_hash = EXCLUDED.token_hash,
                   created_at = EXCLUDED.created_at,
                   expires_at = EXCLUDED.expires_at,
                   used = FALSE
            RETURNING id, account_id, token_hash, created_at, expires_at, used
            "#,
        )
        .bind(account_id)
        .bind(&draft.token_hash)
        .bind(draft.created_at)
        .bind(draft.expires_at)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_hash<'e, E: PgExecutor<'e>>(
        executor: E,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PasswordResetToken>(
            r#"
            SELECT id, account_id, token_hash, created_at, expires_at, used
            FROM password_reset_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(executor)
        .await
    }

    /// Flips `used` only if the row still holds this token, unused and unexpired
    ///
    /// Returns the account id when this call won; `None` means the token was
    /// spent, expired or replaced by a newer request, possibly concurrently.
    pub async fn claim<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE password_reset_tokens
               SET used = TRUE
             WHERE id = $1 AND token_hash = $2 AND used = FALSE AND expires_at > $3
            RETURNING account_id
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(now)
        .fetch_optional(executor)
        .await
    }
}
