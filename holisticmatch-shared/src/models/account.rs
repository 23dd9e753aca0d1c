/// Account model and database operations
///
/// An account is the authentication identity: email, Argon2id hash and the
/// activation flag. Accounts start inactive and are activated only by
/// consuming an email-verification token (see `services::ledger`).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id BIGSERIAL PRIMARY KEY,
///     email VARCHAR(254) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// All queries take any [`PgExecutor`], so they run equally against the pool
/// or inside a transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Authentication identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: i64,

    /// Normalized (trimmed, lowercase) email, unique across accounts
    pub email: String,

    /// Argon2id PHC string. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// `false` until the email address is verified
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating an account
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub email: String,
    pub password_hash: String,
}

/// Normalizes an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

const ACCOUNT_COLUMNS: &str =
    "id, email, password_hash, is_active, created_at, updated_at, last_login_at";

impl Account {
    /// Inserts a new inactive account
    ///
    /// # Errors
    ///
    /// Fails with a unique-violation database error when the email is taken.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: CreateAccount,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO accounts (email, password_hash, is_active) VALUES ($1, $2, FALSE) RETURNING {}",
            ACCOUNT_COLUMNS
        );

        sqlx::query_as::<_, Account>(&sql)
            .bind(normalize_email(&data.email))
            .bind(data.password_hash)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);

        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_email<'e, E: PgExecutor<'e>>(
        executor: E,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {} FROM accounts WHERE email = $1", ACCOUNT_COLUMNS);

        sqlx::query_as::<_, Account>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(executor)
            .await
    }

    pub async fn email_exists<'e, E: PgExecutor<'e>>(
        executor: E,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM accounts WHERE email = $1)")
            .bind(normalize_email(email))
            .fetch_one(executor)
            .await
    }

    /// Reads the activation flag straight from the table
    ///
    /// Returns `None` when the account does not exist.
    pub async fn is_active<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<bool>, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT is_active FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Sets `is_active = TRUE`. Idempotent; there is no way back.
    pub async fn activate<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE accounts SET is_active = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_password_hash<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
        password_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE accounts SET password_hash = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        );

        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(password_hash)
            .fetch_optional(executor)
            .await
    }

    pub async fn update_last_login<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE accounts SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }
}
