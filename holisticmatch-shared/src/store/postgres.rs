/// PostgreSQL store
///
/// Thin layer over the model queries. Multi-row writes open an explicit
/// transaction and commit only after every statement succeeded; dropping the
/// transaction on an early `?` rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use super::{NewRegistration, Registered, Store, StoreError};
use crate::db::pool::ping;
use crate::models::{
    account::Account,
    professional::{Professional, ProfessionalFields, ProfessionalFilter},
    token::{PasswordResetToken, TokenDraft, VerificationToken},
};

/// [`Store`] backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        ping(&self.pool).await?;
        Ok(())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(Account::email_exists(&self.pool, email).await?)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(Account::find_by_email(&self.pool, email).await?)
    }

    async fn find_account(&self, id: i64) -> Result<Option<Account>, StoreError> {
        Ok(Account::find_by_id(&self.pool, id).await?)
    }

    async fn is_account_active(&self, id: i64) -> Result<bool, StoreError> {
        Ok(Account::is_active(&self.pool, id).await?.unwrap_or(false))
    }

    async fn record_login(&self, id: i64) -> Result<(), StoreError> {
        Ok(Account::update_last_login(&self.pool, id).await?)
    }

    async fn create_registration(&self, registration: NewRegistration) -> Result<Registered, StoreError> {
        let mut tx = self.pool.begin().await?;

        let account = Account::create(&mut *tx, registration.account).await?;
        let professional = Professional::create(&mut *tx, account.id, &registration.profile).await?;
        let verification =
            VerificationToken::upsert(&mut *tx, account.id, &registration.verification).await?;

        tx.commit().await?;

        debug!(account_id = account.id, professional_id = professional.id, "Registration committed");

        Ok(Registered {
            account,
            professional,
            verification,
        })
    }

    async fn upsert_verification_token(
        &self,
        account_id: i64,
        draft: &TokenDraft,
    ) -> Result<VerificationToken, StoreError> {
        Ok(VerificationToken::upsert(&self.pool, account_id, draft).await?)
    }

    async fn find_verification_token(&self, token_hash: &str) -> Result<Option<VerificationToken>, StoreError> {
        Ok(VerificationToken::find_by_hash(&self.pool, token_hash).await?)
    }

    async fn verify_and_activate(&self, token_id: i64, token_hash: &str) -> Result<VerificationToken, StoreError> {
        let mut tx = self.pool.begin().await?;

        let account_id = VerificationToken::mark_verified(&mut *tx, token_id, token_hash)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("verification token {}", token_id)))?;

        if !Account::activate(&mut *tx, account_id).await? {
            return Err(StoreError::NotFound(format!("account {}", account_id)));
        }

        let token = sqlx::query_as::<_, VerificationToken>(
            "SELECT id, account_id, token_hash, created_at, expires_at, verified \
             FROM email_verification_tokens WHERE id = $1",
        )
        .bind(token_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(token)
    }

    async fn upsert_reset_token(
        &self,
        account_id: i64,
        draft: &TokenDraft,
    ) -> Result<PasswordResetToken, StoreError> {
        Ok(PasswordResetToken::upsert(&self.pool, account_id, draft).await?)
    }

    async fn find_reset_token(&self, token_hash: &str) -> Result<Option<PasswordResetToken>, StoreError> {
        Ok(PasswordResetToken::find_by_hash(&self.pool, token_hash).await?)
    }

    async fn consume_reset_token(
        &self,
        token_id: i64,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // The conditional UPDATE takes the row lock; a concurrent claimer
        // blocks here and then sees used = TRUE.
        let Some(account_id) = PasswordResetToken::claim(&mut *tx, token_id, token_hash, now).await? else {
            return Ok(None);
        };

        let account = Account::set_password_hash(&mut *tx, account_id, password_hash)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("account {}", account_id)))?;

        tx.commit().await?;

        Ok(Some(account))
    }

    async fn find_professional(&self, id: i64) -> Result<Option<Professional>, StoreError> {
        Ok(Professional::find_by_id(&self.pool, id).await?)
    }

    async fn find_professional_by_account(&self, account_id: i64) -> Result<Option<Professional>, StoreError> {
        Ok(Professional::find_by_account(&self.pool, account_id).await?)
    }

    async fn list_professionals(
        &self,
        filter: &ProfessionalFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Professional>, i64), StoreError> {
        let total = Professional::count(&self.pool, filter).await?;
        let rows = Professional::list(&self.pool, filter, limit, offset).await?;

        Ok((rows, total))
    }

    async fn update_professional(
        &self,
        id: i64,
        fields: &ProfessionalFields,
    ) -> Result<Option<Professional>, StoreError> {
        Ok(Professional::update(&self.pool, id, fields).await?)
    }

    async fn set_professional_photo(
        &self,
        id: i64,
        photo_url: Option<&str>,
    ) -> Result<Option<Professional>, StoreError> {
        Ok(Professional::set_photo_url(&self.pool, id, photo_url).await?)
    }

    async fn delete_professional(&self, id: i64) -> Result<bool, StoreError> {
        Ok(Professional::delete(&self.pool, id).await?)
    }
}
