/// Persistence seam
///
/// Services talk to storage only through [`Store`]. Each method is one unit
/// of work; anything that must land all-or-nothing is a single method so the
/// implementation can wrap it in one transaction:
///
/// - [`Store::create_registration`]: account + profile + verification token
/// - [`Store::verify_and_activate`]: token `verified` + account `is_active`
/// - [`Store::consume_reset_token`]: token `used` + new password hash, guarded
///   so that exactly one concurrent caller wins
///
/// # Implementations
///
/// - [`postgres::PgStore`]: production, backed by `sqlx` and PostgreSQL
/// - [`memory::MemoryStore`]: tests and local development
///
/// # Example
///
/// ```no_run
/// use holisticmatch_shared::store::{memory::MemoryStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// assert!(!store.email_exists("nobody@example.com").await?);
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    account::{Account, CreateAccount},
    professional::{Professional, ProfessionalFields, ProfessionalFilter},
    token::{PasswordResetToken, TokenDraft, VerificationToken},
};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// The row a write depends on has disappeared
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    /// True when the violated constraint guards account emails
    pub fn is_email_conflict(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint } if constraint.contains("email"))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                }
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Everything registration writes in one transaction
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub account: CreateAccount,
    pub profile: ProfessionalFields,
    pub verification: TokenDraft,
}

/// Result of a committed registration
#[derive(Debug, Clone)]
pub struct Registered {
    pub account: Account,
    pub professional: Professional,
    pub verification: VerificationToken,
}

/// Storage operations used by the services
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Connectivity check behind `GET /health`
    async fn ping(&self) -> Result<(), StoreError>;

    // ----- accounts -----

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_account(&self, id: i64) -> Result<Option<Account>, StoreError>;

    /// Authoritative read of the activation flag; never cached
    ///
    /// Unknown accounts read as inactive.
    async fn is_account_active(&self, id: i64) -> Result<bool, StoreError>;

    async fn record_login(&self, id: i64) -> Result<(), StoreError>;

    /// Creates the inactive account, its profile and its first verification
    /// token atomically
    ///
    /// # Errors
    ///
    /// `StoreError::UniqueViolation` on a duplicate email, in which case
    /// nothing was written.
    async fn create_registration(&self, registration: NewRegistration) -> Result<Registered, StoreError>;

    // ----- verification tokens -----

    /// Replaces the account's verification token
    async fn upsert_verification_token(
        &self,
        account_id: i64,
        draft: &TokenDraft,
    ) -> Result<VerificationToken, StoreError>;

    async fn find_verification_token(&self, token_hash: &str) -> Result<Option<VerificationToken>, StoreError>;

    /// Marks the token verified and activates its account in one transaction
    ///
    /// Only the row still holding `token_hash` qualifies; a token replaced
    /// since it was read is `StoreError::NotFound` and nothing is written.
    async fn verify_and_activate(&self, token_id: i64, token_hash: &str) -> Result<VerificationToken, StoreError>;

    // ----- password reset tokens -----

    /// Replaces the account's reset token
    async fn upsert_reset_token(
        &self,
        account_id: i64,
        draft: &TokenDraft,
    ) -> Result<PasswordResetToken, StoreError>;

    async fn find_reset_token(&self, token_hash: &str) -> Result<Option<PasswordResetToken>, StoreError>;

    /// Marks the token used and stores the new password hash in one
    /// transaction, only if the row still holds `token_hash` unused and
    /// unexpired at `now`
    ///
    /// Returns `None` when the token was already spent, expired or replaced;
    /// the password is untouched in that case.
    async fn consume_reset_token(
        &self,
        token_id: i64,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError>;

    // ----- professionals -----

    async fn find_professional(&self, id: i64) -> Result<Option<Professional>, StoreError>;

    async fn find_professional_by_account(&self, account_id: i64) -> Result<Option<Professional>, StoreError>;

    /// One page of matching profiles, newest first, plus the total match count
    async fn list_professionals(
        &self,
        filter: &ProfessionalFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Professional>, i64), StoreError>;

    async fn update_professional(
        &self,
        id: i64,
        fields: &ProfessionalFields,
    ) -> Result<Option<Professional>, StoreError>;

    async fn set_professional_photo(
        &self,
        id: i64,
        photo_url: Option<&str>,
    ) -> Result<Option<Professional>, StoreError>;

    /// Removes the profile; the account stays
    async fn delete_professional(&self, id: i64) -> Result<bool, StoreError>;
}
