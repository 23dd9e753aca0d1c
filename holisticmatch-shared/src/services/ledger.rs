/// Token ledger: one-time tokens for email verification and password reset
///
/// Plaintext tokens exist only in the issuing call's return value and in the
/// outgoing email. The store sees the SHA-256 hash, which is also the lookup
/// key.
///
/// # Semantics
///
/// | | Verification | Reset |
/// |---|---|---|
/// | Already consumed | success, no writes | `InvalidOrExpired` |
/// | Expired | `Expired` | `InvalidOrExpired` |
/// | Writes on success | token `verified`, account `is_active` | token `used`, password hash |
///
/// Issuing replaces the account's previous token of the same purpose.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::password::{hash_password_async, PasswordError};
use crate::auth::token::{generate_token, hash_token, validate_token_format, verify_token};
use crate::models::{
    account::Account,
    token::{OneTimeToken, PasswordResetToken, TokenDraft, VerificationToken},
};
use crate::services::settings::AuthSettings;
use crate::store::{Store, StoreError};

/// Error type for ledger operations
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// No token with this value exists (or it was superseded)
    #[error("Token not found")]
    NotFound,

    /// Verification token past its expiry and never used
    #[error("Token has expired")]
    Expired,

    /// Reset token already used or past its expiry
    #[error("Token is invalid or has expired")]
    InvalidOrExpired,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A stored token together with the plaintext to deliver
#[derive(Debug, Clone)]
pub struct IssuedToken<T> {
    pub plaintext: String,
    pub record: T,
}

/// Issues, looks up and consumes one-time tokens
#[derive(Clone)]
pub struct TokenLedger {
    store: Arc<dyn Store>,
    settings: Arc<AuthSettings>,
}

impl TokenLedger {
    pub fn new(store: Arc<dyn Store>, settings: Arc<AuthSettings>) -> Self {
        Self { store, settings }
    }

    /// Generates a token valid for `ttl` from now
    ///
    /// Returns the plaintext and the draft to persist.
    pub fn mint(ttl: Duration) -> (String, TokenDraft) {
        Self::mint_at(Utc::now(), ttl)
    }

    fn mint_at(now: DateTime<Utc>, ttl: Duration) -> (String, TokenDraft) {
        let (plaintext, token_hash) = generate_token();

        let draft = TokenDraft {
            token_hash,
            created_at: now,
            expires_at: now + ttl,
        };

        (plaintext, draft)
    }

    /// Draft for a new verification token using the configured lifetime
    pub fn verification_draft(&self) -> (String, TokenDraft) {
        Self::mint(self.settings.verification_ttl)
    }

    /// Replaces the account's verification token with a fresh one
    pub async fn issue_verification(
        &self,
        account_id: i64,
    ) -> Result<IssuedToken<VerificationToken>, LedgerError> {
        let (plaintext, draft) = self.verification_draft();
        let record = self.store.upsert_verification_token(account_id, &draft).await?;

        debug!(account_id, expires_at = %record.expires_at, "Issued verification token");

        Ok(IssuedToken { plaintext, record })
    }

    /// Replaces the account's reset token with a fresh one
    pub async fn issue_reset(&self, account_id: i64) -> Result<IssuedToken<PasswordResetToken>, LedgerError> {
        let (plaintext, draft) = Self::mint(self.settings.reset_ttl);
        let record = self.store.upsert_reset_token(account_id, &draft).await?;

        debug!(account_id, expires_at = %record.expires_at, "Issued password reset token");

        Ok(IssuedToken { plaintext, record })
    }

    /// Mints a verification token and reads its hash back, persisting nothing
    ///
    /// Used when there is no account to bind a token to: the same mint and
    /// one indexed read on the same table, in place of the upsert.
    pub async fn issue_unbound_verification(&self) -> Result<(), LedgerError> {
        let (_, draft) = self.verification_draft();
        self.store.find_verification_token(&draft.token_hash).await?;
        Ok(())
    }

    /// [`TokenLedger::issue_unbound_verification`] for the reset table
    pub async fn issue_unbound_reset(&self) -> Result<(), LedgerError> {
        let (_, draft) = Self::mint(self.settings.reset_ttl);
        self.store.find_reset_token(&draft.token_hash).await?;
        Ok(())
    }

    pub async fn lookup_verification(&self, token: &str) -> Result<VerificationToken, LedgerError> {
        if !validate_token_format(token) {
            return Err(LedgerError::NotFound);
        }

        let record = self
            .store
            .find_verification_token(&hash_token(token))
            .await?
            .ok_or(LedgerError::NotFound)?;

        confirm(token, record)
    }

    pub async fn lookup_reset(&self, token: &str) -> Result<PasswordResetToken, LedgerError> {
        if !validate_token_format(token) {
            return Err(LedgerError::NotFound);
        }

        let record = self
            .store
            .find_reset_token(&hash_token(token))
            .await?
            .ok_or(LedgerError::NotFound)?;

        confirm(token, record)
    }

    /// Verifies an email address and activates the account
    ///
    /// Re-submitting an already verified token succeeds without writing.
    ///
    /// # Errors
    ///
    /// - `LedgerError::NotFound` for unknown or superseded tokens
    /// - `LedgerError::Expired` for unverified tokens past their expiry
    pub async fn consume_verification(&self, token: &str) -> Result<VerificationToken, LedgerError> {
        let record = self.lookup_verification(token).await?;

        if record.verified {
            debug!(account_id = record.account_id, "Verification token already used");
            return Ok(record);
        }

        if !record.is_valid_at(Utc::now()) {
            return Err(LedgerError::Expired);
        }

        let verified = self
            .store
            .verify_and_activate(record.id, &record.token_hash)
            .await
            .map_err(|e| match e {
                // replaced by a resend between lookup and update
                StoreError::NotFound(_) => LedgerError::NotFound,
                other => LedgerError::Store(other),
            })?;

        info!(account_id = verified.account_id, "Email verified, account activated");

        Ok(verified)
    }

    /// Sets a new password using a reset token; the token dies with it
    ///
    /// `new_password` must already satisfy the password policy.
    ///
    /// # Errors
    ///
    /// - `LedgerError::NotFound` for unknown or superseded tokens
    /// - `LedgerError::InvalidOrExpired` when used, expired, or lost to a
    ///   concurrent confirmation
    pub async fn consume_reset(&self, token: &str, new_password: &str) -> Result<Account, LedgerError> {
        let record = self.lookup_reset(token).await?;

        if !record.is_valid_at(Utc::now()) {
            return Err(LedgerError::InvalidOrExpired);
        }

        let password_hash = hash_password_async(new_password.to_string(), self.settings.hash_params).await?;

        let account = self
            .store
            .consume_reset_token(record.id, &record.token_hash, &password_hash, Utc::now())
            .await?
            .ok_or(LedgerError::InvalidOrExpired)?;

        info!(account_id = account.id, "Password reset completed");

        Ok(account)
    }
}

/// Constant-time check that the stored hash really belongs to `token`
fn confirm<T: OneTimeToken>(token: &str, record: T) -> Result<T, LedgerError> {
    if verify_token(token, record.token_hash()) {
        Ok(record)
    } else {
        Err(LedgerError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::models::account::CreateAccount;
    use crate::models::professional::{AttendanceType, ProfessionalFields};
    use crate::store::{memory::MemoryStore, NewRegistration};

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    async fn setup(settings: AuthSettings) -> (Arc<MemoryStore>, TokenLedger, i64) {
        let store = Arc::new(MemoryStore::new());
        let ledger = TokenLedger::new(store.clone(), Arc::new(settings));

        let (_, draft) = TokenLedger::mint(Duration::hours(24));
        let registered = store
            .create_registration(NewRegistration {
                account: CreateAccount {
                    email: "alice@example.com".to_string(),
                    password_hash: "$argon2id$stub".to_string(),
                },
                profile: ProfessionalFields {
                    name: "Alice Souza".to_string(),
                    bio: "b".repeat(60),
                    services: vec!["Reiki".to_string()],
                    city: "Santos".to_string(),
                    state: "SP".to_string(),
                    price_per_session: 120.0,
                    attendance_type: AttendanceType::Online,
                    whatsapp: None,
                    email: "alice@example.com".to_string(),
                    phone: None,
                },
                verification: draft,
            })
            .await
            .unwrap();

        (store, ledger, registered.account.id)
    }

    #[test]
    fn test_mint_sets_expiry_from_ttl() {
        let now = Utc::now();
        let (plaintext, draft) = TokenLedger::mint_at(now, Duration::hours(24));

        assert_eq!(draft.expires_at - draft.created_at, Duration::hours(24));
        assert_eq!(draft.token_hash, hash_token(&plaintext));
        assert!(validate_token_format(&plaintext));
    }

    #[tokio::test]
    async fn test_unbound_issue_persists_nothing() {
        let (store, ledger, account_id) = setup(AuthSettings::for_tests(SECRET)).await;
        let before = store.verification_tokens_for(account_id).await;

        ledger.issue_unbound_verification().await.unwrap();
        ledger.issue_unbound_reset().await.unwrap();

        assert_eq!(store.verification_tokens_for(account_id).await, before);
        assert_eq!(store.account_count().await, 1);
    }

    #[tokio::test]
    async fn test_consume_verification_activates_once() {
        let (store, ledger, account_id) = setup(AuthSettings::for_tests(SECRET)).await;
        let issued = ledger.issue_verification(account_id).await.unwrap();

        let first = ledger.consume_verification(&issued.plaintext).await.unwrap();
        assert!(first.verified);
        assert!(store.is_account_active(account_id).await.unwrap());

        let again = ledger.consume_verification(&issued.plaintext).await.unwrap();
        assert_eq!(again, first);
    }

    #[tokio::test]
    async fn test_new_verification_token_supersedes_old() {
        let (_, ledger, account_id) = setup(AuthSettings::for_tests(SECRET)).await;
        let old = ledger.issue_verification(account_id).await.unwrap();
        let new = ledger.issue_verification(account_id).await.unwrap();

        assert!(matches!(
            ledger.consume_verification(&old.plaintext).await,
            Err(LedgerError::NotFound)
        ));
        assert!(ledger.consume_verification(&new.plaintext).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_verification_token() {
        let settings = AuthSettings {
            verification_ttl: Duration::seconds(-1),
            ..AuthSettings::for_tests(SECRET)
        };
        let (store, ledger, account_id) = setup(settings).await;
        let issued = ledger.issue_verification(account_id).await.unwrap();

        assert!(matches!(
            ledger.consume_verification(&issued.plaintext).await,
            Err(LedgerError::Expired)
        ));
        assert!(!store.is_account_active(account_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_tokens() {
        let (_, ledger, _) = setup(AuthSettings::for_tests(SECRET)).await;
        let (unknown, _) = TokenLedger::mint(Duration::hours(1));

        assert!(matches!(ledger.consume_verification(&unknown).await, Err(LedgerError::NotFound)));
        assert!(matches!(ledger.consume_verification("short").await, Err(LedgerError::NotFound)));
        assert!(matches!(
            ledger.consume_reset("../../etc/passwd", "NewPass2B").await,
            Err(LedgerError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_consume_reset_is_single_use() {
        let (store, ledger, account_id) = setup(AuthSettings::for_tests(SECRET)).await;
        let issued = ledger.issue_reset(account_id).await.unwrap();

        let account = ledger.consume_reset(&issued.plaintext, "NewPass2B").await.unwrap();
        assert!(verify_password("NewPass2B", &account.password_hash).unwrap());

        assert!(matches!(
            ledger.consume_reset(&issued.plaintext, "Other3C99").await,
            Err(LedgerError::InvalidOrExpired)
        ));

        let stored = store.find_account(account_id).await.unwrap().unwrap();
        assert!(verify_password("NewPass2B", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_expired_reset_token() {
        let settings = AuthSettings {
            reset_ttl: Duration::seconds(-1),
            ..AuthSettings::for_tests(SECRET)
        };
        let (_, ledger, account_id) = setup(settings).await;
        let issued = ledger.issue_reset(account_id).await.unwrap();

        assert!(matches!(
            ledger.consume_reset(&issued.plaintext, "NewPass2B").await,
            Err(LedgerError::InvalidOrExpired)
        ));
    }

    #[tokio::test]
    async fn test_reset_does_not_touch_activation() {
        let (store, ledger, account_id) = setup(AuthSettings::for_tests(SECRET)).await;
        let issued = ledger.issue_reset(account_id).await.unwrap();

        ledger.consume_reset(&issued.plaintext, "NewPass2B").await.unwrap();

        assert!(!store.is_account_active(account_id).await.unwrap());
    }
}
