/// Authentication service: login, refresh, current account
///
/// # Login gate
///
/// 1. Email and password must both be present (`MissingFields`)
/// 2. Unknown email: a dummy Argon2 verification runs anyway, then
///    `InvalidCredentials`
/// 3. Wrong password, or a stored hash that does not parse:
///    `InvalidCredentials`, same response as (2)
/// 4. Correct password, activation flag re-read from the store: `NotActivated`
///    while unverified
/// 5. Otherwise an access/refresh pair is issued
///
/// Steps 2 and 3 are indistinguishable to the caller in content and, within
/// noise, in latency.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::auth::jwt::{create_token, validate_access_token, validate_refresh_token, Claims, JwtError, TokenType};
use crate::auth::password::{hash_password, verify_password_async, PasswordError};
use crate::models::{
    account::{normalize_email, Account},
    professional::Professional,
};
use crate::services::settings::AuthSettings;
use crate::store::{Store, StoreError};

/// Error type for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingFields,

    /// Unknown email or wrong password; deliberately not distinguished
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account not activated; check your email for the verification link")]
    NotActivated,

    /// Refresh token rejected for any reason
    #[error("Invalid or expired refresh token")]
    InvalidToken,

    /// Access token missing, invalid or bound to a vanished account
    #[error("Authentication required")]
    Unauthenticated,

    /// Valid session but the account has no professional profile
    #[error("Professional profile not found")]
    ProfileMissing,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Minimal account view returned with a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    pub id: i64,
    pub email: String,

    /// Profile display name, when a profile exists
    pub name: Option<String>,
}

/// Successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub access: String,
    pub refresh: String,
    pub user: AccountSummary,
}

/// Account resolved from an access token, with its profile
#[derive(Debug, Clone)]
pub struct CurrentAccount {
    pub account: Account,
    pub professional: Professional,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    settings: Arc<AuthSettings>,

    /// Verified against when the email is unknown
    dummy_hash: Arc<str>,
}

impl AuthService {
    /// Builds the service; computes the dummy hash with the configured cost
    pub fn new(store: Arc<dyn Store>, settings: Arc<AuthSettings>) -> Result<Self, AuthError> {
        let dummy_hash = hash_password("holisticmatch-dummy-password", &settings.hash_params)?;

        Ok(Self {
            store,
            settings,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Exchanges credentials for a session pair
    ///
    /// # Errors
    ///
    /// `MissingFields`, `InvalidCredentials` or `NotActivated` for caller
    /// mistakes; store and hashing failures pass through.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let Some(account) = self.store.find_account_by_email(&email).await? else {
            // Equalize timing with the wrong-password path
            let _ = verify_password_async(password.to_string(), self.dummy_hash.to_string()).await;
            debug!("Login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let matches = match verify_password_async(password.to_string(), account.password_hash.clone()).await {
            Ok(matches) => matches,
            Err(PasswordError::InvalidHash(reason)) => {
                // The caller sees a wrong password; the dummy run keeps the latency comparable
                error!(account_id = account.id, %reason, "Stored password hash is unreadable");
                let _ = verify_password_async(password.to_string(), self.dummy_hash.to_string()).await;
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if !matches {
            warn!(account_id = account.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !self.store.is_account_active(account.id).await? {
            info!(account_id = account.id, "Login refused: account not activated");
            return Err(AuthError::NotActivated);
        }

        let access = self.issue(account.id, TokenType::Access)?;
        let refresh = self.issue(account.id, TokenType::Refresh)?;

        if let Err(e) = self.store.record_login(account.id).await {
            warn!(account_id = account.id, error = %e, "Failed to record last login");
        }

        let name = self
            .store
            .find_professional_by_account(account.id)
            .await?
            .map(|p| p.name);

        info!(account_id = account.id, "Login succeeded");

        Ok(LoginOutcome {
            access,
            refresh,
            user: AccountSummary {
                id: account.id,
                email: account.email,
                name,
            },
        })
    }

    /// Mints a new access token from a refresh token
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = validate_refresh_token(refresh_token, &self.settings.jwt_secret).map_err(|e| {
            debug!(error = %e, "Refresh token rejected");
            AuthError::InvalidToken
        })?;
        let account_id = claims.account_id().map_err(|_| AuthError::InvalidToken)?;

        self.issue(account_id, TokenType::Access)
    }

    /// Account id carried by a valid access token; no store access
    pub fn authenticate(&self, access_token: &str) -> Result<i64, AuthError> {
        validate_access_token(access_token, &self.settings.jwt_secret)
            .and_then(|claims| claims.account_id())
            .map_err(|e| {
                debug!(error = %e, "Access token rejected");
                AuthError::Unauthenticated
            })
    }

    /// Resolves an access token to its account and profile
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` for a bad token or an account that no longer exists
    /// - `ProfileMissing` when the account has no profile
    pub async fn current_account(&self, access_token: &str) -> Result<CurrentAccount, AuthError> {
        let account_id = self.authenticate(access_token)?;
        self.account_with_profile(account_id).await
    }

    /// [`AuthService::current_account`] for an already authenticated id
    pub async fn account_with_profile(&self, account_id: i64) -> Result<CurrentAccount, AuthError> {
        let account = self
            .store
            .find_account(account_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        let professional = self
            .store
            .find_professional_by_account(account.id)
            .await?
            .ok_or(AuthError::ProfileMissing)?;

        Ok(CurrentAccount { account, professional })
    }

    fn issue(&self, account_id: i64, token_type: TokenType) -> Result<String, AuthError> {
        let ttl = match token_type {
            TokenType::Access => self.settings.access_ttl,
            TokenType::Refresh => self.settings.refresh_ttl,
        };

        Ok(create_token(
            &Claims::new(account_id, token_type, ttl),
            &self.settings.jwt_secret,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::{hash_password, HashParams};
    use crate::models::account::CreateAccount;
    use crate::models::token::VerificationToken;
    use crate::models::professional::{AttendanceType, ProfessionalFields};
    use crate::services::ledger::TokenLedger;
    use crate::store::{memory::MemoryStore, NewRegistration};
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    struct Fixture {
        store: Arc<MemoryStore>,
        auth: AuthService,
        account_id: i64,
        verification: VerificationToken,
    }

    impl Fixture {
        async fn activate(&self) {
            self.store
                .verify_and_activate(self.verification.id, &self.verification.token_hash)
                .await
                .unwrap();
        }
    }

    async fn fixture() -> Fixture {
        fixture_with_hash(hash_password("Secret1A", &HashParams::fast_insecure()).unwrap()).await
    }

    async fn fixture_with_hash(password_hash: String) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let settings = Arc::new(AuthSettings::for_tests(SECRET));
        let auth = AuthService::new(store.clone(), settings).unwrap();

        let (_, draft) = TokenLedger::mint(Duration::hours(24));
        let registered = store
            .create_registration(NewRegistration {
                account: CreateAccount {
                    email: "alice@example.com".to_string(),
                    password_hash,
                },
                profile: ProfessionalFields {
                    name: "Alice Souza".to_string(),
                    bio: "b".repeat(60),
                    services: vec!["Yoga".to_string()],
                    city: "Curitiba".to_string(),
                    state: "PR".to_string(),
                    price_per_session: 90.0,
                    attendance_type: AttendanceType::Ambos,
                    whatsapp: None,
                    email: "alice@example.com".to_string(),
                    phone: None,
                },
                verification: draft,
            })
            .await
            .unwrap();

        Fixture {
            store,
            auth,
            account_id: registered.account.id,
            verification: registered.verification,
        }
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let f = fixture().await;

        assert!(matches!(f.auth.login("", "Secret1A").await, Err(AuthError::MissingFields)));
        assert!(matches!(f.auth.login("alice@example.com", "").await, Err(AuthError::MissingFields)));
        assert!(matches!(f.auth.login("   ", "x").await, Err(AuthError::MissingFields)));
    }

    #[tokio::test]
    async fn test_inactive_account_is_refused_only_with_right_password() {
        let f = fixture().await;

        assert!(matches!(
            f.auth.login("alice@example.com", "Secret1A").await,
            Err(AuthError::NotActivated)
        ));
        assert!(matches!(
            f.auth.login("alice@example.com", "WrongPass9").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_unknown_email_is_invalid_credentials() {
        let f = fixture().await;

        assert!(matches!(
            f.auth.login("bob@example.com", "Secret1A").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_unreadable_stored_hash_is_invalid_credentials() {
        let f = fixture_with_hash("not-a-phc-string".to_string()).await;
        f.activate().await;

        assert!(matches!(
            f.auth.login("alice@example.com", "Secret1A").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_login_after_activation() {
        let f = fixture().await;
        f.activate().await;

        let outcome = f.auth.login(" Alice@Example.com ", "Secret1A").await.unwrap();
        assert_eq!(outcome.user.id, f.account_id);
        assert_eq!(outcome.user.email, "alice@example.com");
        assert_eq!(outcome.user.name.as_deref(), Some("Alice Souza"));

        assert_eq!(f.auth.authenticate(&outcome.access).unwrap(), f.account_id);
        assert!(f.auth.authenticate(&outcome.refresh).is_err());

        let account = f.store.find_account(f.account_id).await.unwrap().unwrap();
        assert!(account.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_refresh() {
        let f = fixture().await;
        f.activate().await;
        let outcome = f.auth.login("alice@example.com", "Secret1A").await.unwrap();

        let access = f.auth.refresh(&outcome.refresh).await.unwrap();
        assert_eq!(f.auth.authenticate(&access).unwrap(), f.account_id);

        assert!(matches!(f.auth.refresh(&outcome.access).await, Err(AuthError::InvalidToken)));
        assert!(matches!(f.auth.refresh("garbage").await, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_current_account_and_missing_profile() {
        let f = fixture().await;
        f.activate().await;
        let outcome = f.auth.login("alice@example.com", "Secret1A").await.unwrap();

        let current = f.auth.current_account(&outcome.access).await.unwrap();
        assert_eq!(current.account.email, "alice@example.com");
        assert_eq!(current.professional.account_id, f.account_id);

        f.store.delete_professional(current.professional.id).await.unwrap();
        assert!(matches!(
            f.auth.current_account(&outcome.access).await,
            Err(AuthError::ProfileMissing)
        ));

        assert!(matches!(
            f.auth.current_account("not-a-token").await,
            Err(AuthError::Unauthenticated)
        ));
    }
}
