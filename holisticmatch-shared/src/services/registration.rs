/// Registration and account recovery
///
/// Registration writes the inactive account, its profile and the first
/// verification token in one store transaction, then mails the link in the
/// background. No session tokens are issued: the account cannot log in until
/// the email is verified.
///
/// Email uniqueness is checked twice: a fast pre-check, and the store's unique
/// constraint for registrations racing past it. Both surface as `EmailTaken`.
///
/// Recovery endpoints never reveal whether an email is registered, with one
/// exception kept on purpose: resending verification to an already active
/// account answers `AlreadyActive`.

use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::password::{hash_password_async, validate_password_policy, PasswordError};
use crate::models::{
    account::{Account, CreateAccount},
    professional::Professional,
    token::VerificationToken,
};
use crate::services::ledger::{LedgerError, TokenLedger};
use crate::services::notifier::{dispatch, LinkBuilder, NotificationKind, Notifier};
use crate::services::settings::AuthSettings;
use crate::store::{NewRegistration, Store, StoreError};
use crate::validation::{validate_email, validate_profile, FieldErrors, ProfileInput};

/// Error type for registration and recovery
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("{0}")]
    Validation(FieldErrors),

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("This email is already verified")]
    AlreadyActive,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A freshly registered, still inactive, account
#[derive(Debug, Clone)]
pub struct Registration {
    pub account: Account,
    pub professional: Professional,
}

/// Result of a verification request
#[derive(Debug, Clone)]
pub struct Verified {
    pub token: VerificationToken,
    pub email: String,
}

#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn Store>,
    ledger: TokenLedger,
    notifier: Arc<dyn Notifier>,
    links: LinkBuilder,
    settings: Arc<AuthSettings>,
}

impl RegistrationService {
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        links: LinkBuilder,
        settings: Arc<AuthSettings>,
    ) -> Self {
        Self {
            ledger: TokenLedger::new(store.clone(), settings.clone()),
            store,
            notifier,
            links,
            settings,
        }
    }

    pub fn ledger(&self) -> &TokenLedger {
        &self.ledger
    }

    /// Registers a professional
    ///
    /// # Errors
    ///
    /// - `Validation` with every failing field, password included
    /// - `EmailTaken` when the email is registered, including when a
    ///   concurrent registration wins the race
    pub async fn register(&self, input: &ProfileInput, password: &str) -> Result<Registration, RegistrationError> {
        let mut errors = FieldErrors::new();

        let fields = validate_profile(input).map_err(|e| errors.extend(e)).ok();
        if let Err(message) = validate_password_policy(password) {
            errors.add("password", message);
        }

        let fields = match fields {
            Some(fields) if errors.is_empty() => fields,
            _ => return Err(RegistrationError::Validation(errors)),
        };

        if self.store.email_exists(&fields.email).await? {
            debug!("Registration refused: email taken (pre-check)");
            return Err(RegistrationError::EmailTaken);
        }

        let password_hash = hash_password_async(password.to_string(), self.settings.hash_params).await?;
        let (plaintext, draft) = self.ledger.verification_draft();

        let registered = self
            .store
            .create_registration(NewRegistration {
                account: CreateAccount {
                    email: fields.email.clone(),
                    password_hash,
                },
                profile: fields,
                verification: draft,
            })
            .await
            .map_err(|e| {
                if e.is_email_conflict() {
                    debug!("Registration refused: email taken (constraint)");
                    RegistrationError::EmailTaken
                } else {
                    RegistrationError::Store(e)
                }
            })?;

        info!(
            account_id = registered.account.id,
            professional_id = registered.professional.id,
            "Professional registered"
        );

        self.notify(NotificationKind::Verification, &registered.account.email, &plaintext);

        Ok(Registration {
            account: registered.account,
            professional: registered.professional,
        })
    }

    /// Consumes a verification token
    pub async fn verify_email(&self, token: &str) -> Result<Verified, RegistrationError> {
        let token = self.ledger.consume_verification(token.trim()).await?;

        let email = self
            .store
            .find_account(token.account_id)
            .await?
            .map(|a| a.email)
            .ok_or_else(|| StoreError::NotFound(format!("account {}", token.account_id)))?;

        Ok(Verified { token, email })
    }

    /// Issues and mails a new verification token
    ///
    /// Unknown emails succeed silently. Both paths make two store round
    /// trips: the account lookup, then a write or an unbound read on the
    /// token table.
    ///
    /// # Errors
    ///
    /// - `Validation` when the email is missing or malformed
    /// - `AlreadyActive` when the account is already verified
    pub async fn resend_verification(&self, email: &str) -> Result<(), RegistrationError> {
        let email = validate_email(email).map_err(|m| RegistrationError::Validation(FieldErrors::single("email", m)))?;

        let Some(account) = self.store.find_account_by_email(&email).await? else {
            self.ledger.issue_unbound_verification().await?;
            debug!("Verification resend for unknown email ignored");
            return Ok(());
        };

        if account.is_active {
            return Err(RegistrationError::AlreadyActive);
        }

        let issued = self.ledger.issue_verification(account.id).await?;
        self.notify(NotificationKind::Verification, &account.email, &issued.plaintext);

        info!(account_id = account.id, "Verification email re-issued");

        Ok(())
    }

    /// Issues and mails a password reset token
    ///
    /// Answers identically whether or not the email is registered, with the
    /// same store round trips as [`RegistrationService::resend_verification`].
    pub async fn request_password_reset(&self, email: &str) -> Result<(), RegistrationError> {
        let email = validate_email(email).map_err(|m| RegistrationError::Validation(FieldErrors::single("email", m)))?;

        let Some(account) = self.store.find_account_by_email(&email).await? else {
            self.ledger.issue_unbound_reset().await?;
            debug!("Password reset for unknown email ignored");
            return Ok(());
        };

        let issued = self.ledger.issue_reset(account.id).await?;
        self.notify(NotificationKind::PasswordReset, &account.email, &issued.plaintext);

        info!(account_id = account.id, "Password reset requested");

        Ok(())
    }

    /// Sets a new password with a reset token
    ///
    /// # Errors
    ///
    /// - `Validation` for a policy violation or a confirmation mismatch
    /// - `Ledger(NotFound | InvalidOrExpired)` for unusable tokens
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<Account, RegistrationError> {
        let mut errors = FieldErrors::new();

        if token.trim().is_empty() {
            errors.add("token", "This field is required");
        }
        if password != password_confirm {
            errors.add("password_confirm", "Passwords do not match");
        }
        if let Err(message) = validate_password_policy(password) {
            errors.add("password", message);
        }
        if !errors.is_empty() {
            return Err(RegistrationError::Validation(errors));
        }

        Ok(self.ledger.consume_reset(token.trim(), password).await?)
    }

    fn notify(&self, kind: NotificationKind, to: &str, token: &str) {
        let link = self.links.for_kind(kind, token);
        dispatch(self.notifier.clone(), kind, to.to_string(), link);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifier::NotifyError;
    use crate::store::memory::MemoryStore;
    use crate::validation::PriceValue;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    struct ChannelNotifier(mpsc::UnboundedSender<(NotificationKind, String, String)>);

    #[async_trait]
    impl Notifier for ChannelNotifier {
        async fn send_verification(&self, to: &str, link: &str) -> Result<(), NotifyError> {
            let _ = self.0.send((NotificationKind::Verification, to.to_string(), link.to_string()));
            Ok(())
        }

        async fn send_password_reset(&self, to: &str, link: &str) -> Result<(), NotifyError> {
            let _ = self.0.send((NotificationKind::PasswordReset, to.to_string(), link.to_string()));
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send_verification(&self, _: &str, _: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Transport("smtp down".to_string()))
        }

        async fn send_password_reset(&self, _: &str, _: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Transport("smtp down".to_string()))
        }
    }

    fn profile(email: &str) -> ProfileInput {
        ProfileInput {
            name: Some("Alice Souza".to_string()),
            bio: Some("Terapeuta de Reiki e meditação guiada há mais de oito anos em Curitiba.".to_string()),
            services: Some(vec!["Reiki".to_string()]),
            city: Some("Curitiba".to_string()),
            state: Some("PR".to_string()),
            price_per_session: Some(PriceValue::Number(150.0)),
            email: Some(email.to_string()),
            ..Default::default()
        }
    }

    fn service(notifier: Arc<dyn Notifier>) -> (Arc<MemoryStore>, RegistrationService) {
        let store = Arc::new(MemoryStore::new());
        let service = RegistrationService::new(
            store.clone(),
            notifier,
            LinkBuilder::new("http://localhost:3000"),
            Arc::new(AuthSettings::for_tests(SECRET)),
        );
        (store, service)
    }

    fn token_from(link: &str) -> String {
        link.rsplit(|c| c == '/' || c == '=').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_register_creates_inactive_account_and_mails_link() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (store, service) = service(Arc::new(ChannelNotifier(tx)));

        let registration = service.register(&profile("alice@example.com"), "Secret1A").await.unwrap();
        assert!(!registration.account.is_active);
        assert_eq!(store.verification_tokens_for(registration.account.id).await.len(), 1);

        let (kind, to, link) = rx.recv().await.unwrap();
        assert_eq!(kind, NotificationKind::Verification);
        assert_eq!(to, "alice@example.com");
        assert!(link.starts_with("http://localhost:3000/verify-email/"));

        let verified = service.verify_email(&token_from(&link)).await.unwrap();
        assert_eq!(verified.email, "alice@example.com");
        assert!(store.is_account_active(registration.account.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_register_reports_password_with_profile_errors() {
        let (_, service) = service(Arc::new(crate::services::notifier::LogNotifier));
        let input = ProfileInput {
            bio: Some("too short".to_string()),
            ..profile("alice@example.com")
        };

        match service.register(&input, "weak").await {
            Err(RegistrationError::Validation(errors)) => {
                assert!(errors.has("bio"));
                assert!(errors.has("password"));
            }
            other => panic!("expected validation error, got {:?}", other.map(|r| r.account.id)),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let (store, service) = service(Arc::new(crate::services::notifier::LogNotifier));
        service.register(&profile("alice@example.com"), "Secret1A").await.unwrap();

        assert!(matches!(
            service.register(&profile("ALICE@example.com"), "Secret1A").await,
            Err(RegistrationError::EmailTaken)
        ));
        assert_eq!(store.account_count().await, 1);
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_fail_registration() {
        let (store, service) = service(Arc::new(FailingNotifier));

        assert!(service.register(&profile("alice@example.com"), "Secret1A").await.is_ok());
        assert_eq!(store.account_count().await, 1);
    }

    #[tokio::test]
    async fn test_resend_verification() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_, service) = service(Arc::new(ChannelNotifier(tx)));
        service.register(&profile("alice@example.com"), "Secret1A").await.unwrap();
        let (_, _, first) = rx.recv().await.unwrap();

        service.resend_verification("alice@example.com").await.unwrap();
        let (_, _, second) = rx.recv().await.unwrap();
        assert_ne!(first, second);

        // the first link was superseded
        assert!(matches!(
            service.verify_email(&token_from(&first)).await,
            Err(RegistrationError::Ledger(LedgerError::NotFound))
        ));
        service.verify_email(&token_from(&second)).await.unwrap();

        assert!(matches!(
            service.resend_verification("alice@example.com").await,
            Err(RegistrationError::AlreadyActive)
        ));
        assert!(service.resend_verification("nobody@example.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_, service) = service(Arc::new(ChannelNotifier(tx)));
        service.register(&profile("alice@example.com"), "Secret1A").await.unwrap();
        let _ = rx.recv().await.unwrap();

        assert!(service.request_password_reset("nobody@example.com").await.is_ok());
        service.request_password_reset("alice@example.com").await.unwrap();

        let (kind, _, link) = rx.recv().await.unwrap();
        assert_eq!(kind, NotificationKind::PasswordReset);
        assert!(link.contains("/reset-password?token="));
        let token = token_from(&link);

        match service.confirm_password_reset(&token, "NewPass2B", "NewPass2C").await {
            Err(RegistrationError::Validation(errors)) => assert!(errors.has("password_confirm")),
            _ => panic!("expected mismatch"),
        }

        service.confirm_password_reset(&token, "NewPass2B", "NewPass2B").await.unwrap();
        assert!(matches!(
            service.confirm_password_reset(&token, "NewPass2B", "NewPass2B").await,
            Err(RegistrationError::Ledger(LedgerError::InvalidOrExpired))
        ));
    }
}
