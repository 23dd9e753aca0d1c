/// In-memory store
///
/// Keeps every table in a single map set behind one async mutex, so each
/// trait method is trivially atomic. Enforces the same unique constraints as
/// the SQL schema (email, one profile per account, one token per account and
/// purpose) and reports violations with the same constraint names.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use super::{NewRegistration, Registered, Store, StoreError};
use crate::models::{
    account::{normalize_email, Account},
    professional::{Professional, ProfessionalFields, ProfessionalFilter},
    token::{PasswordResetToken, TokenDraft, VerificationToken},
};

#[derive(Debug, Default)]
struct Tables {
    accounts: BTreeMap<i64, Account>,
    professionals: BTreeMap<i64, Professional>,
    /// Keyed by account id
    verification_tokens: HashMap<i64, VerificationToken>,
    /// Keyed by account id
    reset_tokens: HashMap<i64, PasswordResetToken>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn email_taken(&self, email: &str) -> bool {
        self.accounts.values().any(|a| a.email == email)
    }

    fn upsert_verification(&mut self, account_id: i64, draft: &TokenDraft) -> Result<VerificationToken, StoreError> {
        if self
            .verification_tokens
            .values()
            .any(|t| t.token_hash == draft.token_hash && t.account_id != account_id)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "email_verification_tokens_token_hash_key".to_string(),
            });
        }

        let existing = self.verification_tokens.get(&account_id).map(|t| t.id);
        let id = match existing {
            Some(id) => id,
            None => self.next_id(),
        };

        let token = VerificationToken {
            id,
            account_id,
            token_hash: draft.token_hash.clone(),
            created_at: draft.created_at,
            expires_at: draft.expires_at,
            verified: false,
        };
        self.verification_tokens.insert(account_id, token.clone());

        Ok(token)
    }
}

/// [`Store`] kept entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,

    /// Makes `ping` fail, simulating a lost database
    unreachable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::Relaxed);
    }

    /// Number of accounts, for assertions in tests
    pub async fn account_count(&self) -> usize {
        self.tables.lock().await.accounts.len()
    }

    /// Every live verification token, for assertions in tests
    pub async fn verification_tokens_for(&self, account_id: i64) -> Vec<VerificationToken> {
        self.tables
            .lock()
            .await
            .verification_tokens
            .get(&account_id)
            .cloned()
            .into_iter()
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::Relaxed) {
            return Err(StoreError::Database("store marked unreachable".to_string()));
        }
        Ok(())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.tables.lock().await.email_taken(&normalize_email(email)))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let email = normalize_email(email);
        let tables = self.tables.lock().await;

        Ok(tables.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_account(&self, id: i64) -> Result<Option<Account>, StoreError> {
        Ok(self.tables.lock().await.accounts.get(&id).cloned())
    }

    async fn is_account_active(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .lock()
            .await
            .accounts
            .get(&id)
            .map(|a| a.is_active)
            .unwrap_or(false))
    }

    async fn record_login(&self, id: i64) -> Result<(), StoreError> {
        if let Some(account) = self.tables.lock().await.accounts.get_mut(&id) {
            account.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn create_registration(&self, registration: NewRegistration) -> Result<Registered, StoreError> {
        let mut tables = self.tables.lock().await;
        let email = normalize_email(&registration.account.email);

        if tables.email_taken(&email) {
            return Err(StoreError::UniqueViolation {
                constraint: "accounts_email_key".to_string(),
            });
        }

        let now = Utc::now();
        let account = Account {
            id: tables.next_id(),
            email,
            password_hash: registration.account.password_hash,
            is_active: false,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        let profile = registration.profile;
        let professional = Professional {
            id: tables.next_id(),
            account_id: account.id,
            name: profile.name,
            bio: profile.bio,
            services: profile.services,
            city: profile.city,
            state: profile.state,
            price_per_session: profile.price_per_session,
            attendance_type: profile.attendance_type,
            whatsapp: profile.whatsapp,
            email: profile.email,
            phone: profile.phone,
            photo_url: None,
            created_at: now,
            updated_at: now,
        };

        // Validate the token before touching any table so a failure leaves nothing behind
        if tables
            .verification_tokens
            .values()
            .any(|t| t.token_hash == registration.verification.token_hash)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "email_verification_tokens_token_hash_key".to_string(),
            });
        }

        tables.accounts.insert(account.id, account.clone());
        tables.professionals.insert(professional.id, professional.clone());
        let verification = tables.upsert_verification(account.id, &registration.verification)?;

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
        let mut tables = self.tables.lock().await;

        if !tables.accounts.contains_key(&account_id) {
            return Err(StoreError::NotFound(format!("account {}", account_id)));
        }

        tables.upsert_verification(account_id, draft)
    }

    async fn find_verification_token(&self, token_hash: &str) -> Result<Option<VerificationToken>, StoreError> {
        let tables = self.tables.lock().await;

        Ok(tables
            .verification_tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn verify_and_activate(&self, token_id: i64, token_hash: &str) -> Result<VerificationToken, StoreError> {
        let mut tables = self.tables.lock().await;

        let account_id = tables
            .verification_tokens
            .values()
            .find(|t| t.id == token_id && t.token_hash == token_hash)
            .map(|t| t.account_id)
            .ok_or_else(|| StoreError::NotFound(format!("verification token {}", token_id)))?;

        if !tables.accounts.contains_key(&account_id) {
            return Err(StoreError::NotFound(format!("account {}", account_id)));
        }

        let now = Utc::now();
        if let Some(account) = tables.accounts.get_mut(&account_id) {
            account.is_active = true;
            account.updated_at = now;
        }

        let token = tables
            .verification_tokens
            .get_mut(&account_id)
            .ok_or_else(|| StoreError::NotFound(format!("verification token {}", token_id)))?;
        token.verified = true;

        Ok(token.clone())
    }

    async fn upsert_reset_token(
        &self,
        account_id: i64,
        draft: &TokenDraft,
    ) -> Result<PasswordResetToken, StoreError> {
        let mut tables = self.tables.lock().await;

        if !tables.accounts.contains_key(&account_id) {
            return Err(StoreError::NotFound(format!("account {}", account_id)));
        }

        if tables
            .reset_tokens
            .values()
            .any(|t| t.token_hash == draft.token_hash && t.account_id != account_id)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "password_reset_tokens_token_hash_key".to_string(),
            });
        }

        let existing = tables.reset_tokens.get(&account_id).map(|t| t.id);
        let id = match existing {
            Some(id) => id,
            None => tables.next_id(),
        };

        let token = PasswordResetToken {
            id,
            account_id,
            token_hash: draft.token_hash.clone(),
            created_at: draft.created_at,
            expires_at: draft.expires_at,
            used: false,
        };
        tables.reset_tokens.insert(account_id, token.clone());

        Ok(token)
    }

    async fn find_reset_token(&self, token_hash: &str) -> Result<Option<PasswordResetToken>, StoreError> {
        let tables = self.tables.lock().await;

        Ok(tables
            .reset_tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn consume_reset_token(
        &self,
        token_id: i64,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError> {
        let mut tables = self.tables.lock().await;

        let Some(token) = tables
            .reset_tokens
            .values_mut()
            .find(|t| t.id == token_id && t.token_hash == token_hash)
        else {
            return Ok(None);
        };

        if token.used || token.expires_at <= now {
            return Ok(None);
        }

        let account_id = token.account_id;
        let Some(account) = tables.accounts.get_mut(&account_id) else {
            return Err(StoreError::NotFound(format!("account {}", account_id)));
        };
        account.password_hash = password_hash.to_string();
        account.updated_at = now;
        let account = account.clone();

        if let Some(token) = tables.reset_tokens.get_mut(&account_id) {
            token.used = true;
        }

        Ok(Some(account))
    }

    async fn find_professional(&self, id: i64) -> Result<Option<Professional>, StoreError> {
        Ok(self.tables.lock().await.professionals.get(&id).cloned())
    }

    async fn find_professional_by_account(&self, account_id: i64) -> Result<Option<Professional>, StoreError> {
        let tables = self.tables.lock().await;

        Ok(tables
            .professionals
            .values()
            .find(|p| p.account_id == account_id)
            .cloned())
    }

    async fn list_professionals(
        &self,
        filter: &ProfessionalFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Professional>, i64), StoreError> {
        let tables = self.tables.lock().await;

        let mut matching: Vec<&Professional> = tables
            .professionals
            .values()
            .filter(|p| filter.matches(p))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn update_professional(
        &self,
        id: i64,
        fields: &ProfessionalFields,
    ) -> Result<Option<Professional>, StoreError> {
        let mut tables = self.tables.lock().await;

        let Some(professional) = tables.professionals.get_mut(&id) else {
            return Ok(None);
        };

        professional.name = fields.name.clone();
        professional.bio = fields.bio.clone();
        professional.services = fields.services.clone();
        professional.city = fields.city.clone();
        professional.state = fields.state.clone();
        professional.price_per_session = fields.price_per_session;
        professional.attendance_type = fields.attendance_type;
        professional.whatsapp = fields.whatsapp.clone();
        professional.email = fields.email.clone();
        professional.phone = fields.phone.clone();
        professional.updated_at = Utc::now();

        Ok(Some(professional.clone()))
    }

    async fn set_professional_photo(
        &self,
        id: i64,
        photo_url: Option<&str>,
    ) -> Result<Option<Professional>, StoreError> {
        let mut tables = self.tables.lock().await;

        Ok(tables.professionals.get_mut(&id).map(|professional| {
            professional.photo_url = photo_url.map(str::to_string);
            professional.updated_at = Utc::now();
            professional.clone()
        }))
    }

    async fn delete_professional(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables.lock().await.professionals.remove(&id).is_some())
    }
}
