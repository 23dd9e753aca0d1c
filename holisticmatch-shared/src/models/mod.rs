/// Database models for HolisticMatch
///
/// # Models
///
/// - `account`: authentication identities and the activation flag
/// - `professional`: public professional profiles (one per account)
/// - `token`: email-verification and password-reset tokens
///
/// # Example
///
/// ```no_run
/// use holisticmatch_shared::models::account::{Account, CreateAccount};
/// use holisticmatch_shared::db::pool::{connect, PoolSettings};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = connect(&PoolSettings::new("postgresql://localhost/holisticmatch", 5)).await?;
///
/// let account = Account::create(&pool, CreateAccount {
///     email: "alice@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// assert!(!account.is_active);
/// # Ok(())
/// # }
/// ```

pub mod account;
pub mod professional;
pub mod token;
