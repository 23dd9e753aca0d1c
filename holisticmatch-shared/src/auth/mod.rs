/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and the account password policy
/// - [`jwt`]: signed access/refresh session tokens
/// - [`token`]: opaque one-time tokens for email verification and password reset
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Session Tokens**: HS256 with configurable lifetimes, no server-side state
/// - **One-time Tokens**: 256-bit random values, stored only as SHA-256 digests
/// - **Constant-time Comparison**: digest checks never short-circuit
///
/// # Example
///
/// ```no_run
/// use holisticmatch_shared::auth::password::{hash_password, verify_password, HashParams};
/// use holisticmatch_shared::auth::jwt::{create_token, Claims, TokenType};
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Secret1A", &HashParams::default())?;
/// assert!(verify_password("Secret1A", &hash)?);
///
/// let claims = Claims::new(1, TokenType::Access, Duration::hours(24));
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!!")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
pub mod token;
