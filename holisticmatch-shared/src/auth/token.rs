/// Opaque one-time tokens (email verification, password reset)
///
/// # Security
///
/// - **Entropy**: 32 bytes (256 bits) from the OS RNG
/// - **Encoding**: URL-safe base64 without padding (43 chars), safe in links
/// - **Storage**: only the SHA-256 hex digest is persisted; the plaintext
///   exists in the outgoing email and nowhere else
/// - **Validation**: constant-time comparison of digests
///
/// # Example
///
/// ```
/// use holisticmatch_shared::auth::token::{generate_token, hash_token, verify_token, TOKEN_LENGTH};
///
/// let (token, hash) = generate_token();
/// assert_eq!(token.len(), TOKEN_LENGTH);
/// assert_eq!(hash, hash_token(&token));
/// assert!(verify_token(&token, &hash));
/// ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Random bytes per token
const TOKEN_BYTES: usize = 32;

/// Encoded token length (base64 of 32 bytes, unpadded)
pub const TOKEN_LENGTH: usize = 43;

/// Generates a new token
///
/// # Returns
///
/// Tuple of (plaintext_token, sha256_hex_hash)
pub fn generate_token() -> (String, String) {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);

    let token = URL_SAFE_NO_PAD.encode(bytes);
    let hash = hash_token(&token);

    (token, hash)
}

/// SHA-256 hex digest of a token, used as the storage and lookup key
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cheap shape check before touching the store
///
/// Anything that could not have come from [`generate_token`] is rejected.
pub fn validate_token_format(token: &str) -> bool {
    token.len() == TOKEN_LENGTH
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Checks a plaintext token against a stored digest in constant time
pub fn verify_token(token: &str, stored_hash: &str) -> bool {
    constant_time_compare(&hash_token(token), stored_hash)
}

/// Constant-time string comparison
///
/// Always walks the full length once lengths match; unequal lengths return
/// early, which only reveals the length of a fixed-size digest.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
