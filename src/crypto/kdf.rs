// Password Key Derivation: PBKDF2-HMAC-SHA256
//
// Deliberately slow (262144 iterations, a fixed compatibility constant —
// existing backup files record it and re-derivation must match). The
// async wrapper keeps the stretch off the interactive thread.

use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;

use crate::config::{MIN_PASSWORD_LEN, SALT_BYTES};

#[derive(Debug, thiserror::Error)]
pub enum KdfError {
    #[error("password too short: minimum {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
    #[error("key derivation task failed")]
    TaskFailed,
}

/// Derives a 32-byte key from a password and salt. Deterministic:
/// identical inputs always yield the identical key.
///
/// The password-length policy is enforced here, before any derivation
/// work is done.
pub fn derive_key(
    password: &str,
    salt: &[u8; SALT_BYTES],
    iterations: u32,
) -> Result<[u8; 32], KdfError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(KdfError::WeakPassword);
    }

    let mut key = [0u8; 32];
    pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, iterations, &mut key)
        .expect("HMAC accepts any key length");
    Ok(key)
}

/// Awaitable derivation on the blocking pool. Dropping the returned
/// future before completion abandons the result; nothing has been
/// persisted at that point.
pub async fn derive_key_blocking(
    password: String,
    salt: [u8; SALT_BYTES],
    iterations: u32,
) -> Result<[u8; 32], KdfError> {
    tokio::task::spawn_blocking(move || derive_key(&password, &salt, iterations))
        .await
        .map_err(|_| KdfError::TaskFailed)?
}
