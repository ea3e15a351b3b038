// Authenticated Symmetric Encryption: AES-256-GCM
//
// - Fresh random 12-byte nonce per encryption (never reused for a key)
// - Tag verification is constant-time inside the aes-gcm crate
// - Wrong key or tampered ciphertext → authentication failure, no
//   partial plaintext is ever returned

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand_core::{CryptoRng, RngCore};

use crate::config::NONCE_BYTES;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("decryption failed")]
    AuthenticationFailed,
}

/// Generates a fresh random nonce from the supplied CSPRNG.
pub fn random_nonce(rng: &mut (impl RngCore + CryptoRng)) -> [u8; NONCE_BYTES] {
    let mut nonce = [0u8; NONCE_BYTES];
    rng.fill_bytes(&mut nonce);
    nonce
}

/// Encrypts plaintext, returning ciphertext with the 16-byte tag appended.
pub fn encrypt(
    key: &[u8; 32],
    nonce: &[u8; NONCE_BYTES],
    plaintext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let cipher = Aes256Gcm::new(&(*key).into());
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| CipherError::EncryptionFailed)
}

/// Decrypts ciphertext||tag, failing closed on any tag mismatch.
pub fn decrypt(
    key: &[u8; 32],
    nonce: &[u8; NONCE_BYTES],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let cipher = Aes256Gcm::new(&(*key).into());
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CipherError::AuthenticationFailed)
}
