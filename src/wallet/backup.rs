// Key Backup Codec — password-protected private-key files
//
// Security model:
// - User password → PBKDF2-HMAC-SHA256 (262144 rounds) → 32-byte key
// - Private key (as its 0x-hex string) encrypted with AES-256-GCM
// - Fresh random 16-byte salt and 12-byte nonce per seal
// - Wrong password → authentication failure, no garbled output
//
// The file is JSON and never leaves the client machine. A backup whose
// kdfIterations field disagrees with the compatibility constant is
// rejected before any derivation runs, so a tampered file cannot
// downgrade the stretch.

use data_encoding::BASE64;
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use zeroize::Zeroize;

use crate::config::{BACKUP_VERSION, KDF_ITERATIONS, NONCE_BYTES, PRIVATE_KEY_BYTES, SALT_BYTES};
use crate::crypto::aead;
use crate::crypto::kdf::{self, KdfError};
use crate::crypto::keys;

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("password too short")]
    WeakPassword,
    #[error("wrong password")]
    WrongPassword,
    #[error("invalid backup format")]
    InvalidBackupFormat,
    #[error("encryption failed")]
    Encryption,
    #[error("backup file not found")]
    NotFound,
    #[error("background task failed")]
    TaskFailed,
}

impl From<KdfError> for BackupError {
    fn from(e: KdfError) -> Self {
        match e {
            KdfError::WeakPassword => BackupError::WeakPassword,
            KdfError::TaskFailed => BackupError::TaskFailed,
        }
    }
}

/// Portable backup record. Field names are the wire contract shared
/// with every other registry client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedBackup {
    pub version: u32,
    /// base64: ciphertext + 16-byte tag
    pub encrypted_private_key: String,
    /// hex, 16 bytes, no 0x prefix
    pub salt: String,
    pub kdf_iterations: u32,
    /// hex, 12-byte GCM nonce, no 0x prefix
    pub iv: String,
}

/// Seals a private key under a password with a caller-supplied CSPRNG.
pub fn seal_with_rng(
    private_key: &[u8; PRIVATE_KEY_BYTES],
    password: &str,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<EncryptedBackup, BackupError> {
    let mut salt = [0u8; SALT_BYTES];
    rng.fill_bytes(&mut salt);

    let mut key = kdf::derive_key(password, &salt, KDF_ITERATIONS)?;
    let nonce = aead::random_nonce(rng);

    let mut plaintext = keys::encode_private_key(private_key);
    let ciphertext = aead::encrypt(&key, &nonce, plaintext.as_bytes());
    key.zeroize();
    plaintext.zeroize();
    let ciphertext = ciphertext.map_err(|_| BackupError::Encryption)?;

    Ok(EncryptedBackup {
        version: BACKUP_VERSION,
        encrypted_private_key: BASE64.encode(&ciphertext),
        salt: hex::encode(salt),
        kdf_iterations: KDF_ITERATIONS,
        iv: hex::encode(nonce),
    })
}

/// Seals a private key under a password using the platform RNG.
pub fn seal(
    private_key: &[u8; PRIVATE_KEY_BYTES],
    password: &str,
) -> Result<EncryptedBackup, BackupError> {
    seal_with_rng(private_key, password, &mut OsRng)
}

/// Recovers the private key from a backup. Format checks run before the
/// slow derivation; authentication failure and an ill-shaped plaintext
/// both report `WrongPassword`.
pub fn open(
    backup: &EncryptedBackup,
    password: &str,
) -> Result<[u8; PRIVATE_KEY_BYTES], BackupError> {
    // Reject legacy/foreign formats and any parameter drift up front
    if backup.version != BACKUP_VERSION || backup.kdf_iterations != KDF_ITERATIONS {
        return Err(BackupError::InvalidBackupFormat);
    }

    let salt_bytes = hex::decode(&backup.salt).map_err(|_| BackupError::InvalidBackupFormat)?;
    let salt: [u8; SALT_BYTES] = salt_bytes
        .try_into()
        .map_err(|_| BackupError::InvalidBackupFormat)?;

    let iv_bytes = hex::decode(&backup.iv).map_err(|_| BackupError::InvalidBackupFormat)?;
    let nonce: [u8; NONCE_BYTES] = iv_bytes
        .try_into()
        .map_err(|_| BackupError::InvalidBackupFormat)?;

    let ciphertext = BASE64
        .decode(backup.encrypted_private_key.as_bytes())
        .map_err(|_| BackupError::InvalidBackupFormat)?;

    let mut key = kdf::derive_key(password, &salt, backup.kdf_iterations)?;
    let plaintext = aead::decrypt(&key, &nonce, &ciphertext);
    key.zeroize();
    let mut plaintext = plaintext.map_err(|_| BackupError::WrongPassword)?;

    let decoded = std::str::from_utf8(&plaintext)
        .ok()
        .and_then(keys::decode_private_key);
    plaintext.zeroize();
    decoded.ok_or(BackupError::WrongPassword)
}

/// `open` on the blocking pool, for callers on an interactive thread.
pub async fn open_blocking(
    backup: EncryptedBackup,
    password: String,
) -> Result<[u8; PRIVATE_KEY_BYTES], BackupError> {
    tokio::task::spawn_blocking(move || open(&backup, &password))
        .await
        .map_err(|_| BackupError::TaskFailed)?
}

impl EncryptedBackup {
    /// Saves the backup to disk as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), BackupError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Loads a backup file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BackupError> {
        if !path.as_ref().exists() {
            return Err(BackupError::NotFound);
        }
        let json = fs::read_to_string(path)?;
        let backup: EncryptedBackup = serde_json::from_str(&json)?;
        Ok(backup)
    }
}
