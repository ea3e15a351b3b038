/// Key material sizes (secp256k1)
pub const PRIVATE_KEY_BYTES: usize = 32;
/// Uncompressed SEC1 public key: 0x04 prefix + x + y coordinates
pub const PUBLIC_KEY_BYTES: usize = 65;
pub const ADDRESS_BYTES: usize = 20;

/// AES-256-GCM parameters
pub const NONCE_BYTES: usize = 12;
pub const TAG_BYTES: usize = 16;

/// Password-KDF salt size
pub const SALT_BYTES: usize = 16;

/// PBKDF2-HMAC-SHA256 iteration count.
///
/// Compatibility constant: every backup file ever issued records this
/// value, and `wallet::backup` rejects any file that carries a different
/// one before touching the cipher. Not a tunable.
pub const KDF_ITERATIONS: u32 = 262_144;

/// Minimum password length for key backups, enforced before derivation.
pub const MIN_PASSWORD_LEN: usize = 12;

/// Backup file format version. v1 was the legacy CBC format and is no
/// longer produced or accepted; v2 is AES-256-GCM.
pub const BACKUP_VERSION: u32 = 2;

/// Fixed messages signed to derive a stable encryption public key per
/// role. Changing either string orphans every public key previously
/// registered on the ledger.
pub const STUDENT_KEY_MESSAGE: &str = "credseal: student encryption key v1";
pub const INSTITUTION_KEY_MESSAGE: &str = "credseal: institution encryption key v1";
