// Cryptographic Hashing Wrappers
use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// SHA-256: Used to derive ECIES symmetric keys from raw ECDH output
pub fn hash_sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Keccak-256: Used for address derivation and signed-message digests
pub fn hash_keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Prefixed message digest for signature-based key recovery:
/// keccak256("\x19Ethereum Signed Message:\n" + len + message)
pub fn hash_signed_message(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}
