// Keypair Generation and Address Management
//
// Keys are secp256k1: a 32-byte private scalar and its uncompressed
// 65-byte SEC1 public point. Addresses follow the registry convention:
// last 20 bytes of keccak256(public_point_without_prefix), rendered as
// 0x-hex with a mixed-case checksum.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use rand_core::{CryptoRng, RngCore};

use crate::config::{ADDRESS_BYTES, PRIVATE_KEY_BYTES, PUBLIC_KEY_BYTES};
use crate::crypto::ecdh::KeyAgreementError;
use crate::crypto::hash::hash_keccak256;

#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("invalid address prefix: must start with 0x")]
    InvalidPrefix,
    #[error("invalid address encoding")]
    InvalidEncoding,
    #[error("invalid address length")]
    InvalidLength,
    #[error("invalid address checksum")]
    InvalidChecksum,
}

/// Generates a fresh keypair from the supplied CSPRNG.
pub fn generate_keypair(
    rng: &mut (impl RngCore + CryptoRng),
) -> ([u8; PRIVATE_KEY_BYTES], [u8; PUBLIC_KEY_BYTES]) {
    let secret = SecretKey::random(rng);
    let public = encode_public(&secret);
    (secret.to_bytes().into(), public)
}

/// Recomputes the public point for a private scalar.
pub fn public_from_private(
    private: &[u8],
) -> Result<[u8; PUBLIC_KEY_BYTES], KeyAgreementError> {
    if private.len() != PRIVATE_KEY_BYTES {
        return Err(KeyAgreementError::InvalidPrivateKey);
    }
    let secret =
        SecretKey::from_slice(private).map_err(|_| KeyAgreementError::InvalidPrivateKey)?;
    Ok(encode_public(&secret))
}

fn encode_public(secret: &SecretKey) -> [u8; PUBLIC_KEY_BYTES] {
    let point = secret.public_key().to_encoded_point(false);
    let mut out = [0u8; PUBLIC_KEY_BYTES];
    out.copy_from_slice(point.as_bytes());
    out
}

/// Derives the registry address for an uncompressed public key.
/// Rule: address = keccak256(public_key[1..65])[12..32]
pub fn derive_address(public: &[u8; PUBLIC_KEY_BYTES]) -> [u8; ADDRESS_BYTES] {
    let hash = hash_keccak256(&public[1..]);
    let mut addr = [0u8; ADDRESS_BYTES];
    addr.copy_from_slice(&hash[12..]);
    addr
}

/// Encodes an address as 0x-prefixed hex with a mixed-case checksum
/// (a hex nibble is uppercased when the matching nibble of
/// keccak256(lowercase_hex) is >= 8).
pub fn encode_address_string(addr: &[u8; ADDRESS_BYTES]) -> String {
    let lower = hex::encode(addr);
    let hash = hash_keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (4 * (1 - i % 2))) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Decodes a 0x-prefixed address string. The checksum is verified only
/// for mixed-case input; all-lowercase addresses are accepted as-is.
pub fn decode_address_string(s: &str) -> Result<[u8; ADDRESS_BYTES], AddressError> {
    let body = s.strip_prefix("0x").ok_or(AddressError::InvalidPrefix)?;
    if body.len() != ADDRESS_BYTES * 2 {
        return Err(AddressError::InvalidLength);
    }

    let bytes = hex::decode(body).map_err(|_| AddressError::InvalidEncoding)?;
    let mut addr = [0u8; ADDRESS_BYTES];
    addr.copy_from_slice(&bytes);

    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if has_upper && encode_address_string(&addr) != s {
        return Err(AddressError::InvalidChecksum);
    }
    Ok(addr)
}

/// Renders a private key in the backup-plaintext form: 0x + 64 hex chars.
pub fn encode_private_key(private: &[u8; PRIVATE_KEY_BYTES]) -> String {
    format!("0x{}", hex::encode(private))
}

/// Parses the backup-plaintext form back to raw bytes. Returns None on
/// any shape mismatch (used as the wrong-password signal by the backup
/// codec).
pub fn decode_private_key(s: &str) -> Option<[u8; PRIVATE_KEY_BYTES]> {
    let body = s.strip_prefix("0x")?;
    if body.len() != PRIVATE_KEY_BYTES * 2 {
        return None;
    }
    let bytes = hex::decode(body).ok()?;
    let mut out = [0u8; PRIVATE_KEY_BYTES];
    out.copy_from_slice(&bytes);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_public_derivable_from_private() {
        let (sk, pk) = generate_keypair(&mut OsRng);
        assert_eq!(public_from_private(&sk).unwrap(), pk);
        assert_eq!(pk[0], 0x04);
    }

    #[test]
    fn test_address_roundtrip() {
        let (_, pk) = generate_keypair(&mut OsRng);
        let addr = derive_address(&pk);
        let s = encode_address_string(&addr);
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 42);
        assert_eq!(decode_address_string(&s).unwrap(), addr);
    }

    #[test]
    fn test_checksum_vector() {
        // reference vector from the checksum convention
        let addr = decode_address_string("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(
            encode_address_string(&addr),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BEAed"
        );
    }

    #[test]
    fn test_bad_checksum_rejected() {
        // flip the case of one letter in a checksummed address
        let err = decode_address_string("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BEAeD");
        assert!(matches!(err, Err(AddressError::InvalidChecksum)));
    }

    #[test]
    fn test_private_key_hex_roundtrip() {
        let (sk, _) = generate_keypair(&mut OsRng);
        let s = encode_private_key(&sk);
        assert_eq!(s.len(), 66);
        assert_eq!(decode_private_key(&s).unwrap(), sk);
        assert!(decode_private_key("0xabcd").is_none());
        assert!(decode_private_key(&s[2..]).is_none(), "prefix is required");
    }
}
