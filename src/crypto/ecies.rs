// Hybrid Encryption (ECIES): secp256k1 ECDH + AES-256-GCM
//
// Wire format, hex-encoded as a single string:
//   ephemeral_pubkey(65) || nonce(12) || ciphertext+tag(>=16)
//
// The ephemeral keypair is generated fresh per call and discarded; the
// symmetric key is SHA-256(shared_x). Every party on the registry
// (student, institution, visitor) consumes this exact layout.

use k256::SecretKey;
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::config::{NONCE_BYTES, PUBLIC_KEY_BYTES, TAG_BYTES};
use crate::crypto::aead::{self, CipherError};
use crate::crypto::ecdh::{self, KeyAgreementError};
use crate::crypto::hash::hash_sha256;
use crate::crypto::keys;

/// Smallest possible payload: ephemeral key + nonce + bare tag.
pub const MIN_PAYLOAD_BYTES: usize = PUBLIC_KEY_BYTES + NONCE_BYTES + TAG_BYTES;

#[derive(Debug, thiserror::Error)]
pub enum EciesError {
    #[error("malformed payload")]
    MalformedPayload,
    // Covers tampered ciphertext and wrong private key alike; the two
    // causes must stay indistinguishable to the caller.
    #[error(transparent)]
    Cipher(#[from] CipherError),
    #[error(transparent)]
    KeyAgreement(#[from] KeyAgreementError),
}

/// Encrypts plaintext to a recipient's uncompressed public key using a
/// caller-supplied CSPRNG (tests inject deterministic randomness here;
/// production uses `encrypt`).
pub fn encrypt_with_rng(
    plaintext: &[u8],
    recipient_public: &[u8],
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<String, EciesError> {
    // Single-use ephemeral keypair, never persisted
    let mut ephemeral: [u8; 32] = SecretKey::random(rng).to_bytes().into();
    let ephemeral_public = keys::public_from_private(&ephemeral)?;

    let shared = ecdh::shared_secret(&ephemeral, recipient_public);
    ephemeral.zeroize();
    let mut shared = shared?;
    let mut symmetric_key = hash_sha256(&shared);
    shared.zeroize();

    let nonce = aead::random_nonce(rng);
    let ciphertext = aead::encrypt(&symmetric_key, &nonce, plaintext)?;
    symmetric_key.zeroize();

    let mut payload = Vec::with_capacity(PUBLIC_KEY_BYTES + NONCE_BYTES + ciphertext.len());
    payload.extend_from_slice(&ephemeral_public);
    payload.extend_from_slice(&nonce);
    payload.extend_from_slice(&ciphertext);
    Ok(hex::encode(payload))
}

/// Encrypts plaintext to a recipient's public key using the platform RNG.
pub fn encrypt(plaintext: &[u8], recipient_public: &[u8]) -> Result<String, EciesError> {
    encrypt_with_rng(plaintext, recipient_public, &mut OsRng)
}

/// Decrypts a hex payload with the recipient's private key.
pub fn decrypt(payload_hex: &str, private: &[u8]) -> Result<Vec<u8>, EciesError> {
    let payload = hex::decode(payload_hex).map_err(|_| EciesError::MalformedPayload)?;
    if payload.len() < MIN_PAYLOAD_BYTES {
        return Err(EciesError::MalformedPayload);
    }

    let ephemeral_public = &payload[..PUBLIC_KEY_BYTES];
    let nonce: [u8; NONCE_BYTES] = payload[PUBLIC_KEY_BYTES..PUBLIC_KEY_BYTES + NONCE_BYTES]
        .try_into()
        .map_err(|_| EciesError::MalformedPayload)?;
    let ciphertext = &payload[PUBLIC_KEY_BYTES + NONCE_BYTES..];

    // A bad embedded ephemeral key is corrupt wire data, not a key error
    let mut shared = ecdh::shared_secret(private, ephemeral_public).map_err(|e| match e {
        KeyAgreementError::InvalidPublicKey => EciesError::MalformedPayload,
        other => EciesError::KeyAgreement(other),
    })?;
    let mut symmetric_key = hash_sha256(&shared);
    shared.zeroize();

    let plaintext = aead::decrypt(&symmetric_key, &nonce, ciphertext);
    symmetric_key.zeroize();
    Ok(plaintext?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::generate_keypair;

    #[test]
    fn test_roundtrip() {
        let (sk, pk) = generate_keypair(&mut OsRng);
        let payload = encrypt(b"{\"name\":\"Ana\",\"document\":\"123\"}", &pk).unwrap();
        let plaintext = decrypt(&payload, &sk).unwrap();
        assert_eq!(plaintext, b"{\"name\":\"Ana\",\"document\":\"123\"}");
    }

    #[test]
    fn test_payloads_never_repeat() {
        let (_, pk) = generate_keypair(&mut OsRng);
        let a = encrypt(b"same plaintext", &pk).unwrap();
        let b = encrypt(b"same plaintext", &pk).unwrap();
        assert_ne!(a, b, "fresh ephemeral key and nonce per call");
    }

    #[test]
    fn test_wrong_private_key_rejected() {
        let (_, pk) = generate_keypair(&mut OsRng);
        let (other_sk, _) = generate_keypair(&mut OsRng);
        let payload = encrypt(b"secret", &pk).unwrap();
        assert!(matches!(
            decrypt(&payload, &other_sk),
            Err(EciesError::Cipher(CipherError::AuthenticationFailed))
        ));
    }

    #[test]
    fn test_single_bit_flip_detected() {
        let (sk, pk) = generate_keypair(&mut OsRng);
        let payload = encrypt(b"tamper target", &pk).unwrap();
        let mut raw = hex::decode(&payload).unwrap();

        // flip one bit in the ciphertext segment
        let idx = PUBLIC_KEY_BYTES + NONCE_BYTES + 2;
        raw[idx] ^= 0x10;
        let tampered = hex::encode(&raw);
        assert!(decrypt(&tampered, &sk).is_err());

        // flip one bit in the nonce segment
        let mut raw = hex::decode(&payload).unwrap();
        raw[PUBLIC_KEY_BYTES] ^= 0x01;
        assert!(decrypt(&hex::encode(&raw), &sk).is_err());
    }

    #[test]
    fn test_short_payload_is_malformed() {
        let (sk, _) = generate_keypair(&mut OsRng);
        let short = hex::encode([0u8; MIN_PAYLOAD_BYTES - 1]);
        assert!(matches!(
            decrypt(&short, &sk),
            Err(EciesError::MalformedPayload)
        ));
        assert!(matches!(
            decrypt("not hex!", &sk),
            Err(EciesError::MalformedPayload)
        ));
    }

    #[test]
    fn test_corrupt_ephemeral_key_is_malformed() {
        let (sk, pk) = generate_keypair(&mut OsRng);
        let payload = encrypt(b"data", &pk).unwrap();
        let mut raw = hex::decode(&payload).unwrap();
        raw[1] ^= 0xff; // ephemeral x-coordinate no longer on curve
        assert!(matches!(
            decrypt(&hex::encode(&raw), &sk),
            Err(EciesError::MalformedPayload)
        ));
    }

    #[test]
    fn test_user_facing_messages_do_not_leak_cause() {
        let (sk, pk) = generate_keypair(&mut OsRng);
        let (other_sk, _) = generate_keypair(&mut OsRng);
        let payload = encrypt(b"x", &pk).unwrap();

        let wrong_key = decrypt(&payload, &other_sk).unwrap_err().to_string();

        let mut raw = hex::decode(&payload).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = decrypt(&hex::encode(&raw), &sk).unwrap_err().to_string();

        assert_eq!(wrong_key, tampered);
    }
}
