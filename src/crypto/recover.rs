// Public-Key Recovery from Signed Messages
//
// A wallet that only exposes signing can still participate in hybrid
// encryption: signing the fixed role message (config.rs) and recovering
// the key from the signature yields the same stable public key every
// time, with no separate encryption keypair to manage.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::config::{PRIVATE_KEY_BYTES, PUBLIC_KEY_BYTES};
use crate::crypto::hash::hash_signed_message;

/// Signature layout: r(32) || s(32) || v(1), v in {0, 1, 27, 28}.
pub const SIGNATURE_BYTES: usize = 65;

#[derive(Debug, thiserror::Error)]
pub enum RecoverError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid private key")]
    InvalidPrivateKey,
}

/// Recovers the uncompressed public key that produced `signature` over
/// the prefixed digest of `message`.
pub fn recover_public_key(
    message: &str,
    signature: &[u8],
) -> Result<[u8; PUBLIC_KEY_BYTES], RecoverError> {
    if signature.len() != SIGNATURE_BYTES {
        return Err(RecoverError::InvalidSignature);
    }

    let v = signature[64];
    let recovery = RecoveryId::try_from(if v >= 27 { v - 27 } else { v })
        .map_err(|_| RecoverError::InvalidSignature)?;
    let signature =
        Signature::from_slice(&signature[..64]).map_err(|_| RecoverError::InvalidSignature)?;

    let digest = hash_signed_message(message);
    let verifying = VerifyingKey::recover_from_prehash(&digest, &signature, recovery)
        .map_err(|_| RecoverError::InvalidSignature)?;

    let point = verifying.to_encoded_point(false);
    let mut out = [0u8; PUBLIC_KEY_BYTES];
    out.copy_from_slice(point.as_bytes());
    Ok(out)
}

/// Signs `message` with a locally held private key, producing the
/// r||s||v layout that `recover_public_key` consumes. Parties whose key
/// lives in an external wallet sign there instead.
pub fn sign_message(
    private: &[u8; PRIVATE_KEY_BYTES],
    message: &str,
) -> Result<[u8; SIGNATURE_BYTES], RecoverError> {
    let signing =
        SigningKey::from_slice(private).map_err(|_| RecoverError::InvalidPrivateKey)?;
    let digest = hash_signed_message(message);
    let (signature, recovery) = signing
        .sign_prehash_recoverable(&digest)
        .map_err(|_| RecoverError::InvalidPrivateKey)?;

    let mut out = [0u8; SIGNATURE_BYTES];
    out[..64].copy_from_slice(signature.to_bytes().as_slice());
    out[64] = recovery.to_byte() + 27;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{INSTITUTION_KEY_MESSAGE, STUDENT_KEY_MESSAGE};
    use crate::crypto::keys::generate_keypair;
    use rand::rngs::OsRng;

    #[test]
    fn test_recovery_roundtrip() {
        let (sk, pk) = generate_keypair(&mut OsRng);
        let sig = sign_message(&sk, STUDENT_KEY_MESSAGE).unwrap();
        let recovered = recover_public_key(STUDENT_KEY_MESSAGE, &sig).unwrap();
        assert_eq!(recovered, pk);
    }

    #[test]
    fn test_recovery_is_idempotent() {
        // Signing the same fixed message again must recover the same key
        let (sk, _) = generate_keypair(&mut OsRng);
        let a = recover_public_key(
            INSTITUTION_KEY_MESSAGE,
            &sign_message(&sk, INSTITUTION_KEY_MESSAGE).unwrap(),
        )
        .unwrap();
        let b = recover_public_key(
            INSTITUTION_KEY_MESSAGE,
            &sign_message(&sk, INSTITUTION_KEY_MESSAGE).unwrap(),
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_role_messages_recover_distinct_contexts() {
        let (sk, pk) = generate_keypair(&mut OsRng);
        let student_sig = sign_message(&sk, STUDENT_KEY_MESSAGE).unwrap();
        // the right message recovers the right key...
        assert_eq!(
            recover_public_key(STUDENT_KEY_MESSAGE, &student_sig).unwrap(),
            pk
        );
        // ...and the wrong message recovers a different (useless) key
        let cross = recover_public_key(INSTITUTION_KEY_MESSAGE, &student_sig);
        assert!(cross.is_err() || cross.unwrap() != pk);
    }

    #[test]
    fn test_v_offset_forms_accepted() {
        let (sk, pk) = generate_keypair(&mut OsRng);
        let mut sig = sign_message(&sk, STUDENT_KEY_MESSAGE).unwrap();
        assert!(sig[64] >= 27);
        sig[64] -= 27; // raw recovery-id form
        assert_eq!(recover_public_key(STUDENT_KEY_MESSAGE, &sig).unwrap(), pk);
    }

    #[test]
    fn test_garbage_signature_rejected() {
        assert!(matches!(
            recover_public_key(STUDENT_KEY_MESSAGE, &[0u8; 65]),
            Err(RecoverError::InvalidSignature)
        ));
        assert!(matches!(
            recover_public_key(STUDENT_KEY_MESSAGE, &[1u8; 12]),
            Err(RecoverError::InvalidSignature)
        ));
    }
}
