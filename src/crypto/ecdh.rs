// secp256k1 Shared-Secret Derivation
//
// Thin wrapper over k256's ECDH. The raw output is the x-coordinate of
// the shared point and is never used as a symmetric key directly —
// callers must hash it first (see ecies.rs).

use k256::{PublicKey, SecretKey};

use crate::config::{PRIVATE_KEY_BYTES, PUBLIC_KEY_BYTES};

#[derive(Debug, thiserror::Error)]
pub enum KeyAgreementError {
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("invalid public key")]
    InvalidPublicKey,
}

/// Computes the 32-byte shared-secret x-coordinate between a private
/// scalar and an uncompressed SEC1 public point.
///
/// The scalar must be in [1, n-1] and the point must lie on the curve
/// (the SEC1 parser rejects the identity and off-curve encodings).
pub fn shared_secret(private: &[u8], public: &[u8]) -> Result<[u8; 32], KeyAgreementError> {
    if private.len() != PRIVATE_KEY_BYTES {
        return Err(KeyAgreementError::InvalidPrivateKey);
    }
    if public.len() != PUBLIC_KEY_BYTES || public[0] != 0x04 {
        return Err(KeyAgreementError::InvalidPublicKey);
    }

    let secret =
        SecretKey::from_slice(private).map_err(|_| KeyAgreementError::InvalidPrivateKey)?;
    let point =
        PublicKey::from_sec1_bytes(public).map_err(|_| KeyAgreementError::InvalidPublicKey)?;

    let shared = k256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), point.as_affine());
    let mut out = [0u8; 32];
    out.copy_from_slice(shared.raw_secret_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::generate_keypair;
    use rand::rngs::OsRng;

    #[test]
    fn test_shared_secret_agreement() {
        let (sk_a, pk_a) = generate_keypair(&mut OsRng);
        let (sk_b, pk_b) = generate_keypair(&mut OsRng);

        let ab = shared_secret(&sk_a, &pk_b).unwrap();
        let ba = shared_secret(&sk_b, &pk_a).unwrap();
        assert_eq!(ab, ba, "both sides must derive the same secret");
    }

    #[test]
    fn test_rejects_zero_scalar() {
        let (_, pk) = generate_keypair(&mut OsRng);
        let zero = [0u8; 32];
        assert!(matches!(
            shared_secret(&zero, &pk),
            Err(KeyAgreementError::InvalidPrivateKey)
        ));
    }

    #[test]
    fn test_rejects_off_curve_point() {
        let (sk, _) = generate_keypair(&mut OsRng);
        let mut bogus = [0u8; 65];
        bogus[0] = 0x04;
        bogus[64] = 0x07; // not a curve point
        assert!(matches!(
            shared_secret(&sk, &bogus),
            Err(KeyAgreementError::InvalidPublicKey)
        ));
    }

    #[test]
    fn test_rejects_compressed_encoding() {
        let (sk, pk) = generate_keypair(&mut OsRng);
        // compressed form is 33 bytes; the wire contract is uncompressed only
        assert!(matches!(
            shared_secret(&sk, &pk[..33]),
            Err(KeyAgreementError::InvalidPublicKey)
        ));
    }
}
