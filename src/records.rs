// Record Sealing and Opening
//
// A record's personal data is encrypted exactly once, under a fresh
// 32-byte content key. That key never rests in the clear: it is wrapped
// via ECIES for the student and for the institution at sealing time,
// and for visitors later (access::protocol). Every wrapped copy
// decrypts to the same key bytes.

use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::config::{NONCE_BYTES, PUBLIC_KEY_BYTES, TAG_BYTES};
use crate::crypto::aead::{self, CipherError};
use crate::crypto::ecies::{self, EciesError};
use crate::crypto::keys;
use crate::crypto::recover::{self, RecoverError};
use crate::ledger::{Record, RecordId};

pub const CONTENT_KEY_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Unwrapped bytes were not a 32-byte content key: wrong private
    /// key for this record, or corrupted ledger data.
    #[error("content key recovery failed")]
    KeyRecoveryFailed,
    #[error("malformed record data")]
    MalformedData,
    #[error("invalid record signature")]
    InvalidSignature,
    #[error(transparent)]
    Ecies(#[from] EciesError),
    #[error(transparent)]
    Cipher(#[from] CipherError),
}

impl From<RecoverError> for RecordError {
    fn from(_: RecoverError) -> Self {
        RecordError::InvalidSignature
    }
}

/// Seals personal data into a ledger-ready record: fresh content key,
/// AEAD-encrypted data, one wrapped key per initial party, and the
/// institution's recoverable signature over the encrypted data.
pub fn seal_record_with_rng(
    record_id: RecordId,
    personal_data: &[u8],
    student_public: &[u8; PUBLIC_KEY_BYTES],
    institution_private: &[u8; 32],
    timestamp: u64,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<Record, RecordError> {
    let institution_public = keys::public_from_private(institution_private)
        .map_err(|_| RecordError::KeyRecoveryFailed)?;

    let mut content_key = [0u8; CONTENT_KEY_BYTES];
    rng.fill_bytes(&mut content_key);

    let nonce = aead::random_nonce(rng);
    let ciphertext = aead::encrypt(&content_key, &nonce, personal_data)?;
    let mut data = Vec::with_capacity(NONCE_BYTES + ciphertext.len());
    data.extend_from_slice(&nonce);
    data.extend_from_slice(&ciphertext);
    let encrypted_data = hex::encode(data);

    let encrypted_key_student = ecies::encrypt_with_rng(&content_key, student_public, rng)?;
    let encrypted_key_institution =
        ecies::encrypt_with_rng(&content_key, &institution_public, rng)?;
    content_key.zeroize();

    let signature = recover::sign_message(institution_private, &encrypted_data)?;

    Ok(Record {
        record_id,
        student: keys::derive_address(student_public),
        institution: keys::derive_address(&institution_public),
        encrypted_data,
        encrypted_key_institution,
        encrypted_key_student,
        signature: hex::encode(signature),
        timestamp,
    })
}

/// `seal_record_with_rng` with the platform RNG.
pub fn seal_record(
    record_id: RecordId,
    personal_data: &[u8],
    student_public: &[u8; PUBLIC_KEY_BYTES],
    institution_private: &[u8; 32],
    timestamp: u64,
) -> Result<Record, RecordError> {
    seal_record_with_rng(
        record_id,
        personal_data,
        student_public,
        institution_private,
        timestamp,
        &mut OsRng,
    )
}

/// Unwraps a content key with the holder's private key, enforcing the
/// exact key length.
pub fn unwrap_content_key(
    wrapped: &str,
    private: &[u8],
) -> Result<[u8; CONTENT_KEY_BYTES], RecordError> {
    let mut bytes = ecies::decrypt(wrapped, private)?;
    if bytes.len() != CONTENT_KEY_BYTES {
        bytes.zeroize();
        return Err(RecordError::KeyRecoveryFailed);
    }
    let mut key = [0u8; CONTENT_KEY_BYTES];
    key.copy_from_slice(&bytes);
    bytes.zeroize();
    Ok(key)
}

/// Decrypts `encrypted_data` (hex nonce||ciphertext+tag) with a
/// recovered content key.
pub fn decrypt_record_data(
    encrypted_data: &str,
    content_key: &[u8; CONTENT_KEY_BYTES],
) -> Result<Vec<u8>, RecordError> {
    let raw = hex::decode(encrypted_data).map_err(|_| RecordError::MalformedData)?;
    if raw.len() < NONCE_BYTES + TAG_BYTES {
        return Err(RecordError::MalformedData);
    }
    let nonce: [u8; NONCE_BYTES] = raw[..NONCE_BYTES]
        .try_into()
        .map_err(|_| RecordError::MalformedData)?;
    Ok(aead::decrypt(content_key, &nonce, &raw[NONCE_BYTES..])?)
}

/// Full open path for any party holding a wrapped copy of the content
/// key. The key lives only for the duration of this call.
pub fn open_record_data(
    record: &Record,
    wrapped_key: &str,
    private: &[u8],
) -> Result<Vec<u8>, RecordError> {
    let mut content_key = unwrap_content_key(wrapped_key, private)?;
    let plaintext = decrypt_record_data(&record.encrypted_data, &content_key);
    content_key.zeroize();
    plaintext
}

/// Opens a record with the student's own wrapped key.
pub fn open_as_student(record: &Record, student_private: &[u8]) -> Result<Vec<u8>, RecordError> {
    open_record_data(record, &record.encrypted_key_student, student_private)
}

/// Opens a record with the institution's wrapped key.
pub fn open_as_institution(
    record: &Record,
    institution_private: &[u8],
) -> Result<Vec<u8>, RecordError> {
    open_record_data(record, &record.encrypted_key_institution, institution_private)
}

/// Verifies that the record's signature over its encrypted data was
/// made by the institution the record names.
pub fn verify_record_signature(record: &Record) -> Result<(), RecordError> {
    let signature = hex::decode(&record.signature).map_err(|_| RecordError::InvalidSignature)?;
    let public = recover::recover_public_key(&record.encrypted_data, &signature)?;
    if keys::derive_address(&public) != record.institution {
        return Err(RecordError::InvalidSignature);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::generate_keypair;

    const DATA: &[u8] = br#"{"name":"Ana","document":"123"}"#;

    fn sealed() -> (Record, [u8; 32], [u8; 32]) {
        let (student_sk, student_pk) = generate_keypair(&mut OsRng);
        let (institution_sk, _) = generate_keypair(&mut OsRng);
        let record =
            seal_record(7, DATA, &student_pk, &institution_sk, 1_700_000_000).unwrap();
        (record, student_sk, institution_sk)
    }

    #[test]
    fn test_both_parties_open_same_plaintext() {
        let (record, student_sk, institution_sk) = sealed();
        assert_eq!(open_as_student(&record, &student_sk).unwrap(), DATA);
        assert_eq!(open_as_institution(&record, &institution_sk).unwrap(), DATA);
    }

    #[test]
    fn test_both_wrapped_keys_hold_same_content_key() {
        let (record, student_sk, institution_sk) = sealed();
        let a = unwrap_content_key(&record.encrypted_key_student, &student_sk).unwrap();
        let b = unwrap_content_key(&record.encrypted_key_institution, &institution_sk).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_wrong_key_cannot_open() {
        let (record, _, _) = sealed();
        let (stranger_sk, _) = generate_keypair(&mut OsRng);
        assert!(open_as_student(&record, &stranger_sk).is_err());
    }

    #[test]
    fn test_signature_binds_institution() {
        let (mut record, _, _) = sealed();
        verify_record_signature(&record).unwrap();

        // retargeting the record to another institution must not verify
        record.institution = [9u8; 20];
        assert!(matches!(
            verify_record_signature(&record),
            Err(RecordError::InvalidSignature)
        ));
    }

    #[test]
    fn test_tampered_data_fails_signature_and_decryption() {
        let (record, student_sk, _) = sealed();
        let mut tampered = record.clone();
        let mut raw = hex::decode(&tampered.encrypted_data).unwrap();
        raw[NONCE_BYTES + 1] ^= 0x01;
        tampered.encrypted_data = hex::encode(raw);

        assert!(verify_record_signature(&tampered).is_err());
        assert!(open_as_student(&tampered, &student_sk).is_err());
    }

    #[test]
    fn test_short_encrypted_data_is_malformed() {
        let key = [0u8; CONTENT_KEY_BYTES];
        assert!(matches!(
            decrypt_record_data("00ff00", &key),
            Err(RecordError::MalformedData)
        ));
    }
}
