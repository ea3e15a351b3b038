// Access Grant Protocol
//
// Per (record, visitor) pair the ledger walks
// NoAccess → Granted → Revoked → Granted → … ; revocation is never
// terminal. Granting re-wraps the record's content key for the visitor
// without touching the encrypted data itself. The ledger is the sole
// source of truth: a grant exists once — and only once — the write is
// confirmed, and no grant state is cached between queries. Who may call
// the underlying contract operations is the contract's concern, not
// ours; cryptographically only the owner's key can unwrap
// encrypted_key_student in the first place.

use std::collections::HashMap;

use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::config::PUBLIC_KEY_BYTES;
use crate::crypto::ecies::{self, EciesError};
use crate::crypto::keys;
use crate::ledger::{AccessEventKind, Address, Confirmation, Ledger, LedgerError, RecordId};
use crate::records::{self, RecordError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    NoAccess,
    Granted,
    Revoked,
}

#[derive(Debug, thiserror::Error)]
pub enum GrantError {
    /// Wrong private key for this record, or corrupted ledger data.
    #[error("content key recovery failed")]
    KeyRecoveryFailed,
    #[error("visitor has no access to this record")]
    NoAccess,
    #[error(transparent)]
    Ecies(#[from] EciesError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub struct AccessGrantProtocol<'a, L: Ledger> {
    ledger: &'a L,
}

impl<'a, L: Ledger> AccessGrantProtocol<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// Grants a visitor access to a record, with a caller-supplied
    /// CSPRNG for the re-wrap. Owner-only: the student's private key
    /// must unwrap the record's own wrapped content key. Everything up
    /// to the ledger submission is side-effect free and abandonable;
    /// once submitted, the call resolves only on confirmation.
    pub async fn grant_with_rng(
        &self,
        record_id: RecordId,
        owner_private: &[u8],
        visitor_public: &[u8; PUBLIC_KEY_BYTES],
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Confirmation, GrantError> {
        let record = self.ledger.read_record(record_id).await?;

        let mut content_key =
            records::unwrap_content_key(&record.encrypted_key_student, owner_private)
                .map_err(|_| GrantError::KeyRecoveryFailed)?;

        let wrapped = ecies::encrypt_with_rng(&content_key, visitor_public, rng);
        content_key.zeroize();
        let wrapped = wrapped?;

        let visitor = keys::derive_address(visitor_public);
        Ok(self
            .ledger
            .write_wrapped_key(record_id, visitor, &wrapped)
            .await?)
    }

    /// `grant_with_rng` with the platform RNG.
    pub async fn grant(
        &self,
        record_id: RecordId,
        owner_private: &[u8],
        visitor_public: &[u8; PUBLIC_KEY_BYTES],
    ) -> Result<Confirmation, GrantError> {
        self.grant_with_rng(record_id, owner_private, visitor_public, &mut OsRng)
            .await
    }

    /// Revokes a visitor's access. Revoking an address that was never
    /// granted is a no-op that still confirms.
    pub async fn revoke(
        &self,
        record_id: RecordId,
        visitor: Address,
    ) -> Result<Confirmation, GrantError> {
        Ok(self.ledger.clear_wrapped_key(record_id, visitor).await?)
    }

    /// Reconciles current access by replaying the event log in block
    /// order and folding last-event-wins per visitor. The log is
    /// authoritative; there is no materialized access table. A revoke
    /// event for a visitor that was never granted is ignored — that
    /// visitor stays at `NoAccess`, not `Revoked`.
    pub async fn access_list(
        &self,
        record_id: RecordId,
    ) -> Result<HashMap<Address, AccessState>, GrantError> {
        let mut events = self.ledger.query_events(record_id, 0, None).await?;
        events.sort_by_key(|e| e.block_number);

        let mut state: HashMap<Address, AccessState> = HashMap::new();
        for event in events {
            match event.kind {
                AccessEventKind::Granted => {
                    state.insert(event.visitor, AccessState::Granted);
                }
                AccessEventKind::Revoked => {
                    if let Some(current) = state.get_mut(&event.visitor) {
                        *current = AccessState::Revoked;
                    }
                }
            }
        }
        Ok(state)
    }

    /// Point-in-time check for one visitor.
    pub async fn access_state(
        &self,
        record_id: RecordId,
        visitor: Address,
    ) -> Result<AccessState, GrantError> {
        Ok(self
            .access_list(record_id)
            .await?
            .get(&visitor)
            .copied()
            .unwrap_or(AccessState::NoAccess))
    }

    /// Visitor-side open: fetch the current wrapped key (absent after a
    /// revoke — stale local copies are worthless), unwrap it, decrypt
    /// the record data.
    pub async fn visitor_open(
        &self,
        record_id: RecordId,
        visitor: Address,
        visitor_private: &[u8],
    ) -> Result<Vec<u8>, GrantError> {
        let record = self.ledger.read_record(record_id).await?;
        let wrapped = self
            .ledger
            .read_wrapped_key(record_id, visitor)
            .await?
            .ok_or(GrantError::NoAccess)?;
        Ok(records::open_record_data(&record, &wrapped, visitor_private)?)
    }
}
