// Ledger collaborator boundary
//
// The on-chain registry contract is external to this crate. It is an
// append-only store plus event log behind a fixed call interface; every
// state-changing call is asynchronous and resolves only once the ledger
// confirms inclusion. The core never retries a state-changing call —
// a retry could double-submit.

use serde::{Deserialize, Serialize};

use crate::config::ADDRESS_BYTES;

pub mod memory;

pub use memory::MemoryLedger;

pub type RecordId = u64;
pub type Address = [u8; ADDRESS_BYTES];

/// An on-chain record as the contract stores it. `encrypted_data` is
/// protected by a single content key that exists at rest only in
/// wrapped (ECIES) form; `encrypted_key_student` and
/// `encrypted_key_institution` wrap that same key for different holders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub record_id: RecordId,
    pub student: Address,
    pub institution: Address,
    /// hex: nonce(12) || ciphertext+tag
    pub encrypted_data: String,
    /// ECIES payload wrapping the content key for the institution
    pub encrypted_key_institution: String,
    /// ECIES payload wrapping the content key for the student
    pub encrypted_key_student: String,
    /// hex r||s||v, institution signature over keccak256(encrypted_data)
    pub signature: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessEventKind {
    Granted,
    Revoked,
}

/// One entry of the grant/revoke event log. Block order is the only
/// ordering guarantee the ledger gives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEvent {
    pub record_id: RecordId,
    pub visitor: Address,
    pub kind: AccessEventKind,
    pub block_number: u64,
}

/// Proof that a state-changing call was included in the ledger.
/// "Submitted" without one of these means nothing happened yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub block_number: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("unknown record")]
    UnknownRecord,
    /// Surfaced verbatim to the caller; the reason comes from the
    /// contract and is not interpreted here.
    #[error("ledger rejected the call: {0}")]
    Rejected(String),
}

/// The fixed call interface of the registry contract.
pub trait Ledger {
    /// Read a record by id.
    fn read_record(
        &self,
        record_id: RecordId,
    ) -> impl std::future::Future<Output = Result<Record, LedgerError>> + Send;

    /// Register a new record (institution-side registration path).
    fn submit_record(
        &self,
        record: Record,
    ) -> impl std::future::Future<Output = Result<Confirmation, LedgerError>> + Send;

    /// Persist a wrapped content key for a visitor (grant).
    fn write_wrapped_key(
        &self,
        record_id: RecordId,
        visitor: Address,
        wrapped_key: &str,
    ) -> impl std::future::Future<Output = Result<Confirmation, LedgerError>> + Send;

    /// Clear the wrapped-key mapping for a visitor (revoke).
    fn clear_wrapped_key(
        &self,
        record_id: RecordId,
        visitor: Address,
    ) -> impl std::future::Future<Output = Result<Confirmation, LedgerError>> + Send;

    /// Fetch the current wrapped key for a visitor, if any. This is the
    /// single point-in-time query; grant state is never cached locally.
    fn read_wrapped_key(
        &self,
        record_id: RecordId,
        visitor: Address,
    ) -> impl std::future::Future<Output = Result<Option<String>, LedgerError>> + Send;

    /// Grant/revoke events for a record within a block window, in block
    /// order. `to_block = None` means "up to the current tip".
    fn query_events(
        &self,
        record_id: RecordId,
        from_block: u64,
        to_block: Option<u64>,
    ) -> impl std::future::Future<Output = Result<Vec<AccessEvent>, LedgerError>> + Send;
}
