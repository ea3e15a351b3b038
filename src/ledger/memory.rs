// In-process ledger
//
// Backs the integration tests and the CLI demo flows. Mirrors the
// contract's semantics: monotonically increasing block numbers, an
// append-only event log, last-write-wins wrapped-key mappings. Calls
// never hold the lock across an await point (there are none).

use std::collections::HashMap;
use std::sync::Mutex;

use super::{
    AccessEvent, AccessEventKind, Address, Confirmation, Ledger, LedgerError, Record, RecordId,
};

#[derive(Default)]
struct Inner {
    records: HashMap<RecordId, Record>,
    wrapped_keys: HashMap<(RecordId, Address), String>,
    events: Vec<AccessEvent>,
    block_number: u64,
    reject_reason: Option<String>,
}

#[derive(Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent state-changing call fail with the given
    /// reason, for exercising rejection paths in tests.
    pub fn reject_writes(&self, reason: &str) {
        self.inner.lock().unwrap().reject_reason = Some(reason.to_string());
    }

    pub fn accept_writes(&self) {
        self.inner.lock().unwrap().reject_reason = None;
    }

    fn admit(inner: &mut Inner) -> Result<u64, LedgerError> {
        if let Some(reason) = &inner.reject_reason {
            return Err(LedgerError::Rejected(reason.clone()));
        }
        inner.block_number += 1;
        Ok(inner.block_number)
    }
}

impl Ledger for MemoryLedger {
    async fn read_record(&self, record_id: RecordId) -> Result<Record, LedgerError> {
        let inner = self.inner.lock().unwrap();
        inner
            .records
            .get(&record_id)
            .cloned()
            .ok_or(LedgerError::UnknownRecord)
    }

    async fn submit_record(&self, record: Record) -> Result<Confirmation, LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.records.contains_key(&record.record_id) {
            return Err(LedgerError::Rejected("record id already exists".into()));
        }
        let block_number = Self::admit(&mut inner)?;
        inner.records.insert(record.record_id, record);
        Ok(Confirmation { block_number })
    }

    async fn write_wrapped_key(
        &self,
        record_id: RecordId,
        visitor: Address,
        wrapped_key: &str,
    ) -> Result<Confirmation, LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.records.contains_key(&record_id) {
            return Err(LedgerError::UnknownRecord);
        }
        let block_number = Self::admit(&mut inner)?;
        inner
            .wrapped_keys
            .insert((record_id, visitor), wrapped_key.to_string());
        inner.events.push(AccessEvent {
            record_id,
            visitor,
            kind: AccessEventKind::Granted,
            block_number,
        });
        Ok(Confirmation { block_number })
    }

    async fn clear_wrapped_key(
        &self,
        record_id: RecordId,
        visitor: Address,
    ) -> Result<Confirmation, LedgerError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.records.contains_key(&record_id) {
            return Err(LedgerError::UnknownRecord);
        }
        let block_number = Self::admit(&mut inner)?;
        inner.wrapped_keys.remove(&(record_id, visitor));
        inner.events.push(AccessEvent {
            record_id,
            visitor,
            kind: AccessEventKind::Revoked,
            block_number,
        });
        Ok(Confirmation { block_number })
    }

    async fn read_wrapped_key(
        &self,
        record_id: RecordId,
        visitor: Address,
    ) -> Result<Option<String>, LedgerError> {
        let inner = self.inner.lock().unwrap();
        if !inner.records.contains_key(&record_id) {
            return Err(LedgerError::UnknownRecord);
        }
        Ok(inner.wrapped_keys.get(&(record_id, visitor)).cloned())
    }

    async fn query_events(
        &self,
        record_id: RecordId,
        from_block: u64,
        to_block: Option<u64>,
    ) -> Result<Vec<AccessEvent>, LedgerError> {
        let inner = self.inner.lock().unwrap();
        let tip = inner.block_number;
        let to = to_block.unwrap_or(tip);
        Ok(inner
            .events
            .iter()
            .filter(|e| {
                e.record_id == record_id && e.block_number >= from_block && e.block_number <= to
            })
            .cloned()
            .collect())
    }
}
