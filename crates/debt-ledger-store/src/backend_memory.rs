use debt_ledger_core::sha256_hex;
use debt_ledger_model::LedgerRecord;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::codec::{decode_ledger, encode_ledger};
use crate::{LedgerStore, LoadedLedger, PersistReceipt, StoreError, StoreErrorCode};

#[derive(Debug)]
struct MemoryState {
    contents: Option<Vec<u8>>,
    writes: usize,
    fail_persist: bool,
}

/// In-process ledger. Used by tests of every stage that takes a
/// [`LedgerStore`], including forced write failures.
#[derive(Debug)]
pub struct MemoryLedgerStore {
    location: String,
    state: Mutex<MemoryState>,
}

impl MemoryLedgerStore {
    #[must_use]
    pub fn new(location: &str, contents: &str) -> Self {
        Self::with_state(location, Some(contents.as_bytes().to_vec()))
    }

    /// A store whose backing data does not exist; `load` fails with `NotFound`.
    #[must_use]
    pub fn missing(location: &str) -> Self {
        Self::with_state(location, None)
    }

    #[must_use]
    pub fn failing_persist(self) -> Self {
        self.lock().fail_persist = true;
        self
    }

    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.lock()
            .contents
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    #[must_use]
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    fn with_state(location: &str, contents: Option<Vec<u8>>) -> Self {
        Self {
            location: location.to_string(),
            state: Mutex::new(MemoryState {
                contents,
                writes: 0,
                fail_persist: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn location(&self) -> String {
        self.location.clone()
    }

    fn load(&self) -> Result<LoadedLedger, StoreError> {
        let state = self.lock();
        let bytes = state.contents.as_ref().ok_or_else(|| {
            StoreError::new(
                StoreErrorCode::NotFound,
                format!("read {}: no such ledger", self.location),
            )
        })?;
        Ok(decode_ledger(&self.location, bytes))
    }

    fn persist(&self, records: &[LedgerRecord]) -> Result<PersistReceipt, StoreError> {
        let bytes = encode_ledger(records)?;
        let mut state = self.lock();
        if state.fail_persist {
            return Err(StoreError::new(
                StoreErrorCode::Io,
                format!("write {}: store is read-only", self.location),
            ));
        }
        let receipt = PersistReceipt {
            bytes_written: bytes.len(),
            fingerprint: sha256_hex(&bytes),
        };
        state.contents = Some(bytes);
        state.writes += 1;
        Ok(receipt)
    }
}
