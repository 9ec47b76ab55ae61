#![forbid(unsafe_code)]
//! Ledger persistence. A ledger is a line-delimited JSON file read and
//! rewritten as a whole; stages receive a [`LedgerStore`] instead of a path.

mod backend;
mod backend_local;
mod backend_memory;
mod backend_shared_helpers;
mod codec;

pub use backend::{LedgerStore, LoadStats, LoadedLedger, PersistReceipt, StoreError, StoreErrorCode};
pub use backend_local::{temp_path_for, JsonlFileStore};
pub use backend_memory::MemoryLedgerStore;
pub use codec::{decode_ledger, encode_ledger};

pub const CRATE_NAME: &str = "debt-ledger-store";
