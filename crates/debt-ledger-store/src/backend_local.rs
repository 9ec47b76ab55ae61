use debt_ledger_core::sha256_hex;
use debt_ledger_model::LedgerRecord;
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend_shared_helpers::{io_error, sync_dir, write_and_sync};
use crate::codec::{decode_ledger, encode_ledger};
use crate::{LedgerStore, LoadedLedger, PersistReceipt, StoreError, StoreErrorCode};

pub struct JsonlFileStore {
    path: PathBuf,
}

impl JsonlFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Sibling file the rewrite is staged in before it is renamed into place.
#[must_use]
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("ledger.jsonl");
    parent_dir(path).join(format!(".{name}.reconcile.tmp"))
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

impl LedgerStore for JsonlFileStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<LoadedLedger, StoreError> {
        let bytes = fs::read(&self.path).map_err(|e| io_error("read", &self.path, &e))?;
        let loaded = decode_ledger(&self.location(), &bytes);
        tracing::info!(
            ledger = %self.path.display(),
            records = loaded.records.len(),
            malformed = loaded.stats.malformed.len(),
            "ledger loaded"
        );
        Ok(loaded)
    }

    fn persist(&self, records: &[LedgerRecord]) -> Result<PersistReceipt, StoreError> {
        let bytes = encode_ledger(records)?;
        // Rewrite the file a symlink points at, not the link itself.
        let target = match fs::canonicalize(&self.path) {
            Ok(resolved) => resolved,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.path.clone(),
            Err(e) => return Err(io_error("resolve", &self.path, &e)),
        };
        let parent = parent_dir(&target);
        if !parent.is_dir() {
            return Err(StoreError::new(
                StoreErrorCode::NotFound,
                format!("ledger directory {} does not exist", parent.display()),
            ));
        }

        let tmp = temp_path_for(&target);
        if let Err(err) = write_and_sync(&tmp, &bytes) {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        if let Ok(meta) = fs::metadata(&target) {
            if let Err(e) = fs::set_permissions(&tmp, meta.permissions()) {
                let _ = fs::remove_file(&tmp);
                return Err(io_error("copy permissions onto", &tmp, &e));
            }
        }
        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(io_error("rename into", &target, &e));
        }
        // The rename is already committed; a failed directory sync only
        // weakens durability across power loss.
        if let Err(err) = sync_dir(&parent) {
            tracing::warn!(ledger = %self.path.display(), error = %err, "directory sync failed");
        }

        tracing::info!(
            ledger = %self.path.display(),
            records = records.len(),
            bytes = bytes.len(),
            "ledger rewritten"
        );
        Ok(PersistReceipt {
            bytes_written: bytes.len(),
            fingerprint: sha256_hex(&bytes),
        })
    }
}
