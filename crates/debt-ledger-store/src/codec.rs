use debt_ledger_core::sha256_hex;
use debt_ledger_model::LedgerRecord;

use crate::{LoadStats, LoadedLedger, StoreError, StoreErrorCode};

/// Splits on `\n`, drops a trailing `\r`, skips blank lines and records the
/// line numbers of anything that is not UTF-8 JSON object text.
#[must_use]
pub fn decode_ledger(location: &str, bytes: &[u8]) -> LoadedLedger {
    let mut stats = LoadStats::default();
    let mut records = Vec::new();

    for (idx, chunk) in bytes.split_inclusive(|b| *b == b'\n').enumerate() {
        let line_number = idx + 1;
        stats.lines += 1;
        let chunk = chunk.strip_suffix(b"\n").unwrap_or(chunk);
        let chunk = chunk.strip_suffix(b"\r").unwrap_or(chunk);

        let Ok(line) = std::str::from_utf8(chunk) else {
            tracing::warn!(ledger = location, line = line_number, "skipping non-utf8 line");
            stats.malformed.push(line_number);
            continue;
        };
        if line.trim().is_empty() {
            stats.blank += 1;
            continue;
        }
        match LedgerRecord::from_line(line, line_number) {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::warn!(
                    ledger = location,
                    line = line_number,
                    error = %err,
                    "skipping malformed ledger line"
                );
                stats.malformed.push(line_number);
            }
        }
    }

    LoadedLedger {
        records,
        stats,
        fingerprint: sha256_hex(bytes),
    }
}

/// One record per line, newline-terminated, input order preserved.
pub fn encode_ledger(records: &[LedgerRecord]) -> Result<Vec<u8>, StoreError> {
    let mut out = Vec::new();
    for record in records {
        let line = record
            .to_line()
            .map_err(|e| StoreError::new(StoreErrorCode::Encode, e.to_string()))?;
        out.extend_from_slice(line.as_bytes());
        out.push(b'\n');
    }
    Ok(out)
}
