use debt_ledger_model::LedgerRecord;
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorCode {
    NotFound,
    Io,
    Encode,
}

impl StoreErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Io => "io_error",
            Self::Encode => "encode_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for StoreError {}

/// What a whole-file read saw, beyond the records themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub lines: usize,
    pub blank: usize,
    /// 1-based line numbers that were skipped.
    pub malformed: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct LoadedLedger {
    pub records: Vec<LedgerRecord>,
    pub stats: LoadStats,
    /// sha256 of the bytes read.
    pub fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistReceipt {
    pub bytes_written: usize,
    pub fingerprint: String,
}

pub trait LedgerStore {
    /// Human-readable location used in logs and reports.
    fn location(&self) -> String;

    /// Reads the whole ledger. Malformed lines are skipped, never fatal.
    fn load(&self) -> Result<LoadedLedger, StoreError>;

    /// Replaces the whole ledger with `records`, in order. Either every
    /// record is durably written or the previous contents remain.
    fn persist(&self, records: &[LedgerRecord]) -> Result<PersistReceipt, StoreError>;
}
