use debt_ledger_core::ErrorCode;
use debt_ledger_model::{LedgerRecord, LedgerSchema};
use debt_ledger_store::{LedgerStore, LoadStats, PersistReceipt, StoreError};
use serde::Serialize;
use std::fmt::{Display, Formatter};

use crate::{diff, ChangeSet, IdentityIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    Preview,
    Apply,
}

impl ReconcileMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Apply => "apply",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerSide {
    Authoritative,
    Target,
}

impl LedgerSide {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authoritative => "authoritative",
            Self::Target => "target",
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum ReconcileError {
    Load { side: LedgerSide, source: StoreError },
    Persist(StoreError),
}

impl ReconcileError {
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Load { .. } => ErrorCode::InputUnreadable,
            Self::Persist(_) => ErrorCode::OutputUnwritable,
        }
    }
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load { side, source } => {
                write!(f, "cannot read {} ledger: {source}", side.as_str())
            }
            Self::Persist(source) => write!(f, "cannot write target ledger: {source}"),
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load { source, .. } | Self::Persist(source) => Some(source),
        }
    }
}

/// Load-time facts about one side of a run.
#[derive(Debug, Clone)]
pub struct SideLoad {
    pub location: String,
    pub records: usize,
    pub stats: LoadStats,
    pub unkeyed: usize,
    pub duplicates: usize,
    pub fingerprint: String,
}

#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub mode: ReconcileMode,
    pub authoritative: SideLoad,
    pub target: SideLoad,
    pub changes: ChangeSet,
    /// Target records after the run; identical to the loaded ones in preview.
    pub records: Vec<LedgerRecord>,
    /// Set only when the target was rewritten.
    pub written: Option<PersistReceipt>,
}

impl ReconcileOutcome {
    #[must_use]
    pub fn applied(&self) -> bool {
        self.written.is_some()
    }
}

/// Writes every change into `records`. Returns how many were applied.
pub fn apply_changes(records: &mut [LedgerRecord], changes: &ChangeSet) -> usize {
    let mut applied = 0;
    for change in changes.iter() {
        let Some(record) = records.get_mut(change.position) else {
            tracing::warn!(position = change.position, "change points past target end");
            continue;
        };
        record.set_field(change.field.as_str(), change.new.clone());
        applied += 1;
    }
    applied
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    schema: LedgerSchema,
    mode: ReconcileMode,
}

impl Reconciler {
    #[must_use]
    pub fn new(schema: LedgerSchema, mode: ReconcileMode) -> Self {
        Self { schema, mode }
    }

    #[must_use]
    pub fn schema(&self) -> &LedgerSchema {
        &self.schema
    }

    #[must_use]
    pub fn mode(&self) -> ReconcileMode {
        self.mode
    }

    /// One reconciliation pass. The authoritative store is only ever read.
    /// The target is persisted once, in apply mode, and only when something
    /// changed.
    pub fn run(
        &self,
        authoritative: &dyn LedgerStore,
        target: &dyn LedgerStore,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let auth_loaded = authoritative.load().map_err(|source| ReconcileError::Load {
            side: LedgerSide::Authoritative,
            source,
        })?;
        let target_loaded = target.load().map_err(|source| ReconcileError::Load {
            side: LedgerSide::Target,
            source,
        })?;

        let index = IdentityIndex::build(&auth_loaded.records, &self.schema);
        let changes = diff(&target_loaded.records, &index, &self.schema);
        tracing::info!(
            mode = self.mode.as_str(),
            authoritative = auth_loaded.records.len(),
            target = target_loaded.records.len(),
            correlated = changes.correlated(),
            changes = changes.len(),
            "reconcile diff computed"
        );

        let authoritative_side = SideLoad {
            location: authoritative.location(),
            records: auth_loaded.records.len(),
            stats: auth_loaded.stats,
            unkeyed: index.unkeyed(),
            duplicates: index.duplicates(),
            fingerprint: auth_loaded.fingerprint,
        };
        let target_side = SideLoad {
            location: target.location(),
            records: target_loaded.records.len(),
            stats: target_loaded.stats,
            unkeyed: changes.target_unkeyed(),
            duplicates: changes.target_duplicates(),
            fingerprint: target_loaded.fingerprint,
        };

        let mut records = target_loaded.records;
        let mut written = None;
        if self.mode == ReconcileMode::Apply && !changes.is_empty() {
            let applied = apply_changes(&mut records, &changes);
            let receipt = target.persist(&records).map_err(ReconcileError::Persist)?;
            tracing::info!(
                location = %target_side.location,
                applied,
                bytes = receipt.bytes_written,
                "target ledger rewritten"
            );
            written = Some(receipt);
        }

        Ok(ReconcileOutcome {
            mode: self.mode,
            authoritative: authoritative_side,
            target: target_side,
            changes,
            records,
            written,
        })
    }
}
