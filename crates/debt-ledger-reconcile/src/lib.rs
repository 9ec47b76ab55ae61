#![forbid(unsafe_code)]
//! Directional reconciliation of mutable ledger fields.
//!
//! The authoritative ledger's values win. Target records are matched by
//! identity only; the target never gains, loses, or reorders records, and
//! only fields named by the [`debt_ledger_model::LedgerSchema`] are written.

mod apply;
mod diff;
mod index;
mod report;

pub use apply::{
    apply_changes, LedgerSide, ReconcileError, ReconcileMode, ReconcileOutcome, Reconciler,
    SideLoad,
};
pub use diff::{diff, ChangeSet, FieldChange};
pub use index::IdentityIndex;
pub use report::{ChangeEntry, ReconcileReport, SideSummary, REPORT_SCHEMA_VERSION};

pub const CRATE_NAME: &str = "debt-ledger-reconcile";
