use debt_ledger_core::canonical::stable_json_string;
use debt_ledger_core::ExitCode;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::{ReconcileMode, ReconcileOutcome, SideLoad};

pub const REPORT_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SideSummary {
    pub location: String,
    pub records: usize,
    pub malformed_lines: Vec<usize>,
    pub blank_lines: usize,
    pub unkeyed_records: usize,
    pub duplicate_identities: usize,
    pub fingerprint: String,
}

impl From<&SideLoad> for SideSummary {
    fn from(side: &SideLoad) -> Self {
        Self {
            location: side.location.clone(),
            records: side.records,
            malformed_lines: side.stats.malformed.clone(),
            blank_lines: side.stats.blank,
            unkeyed_records: side.unkeyed,
            duplicate_identities: side.duplicates,
            fingerprint: side.fingerprint.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEntry {
    pub identity: String,
    pub line: usize,
    pub field: String,
    /// `null` when the target lacked the field.
    pub old: Option<Value>,
    pub new: Value,
}

/// Summary of one run. Both encodings are rendered from this value, so they
/// always agree on counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub schema_version: &'static str,
    pub mode: ReconcileMode,
    pub authoritative: SideSummary,
    pub target: SideSummary,
    pub correlated: usize,
    pub changes_by_field: BTreeMap<String, usize>,
    pub severity_changes: usize,
    pub status_changes: usize,
    pub total_changes: usize,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_fingerprint_after: Option<String>,
    pub change_set: Vec<ChangeEntry>,
}

impl ReconcileReport {
    #[must_use]
    pub fn from_outcome(outcome: &ReconcileOutcome) -> Self {
        let changes = &outcome.changes;
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            mode: outcome.mode,
            authoritative: SideSummary::from(&outcome.authoritative),
            target: SideSummary::from(&outcome.target),
            correlated: changes.correlated(),
            changes_by_field: changes.by_field(),
            severity_changes: changes.count_for("severity"),
            status_changes: changes.count_for("status"),
            total_changes: changes.len(),
            applied: outcome.applied(),
            target_fingerprint_after: outcome.written.as_ref().map(|r| r.fingerprint.clone()),
            change_set: changes
                .iter()
                .map(|c| ChangeEntry {
                    identity: c.identity.to_string(),
                    line: c.line,
                    field: c.field.to_string(),
                    old: c.old.clone(),
                    new: c.new.clone(),
                })
                .collect(),
        }
    }

    /// 0 when nothing drifted or drift was written, 1 when drift was left in
    /// place.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.total_changes == 0 || self.applied {
            ExitCode::Success
        } else {
            ExitCode::DriftDetected
        }
    }

    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        stable_json_string(self)
    }

    #[must_use]
    pub fn render_human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "debt-ledger reconcile ({})", self.mode.as_str());
        let _ = writeln!(
            out,
            "authoritative: {} ({} records)",
            self.authoritative.location, self.authoritative.records
        );
        let _ = writeln!(
            out,
            "target: {} ({} records)",
            self.target.location, self.target.records
        );
        let _ = writeln!(out, "correlated: {}", self.correlated);
        let _ = writeln!(out, "severity changes: {}", self.severity_changes);
        let _ = writeln!(out, "status changes: {}", self.status_changes);
        for (field, count) in &self.changes_by_field {
            if field != "severity" && field != "status" {
                let _ = writeln!(out, "{field} changes: {count}");
            }
        }
        let _ = writeln!(out, "total changes: {}", self.total_changes);
        let _ = writeln!(out, "applied: {}", if self.applied { "yes" } else { "no" });
        for (label, side) in [
            ("authoritative", &self.authoritative),
            ("target", &self.target),
        ] {
            if !side.malformed_lines.is_empty() {
                let lines: Vec<String> = side.malformed_lines.iter().map(usize::to_string).collect();
                let _ = writeln!(out, "skipped malformed {label} lines: {}", lines.join(", "));
            }
        }
        for change in &self.change_set {
            let old = change
                .old
                .as_ref()
                .map_or_else(|| "<absent>".to_string(), Value::to_string);
            let _ = writeln!(
                out,
                "  {} (line {}) {}: {old} -> {}",
                change.identity, change.line, change.field, change.new
            );
        }
        if self.exit_code() == ExitCode::DriftDetected {
            let _ = writeln!(
                out,
                "drift detected; rerun with --apply to update {}",
                self.target.location
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reconciler;
    use debt_ledger_model::LedgerSchema;
    use debt_ledger_store::MemoryLedgerStore;

    fn report(mode: ReconcileMode, master: &str, deduped: &str) -> ReconcileReport {
        let auth = MemoryLedgerStore::new("debt/master.jsonl", master);
        let target = MemoryLedgerStore::new("debt/deduped.jsonl", deduped);
        let outcome = Reconciler::new(LedgerSchema::default(), mode)
            .run(&auth, &target)
            .expect("run");
        ReconcileReport::from_outcome(&outcome)
    }

    const MASTER: &str = "{\"identity\":\"h1\",\"severity\":\"S0\",\"status\":\"open\"}\n";
    const DEDUPED: &str = "{\"identity\":\"h1\",\"severity\":\"S1\"}\nnot json\n";

    #[test]
    fn preview_with_drift_exits_one_and_hints() {
        let r = report(ReconcileMode::Preview, MASTER, DEDUPED);
        assert_eq!(r.exit_code(), ExitCode::DriftDetected);
        assert_eq!(r.severity_changes, 1);
        assert_eq!(r.status_changes, 1);
        assert_eq!(r.total_changes, 2);
        assert_eq!(r.target.malformed_lines, vec![2]);
        let human = r.render_human();
        assert!(human.contains("severity changes: 1"));
        assert!(human.contains("  h1 (line 1) status: <absent> -> \"open\""));
        assert!(human.contains("skipped malformed target lines: 2"));
        assert!(human.trim_end().ends_with("update debt/deduped.jsonl"));
    }

    #[test]
    fn apply_exits_zero_and_records_new_fingerprint() {
        let r = report(ReconcileMode::Apply, MASTER, DEDUPED);
        assert_eq!(r.exit_code(), ExitCode::Success);
        assert!(r.applied);
        assert!(r.target_fingerprint_after.is_some());
        assert!(!r.render_human().contains("rerun with --apply"));
    }

    #[test]
    fn json_encoding_is_key_sorted_and_matches_counts() {
        let r = report(ReconcileMode::Preview, MASTER, DEDUPED);
        let text = r.render_json().expect("json");
        assert!(!text.contains('\n'));
        let value: Value = serde_json::from_str(&text).expect("parse");
        assert_eq!(value["mode"], "preview");
        assert_eq!(value["total_changes"], 2);
        assert_eq!(value["changes_by_field"]["severity"], 1);
        assert_eq!(value["change_set"][1]["old"], Value::Null);
        assert!(value.get("target_fingerprint_after").is_none());
        let keys: Vec<&String> = value.as_object().expect("object").keys().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn no_drift_exits_zero_in_preview() {
        let r = report(ReconcileMode::Preview, MASTER, MASTER);
        assert_eq!(r.exit_code(), ExitCode::Success);
        assert!(r.change_set.is_empty());
    }
}
