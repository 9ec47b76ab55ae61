use debt_ledger_model::{LedgerRecord, LedgerSchema, MutableField, RecordIdentity};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use crate::IdentityIndex;

/// One field of one target record that disagrees with the authoritative side.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    /// Index into the target record sequence.
    pub position: usize,
    /// 1-based line in the target ledger.
    pub line: usize,
    pub identity: RecordIdentity,
    pub field: MutableField,
    /// `None` when the target record lacks the field.
    pub old: Option<Value>,
    pub new: Value,
}

#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    changes: Vec<FieldChange>,
    fields: Vec<MutableField>,
    correlated: usize,
    target_unkeyed: usize,
    target_duplicates: usize,
}

impl ChangeSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.changes.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[FieldChange] {
        &self.changes
    }

    #[must_use]
    pub fn count_for(&self, field: &str) -> usize {
        self.changes
            .iter()
            .filter(|c| c.field.as_str() == field)
            .count()
    }

    /// Every field of the schema, zero when unchanged.
    #[must_use]
    pub fn by_field(&self) -> BTreeMap<String, usize> {
        let mut out: BTreeMap<String, usize> = self
            .fields
            .iter()
            .map(|f| (f.as_str().to_string(), 0))
            .collect();
        for change in &self.changes {
            *out.entry(change.field.as_str().to_string()).or_default() += 1;
        }
        out
    }

    /// Target records whose identity was found on the authoritative side.
    #[must_use]
    pub fn correlated(&self) -> usize {
        self.correlated
    }

    #[must_use]
    pub fn target_unkeyed(&self) -> usize {
        self.target_unkeyed
    }

    #[must_use]
    pub fn target_duplicates(&self) -> usize {
        self.target_duplicates
    }
}

/// Walks `target` in order and compares each correlated record against the
/// authoritative one, field by field in schema order.
///
/// A change is produced only when the authoritative value is defined
/// (present, not `null`) and not exactly equal to the target value; a missing
/// target value counts as different. Target records without a match are
/// neither changed nor reported.
#[must_use]
pub fn diff(
    target: &[LedgerRecord],
    authoritative: &IdentityIndex<'_>,
    schema: &LedgerSchema,
) -> ChangeSet {
    let mut set = ChangeSet {
        fields: schema.mutable_fields().to_vec(),
        ..ChangeSet::default()
    };
    let mut seen = HashSet::with_capacity(target.len());

    for (position, record) in target.iter().enumerate() {
        let Some(identity) = record.identity(schema.identity_field()) else {
            set.target_unkeyed += 1;
            continue;
        };
        if !seen.insert(identity.clone()) {
            set.target_duplicates += 1;
        }
        let Some(source) = authoritative.get(&identity) else {
            continue;
        };
        set.correlated += 1;

        for field in schema.mutable_fields() {
            let Some(wanted) = source.defined(field.as_str()) else {
                continue;
            };
            let current = record.get(field.as_str());
            if current == Some(wanted) {
                continue;
            }
            tracing::debug!(
                identity = %identity,
                field = %field,
                old = ?current,
                new = %wanted,
                "field drift"
            );
            set.changes.push(FieldChange {
                position,
                line: record.line_number(),
                identity: identity.clone(),
                field: field.clone(),
                old: current.cloned(),
                new: wanted.clone(),
            });
        }
    }
    set
}
