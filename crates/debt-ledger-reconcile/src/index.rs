use debt_ledger_model::{LedgerRecord, LedgerSchema, RecordIdentity};
use std::collections::HashMap;

/// identity -> last record carrying it.
#[derive(Debug)]
pub struct IdentityIndex<'a> {
    entries: HashMap<RecordIdentity, &'a LedgerRecord>,
    duplicates: usize,
    unkeyed: usize,
}

impl<'a> IdentityIndex<'a> {
    /// Later lines win on duplicate identity. Records without a usable
    /// identity are left out and only counted.
    #[must_use]
    pub fn build(records: &'a [LedgerRecord], schema: &LedgerSchema) -> Self {
        let mut entries = HashMap::with_capacity(records.len());
        let mut duplicates = 0;
        let mut unkeyed = 0;
        for record in records {
            let Some(identity) = record.identity(schema.identity_field()) else {
                unkeyed += 1;
                continue;
            };
            if let Some(previous) = entries.insert(identity.clone(), record) {
                duplicates += 1;
                tracing::warn!(
                    identity = %identity,
                    replaced_line = previous.line_number(),
                    line = record.line_number(),
                    "duplicate identity; later record wins"
                );
            }
        }
        Self {
            entries,
            duplicates,
            unkeyed,
        }
    }

    #[must_use]
    pub fn get(&self, identity: &RecordIdentity) -> Option<&'a LedgerRecord> {
        self.entries.get(identity).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    #[must_use]
    pub fn unkeyed(&self) -> usize {
        self.unkeyed
    }
}
