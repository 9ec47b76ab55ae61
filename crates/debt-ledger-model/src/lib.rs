#![forbid(unsafe_code)]
//! Debt ledger record model.
//!
//! A ledger line is an arbitrary JSON object. Only two things about it are
//! interpreted here: the identity field used to correlate the same logical
//! record across ledgers, and the table of mutable fields that reconciliation
//! may rewrite. Everything else is an opaque payload carried verbatim.

mod identity;
mod record;
mod schema;

pub use identity::{ParseError, RecordIdentity};
pub use record::{LedgerRecord, RecordParseError};
pub use schema::{
    LedgerSchema, MutableField, SchemaError, DEFAULT_IDENTITY_FIELD, DEFAULT_MUTABLE_FIELDS,
};

pub const CRATE_NAME: &str = "debt-ledger-model";
