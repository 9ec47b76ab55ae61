use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

pub const DEFAULT_IDENTITY_FIELD: &str = "identity";
pub const DEFAULT_MUTABLE_FIELDS: [&str; 2] = ["severity", "status"];

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    EmptyIdentityField,
    EmptyFieldName,
    DuplicateField(String),
    IdentityIsMutable(String),
    NoMutableFields,
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyIdentityField => f.write_str("identity field name must not be empty"),
            Self::EmptyFieldName => f.write_str("mutable field name must not be empty"),
            Self::DuplicateField(name) => write!(f, "mutable field `{name}` listed twice"),
            Self::IdentityIsMutable(name) => {
                write!(f, "identity field `{name}` cannot be a mutable field")
            }
            Self::NoMutableFields => f.write_str("at least one mutable field is required"),
        }
    }
}

impl std::error::Error for SchemaError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MutableField(String);

impl MutableField {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MutableField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which field correlates records and which fields flow from the
/// authoritative ledger into the target ledger. The direction is fixed:
/// a defined authoritative value always replaces the target value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSchema {
    identity_field: String,
    mutable_fields: Vec<MutableField>,
}

impl LedgerSchema {
    pub fn new<I, S>(identity_field: &str, mutable_fields: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if identity_field.is_empty() {
            return Err(SchemaError::EmptyIdentityField);
        }
        let mut seen = BTreeSet::new();
        let mut fields = Vec::new();
        for name in mutable_fields {
            let name = name.as_ref();
            if name.is_empty() {
                return Err(SchemaError::EmptyFieldName);
            }
            if name == identity_field {
                return Err(SchemaError::IdentityIsMutable(name.to_string()));
            }
            if !seen.insert(name.to_string()) {
                return Err(SchemaError::DuplicateField(name.to_string()));
            }
            fields.push(MutableField(name.to_string()));
        }
        if fields.is_empty() {
            return Err(SchemaError::NoMutableFields);
        }
        Ok(Self {
            identity_field: identity_field.to_string(),
            mutable_fields: fields,
        })
    }

    #[must_use]
    pub fn identity_field(&self) -> &str {
        &self.identity_field
    }

    /// In declaration order; change sets list fields in this order.
    #[must_use]
    pub fn mutable_fields(&self) -> &[MutableField] {
        &self.mutable_fields
    }
}

impl Default for LedgerSchema {
    fn default() -> Self {
        Self {
            identity_field: DEFAULT_IDENTITY_FIELD.to_string(),
            mutable_fields: DEFAULT_MUTABLE_FIELDS
                .iter()
                .map(|name| MutableField((*name).to_string()))
                .collect(),
        }
    }
}
