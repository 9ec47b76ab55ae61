use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty(&'static str),
    NotAString(&'static str),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "{name} must not be empty"),
            Self::NotAString(name) => write!(f, "{name} must be a JSON string"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Content-derived digest computed upstream. Opaque here: never recomputed,
/// never normalized. The only rejected value is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordIdentity(String);

impl RecordIdentity {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError::Empty("identity"));
        }
        Ok(Self(input.to_string()))
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, ParseError> {
        match value {
            serde_json::Value::String(s) => Self::parse(s),
            _ => Err(ParseError::NotAString("identity")),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordIdentity {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(ParseError::Empty("identity"));
        }
        Ok(Self(value))
    }
}

impl From<RecordIdentity> for String {
    fn from(value: RecordIdentity) -> Self {
        value.0
    }
}

impl Display for RecordIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
