use serde_json::value::RawValue;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::ops::Range;

use crate::RecordIdentity;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordParseError {
    InvalidJson(String),
    NotAnObject(&'static str),
}

impl Display for RecordParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(msg) => write!(f, "invalid json: {msg}"),
            Self::NotAnObject(kind) => write!(f, "expected a json object, found {kind}"),
        }
    }
}

impl std::error::Error for RecordParseError {}

/// One ledger line.
///
/// A record keeps its exact source text and the byte span of every top-level
/// value in it. [`LedgerRecord::to_line`] returns the source text unchanged
/// until a field is written through [`LedgerRecord::set_field`]; after that
/// only the written values are spliced in, and a key the line did not have is
/// appended before the closing brace. Every other byte of the line survives.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRecord {
    fields: Map<String, Value>,
    source: String,
    spans: BTreeMap<String, Range<usize>>,
    dirty: BTreeSet<String>,
    line_number: usize,
}

impl LedgerRecord {
    pub fn from_line(line: &str, line_number: usize) -> Result<Self, RecordParseError> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| RecordParseError::InvalidJson(e.to_string()))?;
        let fields = match value {
            Value::Object(fields) => fields,
            other => return Err(RecordParseError::NotAnObject(json_kind(&other))),
        };
        let raw: BTreeMap<String, &RawValue> = serde_json::from_str(line)
            .map_err(|e| RecordParseError::InvalidJson(e.to_string()))?;
        let spans = raw
            .into_iter()
            .filter_map(|(name, value)| span_within(line, value.get()).map(|span| (name, span)))
            .collect();
        Ok(Self {
            fields,
            source: line.to_string(),
            spans,
            dirty: BTreeSet::new(),
            line_number,
        })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Present and not JSON `null`.
    #[must_use]
    pub fn defined(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// `None` when the identity field is absent, not a string, or empty.
    #[must_use]
    pub fn identity(&self, identity_field: &str) -> Option<RecordIdentity> {
        self.fields
            .get(identity_field)
            .and_then(|v| RecordIdentity::from_json(v).ok())
    }

    /// Returns the previous value. An existing key keeps its position.
    pub fn set_field(&mut self, name: &str, value: Value) -> Option<Value> {
        self.dirty.insert(name.to_string());
        self.fields.insert(name.to_string(), value)
    }

    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.dirty.is_empty()
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        if self.dirty.is_empty() {
            return Ok(self.source.clone());
        }

        let mut appended = Vec::new();
        for (name, value) in &self.fields {
            if self.dirty.contains(name) && !self.spans.contains_key(name) {
                appended.push(format!(
                    "{}:{}",
                    serde_json::to_string(name)?,
                    serde_json::to_string(value)?
                ));
            }
        }
        let mut edits: Vec<(Range<usize>, String)> = Vec::new();
        for name in &self.dirty {
            if let (Some(span), Some(value)) = (self.spans.get(name), self.fields.get(name)) {
                edits.push((span.clone(), serde_json::to_string(value)?));
            }
        }
        // Spans never overlap; splice from the back so earlier offsets stay valid.
        edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));

        let mut line = self.source.clone();
        if !appended.is_empty() {
            let close = line.rfind('}').unwrap_or(line.len());
            let separator = if self.spans.is_empty() { "" } else { "," };
            line.insert_str(close, &format!("{separator}{}", appended.join(",")));
        }
        for (span, text) in edits {
            line.replace_range(span, &text);
        }
        Ok(line)
    }
}

/// Byte range of `value`, a slice borrowed from `line`.
fn span_within(line: &str, value: &str) -> Option<Range<usize>> {
    let start = (value.as_ptr() as usize).checked_sub(line.as_ptr() as usize)?;
    let end = start.checked_add(value.len())?;
    (end <= line.len() && line.get(start..end) == Some(value)).then_some(start..end)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
