//! Record accessor capability and the store's map-backed record.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Name of the identifier column when metadata reports none.
pub const DEFAULT_IDENTIFIER: &str = "id";

/// Read/write access to a record's attributes by field identifier.
///
/// A missing attribute is never an error: `get` returns `None` and `set`
/// returns `false` without touching the record.
pub trait Record: Send + Sync {
    fn get(&self, identifier: &str) -> Option<Value>;

    fn set(&mut self, identifier: &str, value: Value) -> bool;

    /// The record's identifier value, `None` when it has none yet.
    fn id(&self) -> Option<Value> {
        self.get(DEFAULT_IDENTIFIER).filter(|v| !v.is_null())
    }
}

/// A record whose attributes are an ordered set of columns.
///
/// Only columns known at construction can be written; writes to any other
/// name are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    #[serde(flatten)]
    columns: IndexMap<String, Value>,
    #[serde(skip)]
    identifier: Option<String>,
}

impl RowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank record with every column set to null.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(|c| (c.into(), Value::Null)).collect(),
            identifier: None,
        }
    }

    /// Add or replace a column.
    pub fn column(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.insert(name.into(), value.into());
        self
    }

    /// Name the identifier column used by [`Record::id`].
    pub fn identified_by(mut self, column: impl Into<String>) -> Self {
        self.identifier = Some(column.into());
        self
    }

    pub fn identifier_column(&self) -> &str {
        self.identifier.as_deref().unwrap_or(DEFAULT_IDENTIFIER)
    }

    pub fn columns(&self) -> &IndexMap<String, Value> {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }
}

impl Record for RowRecord {
    fn get(&self, identifier: &str) -> Option<Value> {
        self.columns.get(identifier).cloned()
    }

    fn set(&mut self, identifier: &str, value: Value) -> bool {
        match self.columns.get_mut(identifier) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn id(&self) -> Option<Value> {
        self.get(self.identifier_column()).filter(|v| !v.is_null())
    }
}
