//! Row mapping: ordered column-name → value records.

use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};
use indexmap::IndexMap;
use serde::Serialize;

/// One row (or one model's attribute set): column names mapped to values.
///
/// Keys are unique and keep insertion order, so a record built from a mapping
/// renders its columns in the order the caller supplied them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    entries: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Insert or replace a value. A replaced key keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Value at a column position.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.entries.get_index(index).map(|(_, v)| v)
    }

    /// Typed access to a column.
    pub fn try_get<T: FromValue>(&self, name: &str) -> OrmResult<T> {
        let value = self
            .get(name)
            .ok_or_else(|| OrmError::decode(name, "column not present in record"))?;
        T::from_value(value).map_err(|e| match e {
            OrmError::Decode { message, .. } => OrmError::decode(name, message),
            other => other,
        })
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Remove a column, shifting later columns down so order is preserved.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.shift_remove(name)
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Value) -> bool) {
        self.entries.retain(|k, v| keep(k, v));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode a `tokio-postgres` row, keeping the server's column order.
    pub fn from_pg_row(row: &tokio_postgres::Row) -> OrmResult<Self> {
        let mut record = Record::with_capacity(row.len());
        for (idx, column) in row.columns().iter().enumerate() {
            let value: Value = row
                .try_get(idx)
                .map_err(|e| OrmError::decode(column.name(), e.to_string()))?;
            record.insert(column.name(), value);
        }
        Ok(record)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Record {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.entries
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
