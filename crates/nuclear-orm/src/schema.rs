//! Column discovery for models.
//!
//! Every [`Model`](crate::Model) learns its table's columns when it boots.
//! [`LiveCatalog`] asks the database each time; [`CachedCatalog`] remembers
//! the answer per table until told otherwise.

use crate::client::Connection;
use crate::error::OrmResult;
use crate::qb::QueryBuilder;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Column names of one table in the current schema, in ordinal order.
pub const COLUMNS_QUERY: &str = "SELECT column_name::text AS column_name \
FROM information_schema.columns \
WHERE table_schema = current_schema() AND table_name = ? \
ORDER BY ordinal_position";

/// Source of a table's column names.
pub trait ColumnCatalog: Send + Sync {
    fn columns(&self, table: &str) -> OrmResult<Vec<String>>;
}

/// Queries the schema catalog on every call.
#[derive(Clone)]
pub struct LiveCatalog {
    connection: Arc<dyn Connection>,
}

impl LiveCatalog {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self { connection }
    }
}

impl ColumnCatalog for LiveCatalog {
    fn columns(&self, table: &str) -> OrmResult<Vec<String>> {
        QueryBuilder::new(self.connection.clone()).qualify_columns(table)
    }
}

/// Memoizes another catalog per table name.
///
/// Errors are not cached. After a migration, call [`invalidate`] or [`clear`]
/// so the next boot sees the new columns.
///
/// [`invalidate`]: CachedCatalog::invalidate
/// [`clear`]: CachedCatalog::clear
pub struct CachedCatalog<C> {
    inner: C,
    tables: RwLock<HashMap<String, Arc<[String]>>>,
}

impl<C: ColumnCatalog> CachedCatalog<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Forget the cached columns of `table`.
    pub fn invalidate(&self, table: &str) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(table);
    }

    /// Forget every cached table.
    pub fn clear(&self) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn is_cached(&self, table: &str) -> bool {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(table)
    }
}

impl<C: ColumnCatalog> ColumnCatalog for CachedCatalog<C> {
    fn columns(&self, table: &str) -> OrmResult<Vec<String>> {
        if let Some(cols) = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
        {
            return Ok(cols.to_vec());
        }

        let cols: Arc<[String]> = self.inner.columns(table)?.into();
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table.to_string(), cols.clone());
        Ok(cols.to_vec())
    }
}

impl<C: ColumnCatalog + ?Sized> ColumnCatalog for Arc<C> {
    fn columns(&self, table: &str) -> OrmResult<Vec<String>> {
        (**self).columns(table)
    }
}
