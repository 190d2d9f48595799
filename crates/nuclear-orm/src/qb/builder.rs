//! The stateful statement builder.

use crate::client::Connection;
use crate::error::{OrmError, OrmResult};
use crate::qb::clause::{Operation, Predicate, render_predicates};
use crate::row::Record;
use crate::schema::COLUMNS_QUERY;
use crate::sql::{count_placeholders, inline_values};
use crate::value::Value;
use std::fmt;
use std::fmt::Write;
use std::sync::Arc;

/// Accumulates one single-table statement and its bound values.
///
/// Shaping calls (`select`, `update`, `delete`) pick the statement kind;
/// `where_`/`and` add predicates; terminal calls (`run`, `get`) render and
/// execute. With no shaping call the builder renders `SELECT * FROM <table>`.
///
/// Table and column names are interpolated as given and must be trusted.
/// Only values travel as bound parameters.
///
/// A builder is one in-flight statement: use a fresh one (or [`reset`]) per
/// query, and do not share one between threads.
///
/// [`reset`]: QueryBuilder::reset
#[derive(Clone)]
pub struct QueryBuilder {
    connection: Arc<dyn Connection>,
    table: String,
    operation: Operation,
    predicates: Vec<Predicate>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl QueryBuilder {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            table: String::new(),
            operation: Operation::default(),
            predicates: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Set the target table. Existence is not checked.
    pub fn table(&mut self, name: impl Into<String>) -> &mut Self {
        self.table = name.into();
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Shape a `SELECT`. An empty list or a lone `*` selects every column.
    pub fn select<S: AsRef<str>>(&mut self, columns: &[S]) -> &mut Self {
        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
        let columns = if columns.len() == 1 && columns[0] == "*" {
            Vec::new()
        } else {
            columns
        };
        self.operation = Operation::Select { columns };
        self
    }

    /// Shape a `SELECT *`.
    pub fn select_all(&mut self) -> &mut Self {
        self.operation = Operation::default();
        self
    }

    /// Add a `<column> <operator> ?` predicate bound to `value`.
    pub fn where_(
        &mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.predicates.push(Predicate::new(column, operator, value));
        self
    }

    /// Add a conjunct. Renders the same as [`where_`](Self::where_) after the first predicate.
    pub fn and(
        &mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.where_(column, operator, value)
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.offset = Some(n);
        self
    }

    /// Insert one row and execute immediately, returning the affected row count.
    ///
    /// Keys keep the order the caller supplied them in; a repeated key keeps its
    /// first position and its last value.
    pub fn insert<I, K, V>(&mut self, data: I) -> OrmResult<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let row: Record = data.into_iter().collect();
        if row.is_empty() {
            return Err(OrmError::invalid_argument("insert requires at least one column"));
        }
        self.operation = Operation::Insert { row };
        self.run()
    }

    /// Shape an `UPDATE ... SET`. Does not execute, so predicates can follow.
    pub fn update<I, K, V>(&mut self, data: I) -> OrmResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let row: Record = data.into_iter().collect();
        if row.is_empty() {
            return Err(OrmError::invalid_argument("update requires at least one column"));
        }
        self.operation = Operation::Update { row };
        Ok(self)
    }

    /// Shape a `DELETE FROM`. Does not execute.
    pub fn delete(&mut self) -> &mut Self {
        self.operation = Operation::Delete;
        self
    }

    /// Clear the statement (shape, predicates, paging), keeping the table.
    pub fn reset(&mut self) -> &mut Self {
        self.operation = Operation::default();
        self.predicates.clear();
        self.limit = None;
        self.offset = None;
        self
    }

    /// Look up the column names of `table` in the schema catalog, in ordinal order.
    pub fn qualify_columns(&self, table: &str) -> OrmResult<Vec<String>> {
        let rows = self
            .connection
            .query(COLUMNS_QUERY, &[Value::from(table)])?;
        rows.iter()
            .map(|row| row.try_get::<String>("column_name"))
            .collect()
    }

    /// The parameterized SQL text.
    pub fn query(&self) -> String {
        let mut sql = String::with_capacity(64);
        self.operation.render(&self.table, &mut sql);
        if self.operation.takes_predicates() {
            render_predicates(&self.predicates, &mut sql);
        }
        if self.operation.takes_paging() {
            if let Some(n) = self.limit {
                let _ = write!(sql, " LIMIT {n}");
            }
            if let Some(n) = self.offset {
                let _ = write!(sql, " OFFSET {n}");
            }
        }
        sql
    }

    /// Bound values, in placeholder order.
    pub fn values(&self) -> Vec<Value> {
        let mut values: Vec<Value> = self.operation.values().cloned().collect();
        if self.operation.takes_predicates() {
            values.extend(self.predicates.iter().map(|p| p.value.clone()));
        }
        values
    }

    /// The SQL with literal values in place of placeholders. For display only.
    pub fn statement(&self) -> String {
        inline_values(&self.query(), &self.values())
    }

    fn validate(&self, sql: &str, values: &[Value]) -> OrmResult<()> {
        if self.table.trim().is_empty() {
            return Err(OrmError::invalid_argument("no table set"));
        }
        if let Operation::Select { columns } = &self.operation {
            if columns.iter().any(|c| c.trim().is_empty()) {
                return Err(OrmError::invalid_argument("empty column name in projection"));
            }
        }
        let placeholders = count_placeholders(sql);
        if placeholders != values.len() {
            return Err(OrmError::execution(format!(
                "statement has {placeholders} placeholders but {} bound values",
                values.len()
            )));
        }
        Ok(())
    }

    /// Execute the statement, returning the number of affected rows.
    pub fn prepare_and_execute(&self) -> OrmResult<u64> {
        let sql = self.query();
        let values = self.values();
        self.validate(&sql, &values)?;
        self.connection.execute(&sql, &values)
    }

    /// Alias of [`prepare_and_execute`](Self::prepare_and_execute).
    pub fn run(&self) -> OrmResult<u64> {
        self.prepare_and_execute()
    }

    /// Execute the statement and return every row.
    pub fn get(&self) -> OrmResult<Vec<Record>> {
        let sql = self.query();
        let values = self.values();
        self.validate(&sql, &values)?;
        self.connection.query(&sql, &values)
    }

    /// Execute the statement and return the first row, if any.
    pub fn first(&self) -> OrmResult<Option<Record>> {
        Ok(self.get()?.into_iter().next())
    }
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.table)
            .field("operation", &self.operation)
            .field("predicates", &self.predicates)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish()
    }
}
