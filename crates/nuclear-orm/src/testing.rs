//! An in-memory [`Connection`] for tests.
//!
//! [`RecordingConnection`] records every statement with its bound values and
//! answers from a queue of canned responses, so builders and models can be
//! exercised without a database.
//!
//! ```ignore
//! use nuclear_orm::testing::RecordingConnection;
//!
//! let conn = RecordingConnection::new().with_columns("users", &["id", "name"]);
//! conn.push_rows(vec![record]);
//! conn.push_affected(1);
//! ```

use crate::client::Connection;
use crate::error::{OrmError, OrmResult};
use crate::row::Record;
use crate::schema::COLUMNS_QUERY;
use crate::value::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A statement as it reached the connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug)]
enum Response {
    Rows(Vec<Record>),
    Affected(u64),
    Error(String),
}

#[derive(Debug, Default)]
struct State {
    statements: Vec<ExecutedStatement>,
    responses: VecDeque<Response>,
    columns: HashMap<String, Vec<String>>,
}

/// Records statements and replays queued responses in order.
///
/// Column lookups for tables registered with [`with_columns`] are answered
/// from that registry and do not consume a queued response. Everything else
/// takes the next response; with none queued, queries return no rows and
/// statements affect zero rows.
///
/// [`with_columns`]: RecordingConnection::with_columns
#[derive(Debug)]
pub struct RecordingConnection {
    host: String,
    state: Mutex<State>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self {
            host: "localhost".to_string(),
            state: Mutex::default(),
        }
    }

    /// Register the columns reported for `table`.
    pub fn with_columns(self, table: &str, columns: &[&str]) -> Self {
        self.lock().columns.insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    /// Queue a row set for the next query.
    pub fn push_rows(&self, rows: Vec<Record>) {
        self.lock().responses.push_back(Response::Rows(rows));
    }

    /// Queue an affected-row count for the next statement.
    pub fn push_affected(&self, rows: u64) {
        self.lock().responses.push_back(Response::Affected(rows));
    }

    /// Queue an execution failure for the next call.
    pub fn push_error(&self, message: impl Into<String>) {
        self.lock().responses.push_back(Response::Error(message.into()));
    }

    /// Every statement received so far, oldest first.
    pub fn statements(&self) -> Vec<ExecutedStatement> {
        self.lock().statements.clone()
    }

    pub fn last_statement(&self) -> Option<ExecutedStatement> {
        self.lock().statements.last().cloned()
    }

    pub fn clear_statements(&self) {
        self.lock().statements.clear();
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(state: &mut State, sql: &str, params: &[Value]) {
        state.statements.push(ExecutedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
    }

    fn registered_columns(state: &State, sql: &str, params: &[Value]) -> Option<Vec<Record>> {
        if sql != COLUMNS_QUERY {
            return None;
        }
        let table = params.first()?.as_str()?;
        let columns = state.columns.get(table)?;
        Some(
            columns
                .iter()
                .map(|c| Record::from_iter([("column_name", c.as_str())]))
                .collect(),
        )
    }
}

impl Default for RecordingConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for RecordingConnection {
    fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Record>> {
        let mut state = self.lock();
        Self::record(&mut state, sql, params);
        if let Some(rows) = Self::registered_columns(&state, sql, params) {
            return Ok(rows);
        }
        match state.responses.pop_front() {
            Some(Response::Rows(rows)) => Ok(rows),
            Some(Response::Affected(_)) | None => Ok(Vec::new()),
            Some(Response::Error(message)) => Err(OrmError::execution(message)),
        }
    }

    fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        let mut state = self.lock();
        Self::record(&mut state, sql, params);
        match state.responses.pop_front() {
            Some(Response::Affected(n)) => Ok(n),
            Some(Response::Rows(rows)) => Ok(rows.len() as u64),
            None => Ok(0),
            Some(Response::Error(message)) => Err(OrmError::execution(message)),
        }
    }

    fn status(&self) -> OrmResult<String> {
        Ok(format!("{} via TCP/IP", self.host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_responses_in_order() {
        let conn = RecordingConnection::new();
        conn.push_affected(3);
        conn.push_error("boom");

        assert_eq!(conn.execute("DELETE FROM t", &[]).unwrap(), 3);
        assert!(conn.execute("DELETE FROM t", &[]).unwrap_err().is_execution_failure());
        assert_eq!(conn.execute("DELETE FROM t", &[]).unwrap(), 0);
        assert_eq!(conn.statements().len(), 3);
    }

    #[test]
    fn answers_column_lookups_from_registry() {
        let conn = RecordingConnection::new().with_columns("users", &["id", "name"]);
        conn.push_affected(1);

        let rows = conn.query(COLUMNS_QUERY, &[Value::from("users")]).unwrap();
        let names: Vec<String> = rows
            .iter()
            .map(|r| r.try_get::<String>("column_name").unwrap())
            .collect();
        assert_eq!(names, vec!["id", "name"]);
        // the queued response is still there
        assert_eq!(conn.execute("UPDATE t SET a = ?", &[Value::from(1)]).unwrap(), 1);
    }
}
