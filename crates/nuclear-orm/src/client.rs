//! The connection seam between the query layer and a database driver.

use crate::error::OrmResult;
use crate::row::Record;
use crate::value::Value;

/// A live, query-able database handle.
///
/// Statements use positional `?` placeholders, and `params` are bound to them
/// in order. Every call blocks until the driver returns.
///
/// Implementations decide how connections are shared: [`PgConnection`]
/// checks a connection out of a pool per statement (or opens a fresh one), and
/// [`RecordingConnection`] keeps everything in memory for tests.
///
/// [`PgConnection`]: crate::PgConnection
/// [`RecordingConnection`]: crate::testing::RecordingConnection
pub trait Connection: Send + Sync {
    /// Execute a query and return all rows.
    fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Record>>;

    /// Execute a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64>;

    /// Human-readable connection status (performs a round trip).
    fn status(&self) -> OrmResult<String>;

    /// Execute a query and return the first row, if any.
    fn query_opt(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Record>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }
}

impl<C: Connection + ?Sized> Connection for std::sync::Arc<C> {
    fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Record>> {
        (**self).query(sql, params)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        (**self).execute(sql, params)
    }

    fn status(&self) -> OrmResult<String> {
        (**self).status()
    }
}
