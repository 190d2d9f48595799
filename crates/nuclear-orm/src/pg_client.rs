//! Blocking PostgreSQL connection built on `tokio-postgres`.
//!
//! `PgConnection` owns a small private tokio runtime and drives every statement
//! to completion before returning, so callers see a plain synchronous API.
//! Do not call it from inside an async task: blocking on a runtime from within
//! another runtime panics.

use crate::client::Connection;
use crate::config::ConnectionConfig;
use crate::error::{OrmError, OrmResult};
use crate::row::Record;
use crate::sql::number_placeholders;
use crate::value::Value;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio_postgres::NoTls;
use tokio_postgres::types::ToSql;

/// Where statements get their connection from.
enum Target {
    /// Persistent connections checked out of a pool per statement.
    #[cfg(feature = "pool")]
    Pooled(deadpool_postgres::Pool),
    /// A fresh connection per statement.
    Direct(tokio_postgres::Config),
}

/// The production [`Connection`]: PostgreSQL via `tokio-postgres`.
pub struct PgConnection {
    runtime: Runtime,
    target: Target,
    host: String,
    statement_timeout: Option<Duration>,
}

impl PgConnection {
    /// Open a connection handle and verify the database is reachable.
    ///
    /// With `persistent = true` (and the `pool` feature) statements share a
    /// pool of `pool_size` connections; otherwise each statement connects anew.
    pub fn connect(config: &ConnectionConfig) -> OrmResult<Self> {
        config.validate()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("nuclear-orm-io")
            .enable_all()
            .build()
            .map_err(|e| OrmError::Connection(format!("failed to start runtime: {e}")))?;

        let target = Self::target_for(config)?;

        let conn = Self {
            runtime,
            target,
            host: config.host.clone(),
            statement_timeout: config.statement_timeout_duration(),
        };
        conn.ping()?;
        Ok(conn)
    }

    #[cfg(feature = "pool")]
    fn target_for(config: &ConnectionConfig) -> OrmResult<Target> {
        if config.persistent {
            Ok(Target::Pooled(crate::pool::create_pool(config)?))
        } else {
            Ok(Target::Direct(config.to_pg_config()))
        }
    }

    #[cfg(not(feature = "pool"))]
    fn target_for(config: &ConnectionConfig) -> OrmResult<Target> {
        Ok(Target::Direct(config.to_pg_config()))
    }

    fn ping(&self) -> OrmResult<()> {
        self.query("SELECT 1", &[]).map(|_| ())
    }

    /// Block on `fut`, bounded by the statement timeout if one is configured.
    fn block_on<T>(&self, fut: impl Future<Output = OrmResult<T>>) -> OrmResult<T> {
        self.runtime.block_on(with_timeout(self.statement_timeout, fut))
    }

    async fn run_query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Record>> {
        let rows = match &self.target {
            #[cfg(feature = "pool")]
            Target::Pooled(pool) => {
                let client = pool.get().await?;
                client.query(sql, params).await?
            }
            Target::Direct(config) => {
                let client = open(config).await?;
                client.query(sql, params).await?
            }
        };
        rows.iter().map(Record::from_pg_row).collect()
    }

    async fn run_execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        match &self.target {
            #[cfg(feature = "pool")]
            Target::Pooled(pool) => {
                let client = pool.get().await?;
                Ok(client.execute(sql, params).await?)
            }
            Target::Direct(config) => {
                let client = open(config).await?;
                Ok(client.execute(sql, params).await?)
            }
        }
    }
}

/// Run `fut`, failing with [`OrmError::Timeout`] once `limit` elapses.
async fn with_timeout<T>(
    limit: Option<Duration>,
    fut: impl Future<Output = OrmResult<T>>,
) -> OrmResult<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| OrmError::Timeout(limit))?,
        None => fut.await,
    }
}

async fn open(config: &tokio_postgres::Config) -> OrmResult<tokio_postgres::Client> {
    let (client, connection) = config
        .connect(NoTls)
        .await
        .map_err(|e| OrmError::Connection(e.to_string()))?;
    tokio::spawn(async move {
        if let Err(_e) = connection.await {
            #[cfg(feature = "tracing")]
            tracing::debug!(target: "nuclear_orm.sql", error = %_e, "connection closed with error");
        }
    });
    Ok(client)
}

fn bind_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl Connection for PgConnection {
    fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Record>> {
        let numbered = number_placeholders(sql);
        let refs = bind_refs(params);
        let _started = std::time::Instant::now();
        let result = self.block_on(self.run_query(&numbered, &refs));
        #[cfg(feature = "tracing")]
        trace_statement(sql, params.len(), _started.elapsed(), result.as_ref().map(|rows| rows.len() as u64));
        result
    }

    fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        let numbered = number_placeholders(sql);
        let refs = bind_refs(params);
        let _started = std::time::Instant::now();
        let result = self.block_on(self.run_execute(&numbered, &refs));
        #[cfg(feature = "tracing")]
        trace_statement(sql, params.len(), _started.elapsed(), result.as_ref().copied());
        result
    }

    fn status(&self) -> OrmResult<String> {
        self.ping()?;
        Ok(format!("{} via TCP/IP", self.host))
    }
}

impl std::fmt::Debug for PgConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match &self.target {
            #[cfg(feature = "pool")]
            Target::Pooled(_) => "pooled",
            Target::Direct(_) => "direct",
        };
        f.debug_struct("PgConnection")
            .field("host", &self.host)
            .field("mode", &mode)
            .field("statement_timeout", &self.statement_timeout)
            .finish()
    }
}

#[cfg(feature = "tracing")]
const MAX_LOGGED_SQL_BYTES: usize = 200;

#[cfg(feature = "tracing")]
fn trace_statement(sql: &str, params: usize, elapsed: Duration, result: Result<u64, &OrmError>) {
    use crate::sql::{StatementKind, clip_for_log};

    let kind = StatementKind::detect(sql);
    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
    let shown = clip_for_log(sql, MAX_LOGGED_SQL_BYTES);
    match result {
        Ok(rows) => tracing::debug!(
            target: "nuclear_orm.sql",
            kind = ?kind,
            params,
            rows,
            elapsed_ms,
            sql = %shown,
            "statement executed"
        ),
        Err(err) => tracing::debug!(
            target: "nuclear_orm.sql",
            kind = ?kind,
            params,
            elapsed_ms,
            sql = %shown,
            error = %err,
            "statement failed"
        ),
    }
}
