//! Connection pool utilities

use crate::config::ConnectionConfig;
use crate::error::{OrmError, OrmResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolBuilder, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;

/// Create a connection pool from a [`ConnectionConfig`].
///
/// Uses `NoTls`, `config.pool_size` connections, and the configured connect
/// timeout for both creating a connection and waiting for a free slot.
pub fn create_pool(config: &ConnectionConfig) -> OrmResult<Pool> {
    create_pool_with_manager_config(config, default_manager_config(), |builder| builder)
}

/// Create a connection pool with an injected `deadpool_postgres::ManagerConfig`
/// and a hook to tune the `PoolBuilder` further.
pub fn create_pool_with_manager_config(
    config: &ConnectionConfig,
    manager_config: ManagerConfig,
    configure_pool: impl FnOnce(PoolBuilder) -> PoolBuilder,
) -> OrmResult<Pool> {
    config.validate()?;

    let mgr = Manager::from_config(config.to_pg_config(), NoTls, manager_config);
    let mut builder = Pool::builder(mgr).max_size(config.pool_size);
    if let Some(timeout) = config.connect_timeout_duration() {
        builder = builder
            .runtime(Runtime::Tokio1)
            .create_timeout(Some(timeout))
            .wait_timeout(Some(timeout));
    }

    configure_pool(builder)
        .build()
        .map_err(|e| OrmError::Pool(e.to_string()))
}

fn default_manager_config() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    }
}
