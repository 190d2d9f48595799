//! # nuclear-orm
//!
//! A small active-record ORM over PostgreSQL.
//!
//! ## Features
//!
//! - **Statement builder**: single-table SELECT/INSERT/UPDATE/DELETE with `?`
//!   placeholders and bound values
//! - **Active-record models**: fillable, guarded and hidden attribute rules,
//!   primary-key tracking, insert-or-update `save`
//! - **Blocking API**: every call returns when the database has answered
//! - **Pooling**: persistent configurations share a `deadpool-postgres` pool
//! - **Pluggable connection**: anything implementing [`Connection`], including
//!   the in-memory [`testing::RecordingConnection`]
//!
//! ## Query builder
//!
//! ```ignore
//! use nuclear_orm::{ConnectionConfig, Database, Driver};
//!
//! let config = ConnectionConfig::new(Driver::Postgres, "localhost", "shop", "app", "secret")
//!     .port(5432);
//! let db = Database::connect(&config)?;
//!
//! let rows = db
//!     .table("users")
//!     .select(&["id", "name"])
//!     .where_("status", "=", "active")
//!     .limit(10)
//!     .get()?;
//!
//! db.table("users").insert([("name", "alice")])?;
//! db.table("users").update([("status", "inactive")])?.where_("id", "=", 7).run()?;
//! db.table("users").delete().where_("id", "=", 7).run()?;
//! ```
//!
//! ## Models
//!
//! ```ignore
//! use nuclear_orm::Entity;
//!
//! struct User;
//!
//! impl Entity for User {
//!     const FILLABLE: &'static [&'static str] = &["name", "email"];
//!     const HIDDEN: &'static [&'static str] = &["password"];
//! }
//!
//! let mut user = db.model::<User>()?;
//! if user.find(1)?.is_some() {
//!     user.set("name", "Jo")?;
//!     user.save()?;
//! }
//! ```

pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod model;
pub mod pg_client;
pub mod qb;
pub mod row;
pub mod schema;
pub mod sql;
pub mod testing;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

pub use client::Connection;
pub use config::{ConnectionConfig, DEFAULT_POOL_SIZE, DEFAULT_PORT, Driver};
pub use database::Database;
pub use error::{OrmError, OrmResult};
pub use model::{Entity, Model};
pub use pg_client::PgConnection;
pub use qb::QueryBuilder;
pub use row::Record;
pub use schema::{COLUMNS_QUERY, CachedCatalog, ColumnCatalog, LiveCatalog};
pub use sql::StatementKind;
pub use value::{FromValue, Value};

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_manager_config};

// Re-export commonly used driver types
pub use rust_decimal;
pub use tokio_postgres;

#[cfg(feature = "pool")]
pub use deadpool_postgres;
