//! The shared database handle.

use crate::client::Connection;
use crate::config::ConnectionConfig;
use crate::error::OrmResult;
use crate::model::{Entity, Model};
use crate::pg_client::PgConnection;
use crate::qb::QueryBuilder;
use crate::schema::{CachedCatalog, ColumnCatalog, LiveCatalog};
use std::fmt;
use std::sync::Arc;

/// A connection plus the column catalog models boot from.
///
/// Create one at startup and clone it wherever builders or models are needed;
/// clones share the same connection (and pool).
#[derive(Clone)]
pub struct Database {
    connection: Arc<dyn Connection>,
    catalog: Arc<dyn ColumnCatalog>,
}

impl Database {
    /// Wrap an existing connection. Models query the schema catalog on every boot.
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        let catalog = Arc::new(LiveCatalog::new(connection.clone()));
        Self {
            connection,
            catalog,
        }
    }

    /// Connect to PostgreSQL.
    pub fn connect(config: &ConnectionConfig) -> OrmResult<Self> {
        let connection = PgConnection::connect(config)?;
        #[cfg(feature = "tracing")]
        tracing::info!(
            target: "nuclear_orm",
            host = %config.host,
            database = %config.database,
            persistent = config.persistent,
            "connected"
        );
        Ok(Self::new(Arc::new(connection)))
    }

    /// Replace the column catalog.
    pub fn with_catalog(mut self, catalog: Arc<dyn ColumnCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Remember each table's columns after the first model boot.
    pub fn with_cached_catalog(self) -> Self {
        let cached = CachedCatalog::new(LiveCatalog::new(self.connection.clone()));
        self.with_catalog(Arc::new(cached))
    }

    /// A fresh builder with no table set.
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::new(self.connection.clone())
    }

    /// A fresh builder targeting `name`.
    pub fn table(&self, name: &str) -> QueryBuilder {
        let mut qb = self.query();
        qb.table(name);
        qb
    }

    /// Boot a new model of `E`.
    pub fn model<E: Entity>(&self) -> OrmResult<Model<E>> {
        Model::boot(self.connection.clone(), self.catalog.as_ref())
    }

    /// Round-trip the connection and describe it, e.g. `localhost via TCP/IP`.
    pub fn status(&self) -> OrmResult<String> {
        self.connection.status()
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub fn catalog(&self) -> &Arc<dyn ColumnCatalog> {
        &self.catalog
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingConnection;

    struct Post;
    impl Entity for Post {
        const FILLABLE: &'static [&'static str] = &["title"];
    }

    #[test]
    fn models_boot_through_the_catalog() {
        let conn = Arc::new(RecordingConnection::new().with_columns("posts", &["id", "title"]));
        let db = Database::new(conn.clone());

        let post = db.model::<Post>().unwrap();
        assert_eq!(post.columns(), ["id", "title"]);
        db.model::<Post>().unwrap();
        assert_eq!(conn.statements().len(), 2);
    }

    #[test]
    fn cached_catalog_skips_repeat_lookups() {
        let conn = Arc::new(RecordingConnection::new().with_columns("posts", &["id", "title"]));
        let db = Database::new(conn.clone()).with_cached_catalog();

        db.model::<Post>().unwrap();
        db.clone().model::<Post>().unwrap();
        assert_eq!(conn.statements().len(), 1);
    }

    #[test]
    fn table_builder_and_status() {
        let conn = Arc::new(RecordingConnection::new());
        let db = Database::new(conn);
        assert_eq!(db.table("posts").query(), "SELECT * FROM posts");
        assert_eq!(db.status().unwrap(), "localhost via TCP/IP");
    }
}
