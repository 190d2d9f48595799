//! Active-record models.
//!
//! A [`Model`] binds one in-memory attribute set to one row of its entity's
//! table. It enforces the entity's fillable, guarded and hidden rules, tracks
//! the row identity once a lookup succeeds, and picks INSERT or UPDATE on
//! [`save`](Model::save).
//!
//! ```ignore
//! let db = Database::connect(&config)?;
//!
//! let mut user = db.model::<User>()?;
//! user.set("name", "Jo")?;
//! user.save()?; // INSERT INTO users (name) VALUES (?)
//!
//! let mut user = db.model::<User>()?;
//! if user.find(1)?.is_some() {
//!     user.set("name", "Joanna")?;
//!     user.save()?; // UPDATE users SET name = ? WHERE id = ?
//! }
//! ```

mod entity;

pub use entity::{Entity, derive_table_name};

use crate::client::Connection;
use crate::error::{OrmError, OrmResult};
use crate::qb::QueryBuilder;
use crate::row::Record;
use crate::schema::ColumnCatalog;
use crate::value::{FromValue, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// One row of `E`'s table.
///
/// A model starts out new (`exists() == false`). A successful [`find`] hydrates
/// it from the database and captures the primary key value; from then on
/// [`save`] updates that row. Saving a new model inserts its attributes and
/// leaves it new: the generated key is not read back.
///
/// Every terminal operation runs on its own builder. `select`, `where_`, `and`,
/// `limit` and `offset` accumulate a pending query that the next [`fetch`] or
/// [`all`] executes and clears.
///
/// [`find`]: Model::find
/// [`save`]: Model::save
/// [`fetch`]: Model::fetch
/// [`all`]: Model::all
pub struct Model<E> {
    connection: Arc<dyn Connection>,
    table: String,
    columns: Vec<String>,
    attributes: Record,
    exists: bool,
    primary_key_value: Option<Value>,
    pending: Option<QueryBuilder>,
    projected: bool,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Model<E> {
    /// Create a new model, discovering the table's columns through `catalog`.
    pub fn boot(connection: Arc<dyn Connection>, catalog: &dyn ColumnCatalog) -> OrmResult<Self> {
        let table = E::table_name();
        let columns = catalog.columns(&table)?;
        Ok(Self {
            connection,
            table,
            columns,
            attributes: Record::new(),
            exists: false,
            primary_key_value: None,
            pending: None,
            projected: false,
            _entity: PhantomData,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Column names discovered at boot, in ordinal order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether this model was hydrated from a stored row.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn primary_key(&self) -> &'static str {
        E::PRIMARY_KEY
    }

    /// The key captured by the last successful [`find`](Model::find).
    pub fn primary_key_value(&self) -> Option<&Value> {
        self.primary_key_value.as_ref()
    }

    /// Every attribute, hidden ones included.
    pub fn attributes(&self) -> &Record {
        &self.attributes
    }

    /// Attributes minus the hidden ones.
    pub fn visible_attributes(&self) -> Record {
        let mut visible = self.attributes.clone();
        visible.retain(|name, _| !Self::is_hidden(name));
        visible
    }

    /// Writable through mass assignment: fillable and not guarded.
    pub fn is_fillable(name: &str) -> bool {
        E::FILLABLE.iter().any(|f| *f == name) && !Self::is_guarded(name)
    }

    pub fn is_guarded(name: &str) -> bool {
        E::GUARDED.iter().any(|g| *g == name)
    }

    pub fn is_hidden(name: &str) -> bool {
        E::HIDDEN.iter().any(|h| *h == name)
    }

    fn check_fillable<'a>(mut names: impl Iterator<Item = &'a str>) -> OrmResult<()> {
        match names.find(|name| !Self::is_fillable(name)) {
            Some(name) => Err(OrmError::MassAssignment(name.to_string())),
            None => Ok(()),
        }
    }

    /// Read an attribute.
    ///
    /// Fails with `AttributeNotFound` when it is not set and with
    /// `HiddenAttribute` when it is hidden.
    pub fn get(&self, name: &str) -> OrmResult<&Value> {
        let value = self
            .attributes
            .get(name)
            .ok_or_else(|| OrmError::AttributeNotFound(name.to_string()))?;
        if Self::is_hidden(name) {
            return Err(OrmError::HiddenAttribute(name.to_string()));
        }
        Ok(value)
    }

    pub fn get_as<T: FromValue>(&self, name: &str) -> OrmResult<T> {
        T::from_value(self.get(name)?).map_err(|e| match e {
            OrmError::Decode { message, .. } => OrmError::decode(name, message),
            other => other,
        })
    }

    /// Write a fillable attribute.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> OrmResult<()> {
        Self::check_fillable(std::iter::once(name))?;
        self.attributes.insert(name, value);
        Ok(())
    }

    /// Write several attributes. Nothing is written if any of them is not fillable.
    pub fn fill<I, K, V>(&mut self, data: I) -> OrmResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let data: Record = data.into_iter().collect();
        Self::check_fillable(data.keys())?;
        self.attributes.extend(data);
        Ok(self)
    }

    fn builder(&self) -> QueryBuilder {
        let mut qb = QueryBuilder::new(self.connection.clone());
        qb.table(self.table.clone());
        qb
    }

    fn pending_builder(&mut self) -> &mut QueryBuilder {
        let connection = self.connection.clone();
        let table = self.table.clone();
        self.pending.get_or_insert_with(|| {
            let mut qb = QueryBuilder::new(connection);
            qb.table(table);
            qb
        })
    }

    /// Resolve a requested projection against the hidden rules.
    ///
    /// An empty request or one containing `*` means every discovered column.
    fn projection<S: AsRef<str>>(&self, columns: &[S]) -> OrmResult<Vec<String>> {
        let wildcard = columns.is_empty() || columns.iter().any(|c| c.as_ref() == "*");
        let projection: Vec<String> = if wildcard {
            self.columns
                .iter()
                .filter(|c| !Self::is_hidden(c))
                .cloned()
                .collect()
        } else {
            columns
                .iter()
                .map(|c| c.as_ref())
                .filter(|c| !Self::is_hidden(c))
                .map(str::to_string)
                .collect()
        };
        if projection.is_empty() {
            return Err(OrmError::invalid_argument(format!(
                "no visible columns to select from {}",
                self.table
            )));
        }
        Ok(projection)
    }

    /// Set the pending query's projection, minus hidden columns.
    pub fn select<S: AsRef<str>>(&mut self, columns: &[S]) -> OrmResult<&mut Self> {
        let projection = self.projection(columns)?;
        self.pending_builder().select(&projection);
        self.projected = true;
        Ok(self)
    }

    pub fn where_(
        &mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.pending_builder().where_(column, operator, value);
        self
    }

    pub fn and(
        &mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.pending_builder().and(column, operator, value);
        self
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.pending_builder().limit(n);
        self
    }

    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.pending_builder().offset(n);
        self
    }

    /// The query accumulated by `select`/`where_`/`and`/`limit`/`offset`, if any.
    pub fn pending(&self) -> Option<&QueryBuilder> {
        self.pending.as_ref()
    }

    /// Run the pending query and clear it.
    ///
    /// Without an explicit `select`, every visible column is projected.
    pub fn fetch(&mut self) -> OrmResult<Vec<Record>> {
        if !self.projected {
            let projection = self.projection::<&str>(&[])?;
            self.pending_builder().select(&projection);
        }
        let qb = self.pending.take().unwrap_or_else(|| self.builder());
        self.projected = false;
        qb.get()
    }

    /// Every row, projected without hidden columns.
    ///
    /// Pending predicates and paging still apply; a pending projection does not.
    pub fn all(&mut self) -> OrmResult<Vec<Record>> {
        self.projected = false;
        self.fetch()
    }

    /// Insert one row. Every key must be fillable; nothing is sent otherwise.
    pub fn create<I, K, V>(&self, data: I) -> OrmResult<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let data: Record = data.into_iter().collect();
        Self::check_fillable(data.keys())?;
        self.builder().insert(data)
    }

    /// Update the row this model was found as, then merge `data` into its attributes.
    pub fn update<I, K, V>(&mut self, data: I) -> OrmResult<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let data: Record = data.into_iter().collect();
        Self::check_fillable(data.keys())?;
        let key = self.require_key("update")?;

        let affected = self
            .builder()
            .update(data.clone())?
            .where_(E::PRIMARY_KEY, "=", key)
            .run()?;
        self.attributes.extend(data);
        Ok(affected)
    }

    fn require_key(&self, action: &str) -> OrmResult<Value> {
        self.primary_key_value.clone().ok_or_else(|| {
            OrmError::invalid_argument(format!(
                "cannot {action} a {} row without a {} value; find it first",
                self.table,
                E::PRIMARY_KEY
            ))
        })
    }

    /// Look up the row whose primary key equals `key`, projecting every visible column.
    pub fn find(&mut self, key: impl Into<Value>) -> OrmResult<Option<Record>> {
        self.find_with(key, &["*"])
    }

    /// Look up the row whose primary key equals `key`.
    ///
    /// On a hit the model is hydrated: its attributes become the row, it is
    /// marked as existing, and the key is captured. On a miss the model is left
    /// untouched.
    pub fn find_with<S: AsRef<str>>(
        &mut self,
        key: impl Into<Value>,
        columns: &[S],
    ) -> OrmResult<Option<Record>> {
        let key = key.into();
        let projection = self.projection(columns)?;
        let mut qb = self.builder();
        qb.select(&projection).where_(E::PRIMARY_KEY, "=", key.clone());

        let Some(row) = qb.first()? else {
            return Ok(None);
        };
        self.primary_key_value = Some(row.get(E::PRIMARY_KEY).cloned().unwrap_or(key));
        self.attributes = row.clone();
        self.exists = true;
        Ok(Some(row))
    }

    /// Persist the attributes: UPDATE when hydrated, INSERT otherwise.
    ///
    /// An update sends the fillable attributes except the primary key. An
    /// insert sends every attribute and does not mark the model as existing.
    pub fn save(&mut self) -> OrmResult<u64> {
        if self.exists {
            let mut data = self.attributes.clone();
            data.retain(|name, _| name != E::PRIMARY_KEY && Self::is_fillable(name));
            self.update(data)
        } else {
            self.create(self.attributes.clone())
        }
    }

    /// Delete the row this model was found as. The model becomes new again.
    ///
    /// Only fillable attributes other than the primary key survive, so a later
    /// [`save`](Model::save) inserts a fresh row from them.
    pub fn delete(&mut self) -> OrmResult<u64> {
        let key = self.require_key("delete")?;
        let affected = self
            .builder()
            .delete()
            .where_(E::PRIMARY_KEY, "=", key)
            .run()?;
        self.exists = false;
        self.primary_key_value = None;
        self.attributes
            .retain(|name, _| name != E::PRIMARY_KEY && Self::is_fillable(name));
        Ok(affected)
    }
}

impl<E: Entity> fmt::Debug for Model<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("table", &self.table)
            .field("columns", &self.columns)
            .field("attributes", &self.visible_attributes())
            .field("exists", &self.exists)
            .field("primary_key_value", &self.primary_key_value)
            .field("pending", &self.pending)
            .finish()
    }
}

#[cfg(test)]
mod tests;
