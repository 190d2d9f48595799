//! Single-table SQL statement builder.
//!
//! A [`QueryBuilder`] accumulates one statement and its bound values through
//! chained `&mut self` calls, then renders and executes it against a
//! [`Connection`](crate::Connection). Values always travel as `?` parameters.
//!
//! ```ignore
//! use nuclear_orm::QueryBuilder;
//!
//! let mut qb = QueryBuilder::new(connection);
//! qb.table("users")
//!     .select(&["id", "name"])
//!     .where_("status", "=", "active")
//!     .and("age", ">", 18)
//!     .limit(20);
//!
//! assert_eq!(
//!     qb.query(),
//!     "SELECT id, name FROM users WHERE status = ? AND age > ? LIMIT 20"
//! );
//! let rows = qb.get()?;
//!
//! // INSERT executes immediately
//! qb.reset().insert([("name", "alice")])?;
//!
//! // UPDATE and DELETE wait for predicates
//! qb.reset().update([("status", "inactive")])?.where_("id", "=", 7).run()?;
//! qb.reset().delete().where_("id", "=", 7).run()?;
//! ```

mod builder;
mod clause;

pub use builder::QueryBuilder;
pub use clause::{Operation, Predicate};
