//! Clause nodes accumulated by [`QueryBuilder`](super::QueryBuilder).
//!
//! The builder never concatenates SQL while it is being configured. It records
//! clause nodes and renders them once, which keeps the text and the bound values
//! in the same order by construction.

use crate::row::Record;
use crate::value::Value;
use std::fmt::Write;

/// The statement a builder is shaping.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    /// `SELECT <columns> FROM <table>`. An empty list renders the wildcard.
    Select { columns: Vec<String> },
    /// `INSERT INTO <table> (<keys>) VALUES (?, ...)`
    Insert { row: Record },
    /// `UPDATE <table> SET <key> = ?, ...`
    Update { row: Record },
    /// `DELETE FROM <table>`
    Delete,
}

impl Default for Operation {
    fn default() -> Self {
        Operation::Select {
            columns: Vec::new(),
        }
    }
}

impl Operation {
    pub(crate) fn render(&self, table: &str, out: &mut String) {
        match self {
            Operation::Select { columns } => {
                out.push_str("SELECT ");
                if columns.is_empty() {
                    out.push('*');
                } else {
                    out.push_str(&columns.join(", "));
                }
                let _ = write!(out, " FROM {table}");
            }
            Operation::Insert { row } => {
                let keys: Vec<&str> = row.keys().collect();
                let marks = vec!["?"; keys.len()];
                let _ = write!(
                    out,
                    "INSERT INTO {table} ({}) VALUES ({})",
                    keys.join(", "),
                    marks.join(", ")
                );
            }
            Operation::Update { row } => {
                let _ = write!(out, "UPDATE {table} SET ");
                for (i, key) in row.keys().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{key} = ?");
                }
            }
            Operation::Delete => {
                let _ = write!(out, "DELETE FROM {table}");
            }
        }
    }

    /// Values bound by the statement head, before any predicate values.
    pub(crate) fn values(&self) -> impl Iterator<Item = &Value> {
        let row = match self {
            Operation::Insert { row } | Operation::Update { row } => Some(row),
            Operation::Select { .. } | Operation::Delete => None,
        };
        row.into_iter().flat_map(Record::values)
    }

    /// Whether the statement accepts a WHERE clause.
    pub(crate) fn takes_predicates(&self) -> bool {
        !matches!(self, Operation::Insert { .. })
    }

    /// Whether the statement accepts LIMIT/OFFSET.
    pub(crate) fn takes_paging(&self) -> bool {
        matches!(self, Operation::Select { .. })
    }
}

/// `<column> <operator> ?` with its bound value.
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub operator: String,
    pub value: Value,
}

impl Predicate {
    pub fn new(column: impl Into<String>, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

/// Render predicates in call order: the first is introduced by ` WHERE `,
/// every later one by ` AND `.
pub(crate) fn render_predicates(predicates: &[Predicate], out: &mut String) {
    for (i, p) in predicates.iter().enumerate() {
        out.push_str(if i == 0 { " WHERE " } else { " AND " });
        let _ = write!(out, "{} {} ?", p.column, p.operator);
    }
}
