//! Helpers over `?`-placeholder SQL text.
//!
//! Statements are built with positional `?` placeholders. These helpers find
//! placeholders outside of quoted literals, identifiers and comments, so that
//! the text can be re-numbered for drivers that expect `$1, $2, ...` or rendered
//! with literal values for display.

use crate::value::Value;
use std::fmt::Write;

/// The kind of SQL statement, detected from its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    /// Other SQL (e.g., DDL, custom)
    Other,
}

impl StatementKind {
    const KEYWORDS: [(&'static str, StatementKind); 5] = [
        ("SELECT", StatementKind::Select),
        ("WITH", StatementKind::Select),
        ("INSERT", StatementKind::Insert),
        ("UPDATE", StatementKind::Update),
        ("DELETE", StatementKind::Delete),
    ];

    /// Detect statement kind from SQL text.
    pub fn detect(sql: &str) -> Self {
        let word = leading_word(sql);
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| word.eq_ignore_ascii_case(keyword))
            .map_or(StatementKind::Other, |(_, kind)| *kind)
    }
}

/// First word of `sql` once whitespace, opening parentheses and comments are skipped.
fn leading_word(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map_or("", |(_, tail)| tail);
        } else {
            break;
        }
    }
    let end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Byte offsets of every `?` placeholder in `sql`.
///
/// Question marks inside `'...'` literals, `"..."` identifiers, `-- ...` line
/// comments and `/* ... */` block comments are not placeholders.
pub fn placeholder_positions(sql: &str) -> Vec<usize> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Normal,
        Literal,
        Ident,
        LineComment,
        BlockComment,
    }

    let bytes = sql.as_bytes();
    let mut positions = Vec::new();
    let mut state = State::Normal;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match state {
            State::Normal => match b {
                b'?' => positions.push(i),
                b'\'' => state = State::Literal,
                b'"' => state = State::Ident,
                b'-' if next == Some(b'-') => {
                    state = State::LineComment;
                    i += 1;
                }
                b'/' if next == Some(b'*') => {
                    state = State::BlockComment;
                    i += 1;
                }
                _ => {}
            },
            State::Literal => {
                if b == b'\'' {
                    if next == Some(b'\'') {
                        i += 1; // escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Ident => {
                if b == b'"' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if b == b'*' && next == Some(b'/') {
                    state = State::Normal;
                    i += 1;
                }
            }
        }
        i += 1;
    }

    positions
}

/// Number of `?` placeholders in `sql`.
pub fn count_placeholders(sql: &str) -> usize {
    placeholder_positions(sql).len()
}

fn replace_placeholders(sql: &str, mut render: impl FnMut(usize, &mut String)) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut last = 0;
    for (idx, pos) in placeholder_positions(sql).into_iter().enumerate() {
        out.push_str(&sql[last..pos]);
        render(idx, &mut out);
        last = pos + 1;
    }
    out.push_str(&sql[last..]);
    out
}

/// Rewrite `?` placeholders into PostgreSQL's `$1, $2, ...` form.
pub fn number_placeholders(sql: &str) -> String {
    replace_placeholders(sql, |idx, out| {
        let _ = write!(out, "${}", idx + 1);
    })
}

/// Substitute literal values for `?` placeholders, in order.
///
/// Placeholders without a corresponding value are left as `?`.
pub fn inline_values(sql: &str, values: &[Value]) -> String {
    replace_placeholders(sql, |idx, out| match values.get(idx) {
        Some(value) => out.push_str(&value.to_sql_literal()),
        None => out.push('?'),
    })
}

/// Longest prefix of `sql` that fits in `max_bytes` without splitting a character.
#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub(crate) fn clip_for_log(sql: &str, max_bytes: usize) -> &str {
    let end = sql
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(sql.len()))
        .take_while(|&idx| idx <= max_bytes)
        .last()
        .unwrap_or(0);
    &sql[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_placeholders_in_order() {
        let sql = "SELECT * FROM t WHERE a = ? AND b = ?";
        assert_eq!(
            number_placeholders(sql),
            "SELECT * FROM t WHERE a = $1 AND b = $2"
        );
        assert_eq!(count_placeholders(sql), 2);
    }

    #[test]
    fn ignores_question_marks_in_literals_and_comments() {
        let sql = "SELECT '?', \"wh?\" FROM t -- what?\nWHERE a = ? /* ? */ AND b = 'it''s ?'";
        assert_eq!(count_placeholders(sql), 1);
        assert!(number_placeholders(sql).contains("WHERE a = $1 /* ? */"));
    }

    #[test]
    fn inlines_values_and_leaves_extra_placeholders() {
        let sql = "INSERT INTO t (a, b, c) VALUES (?, ?, ?)";
        let values = vec![Value::from(1), Value::from("x")];
        assert_eq!(
            inline_values(sql, &values),
            "INSERT INTO t (a, b, c) VALUES (1, 'x', ?)"
        );
    }

    #[test]
    fn detects_statement_kind() {
        assert_eq!(StatementKind::detect("  select 1"), StatementKind::Select);
        assert_eq!(
            StatementKind::detect("/* c */ INSERT INTO t (a) VALUES (?)"),
            StatementKind::Insert
        );
        assert_eq!(StatementKind::detect("UPDATE t SET a = ?"), StatementKind::Update);
        assert_eq!(StatementKind::detect("DELETE FROM t"), StatementKind::Delete);
        assert_eq!(StatementKind::detect("CREATE TABLE t ()"), StatementKind::Other);
    }

    #[test]
    fn detects_kind_behind_comments_and_parens() {
        assert_eq!(
            StatementKind::detect("-- note\n ((SELECT 1) UNION (SELECT 2))"),
            StatementKind::Select
        );
        assert_eq!(
            StatementKind::detect("with x as (select 1) select * from x"),
            StatementKind::Select
        );
        assert_eq!(StatementKind::detect("SELECTED"), StatementKind::Other);
        assert_eq!(StatementKind::detect("/* unterminated SELECT"), StatementKind::Other);
        assert_eq!(StatementKind::detect(""), StatementKind::Other);
    }

    #[test]
    fn clip_for_log_respects_char_boundaries() {
        assert_eq!(clip_for_log("héllo", 2), "h");
        assert_eq!(clip_for_log("héllo", 3), "hé");
        assert_eq!(clip_for_log("abc", 10), "abc");
        assert_eq!(clip_for_log("abc", 0), "");
    }
}
