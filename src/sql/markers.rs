//! Named bind markers (`:name`) in SQL text.
//!
//! A marker is a colon followed by `[A-Za-z_][A-Za-z0-9_]*`. Casts (`::int`)
//! are not markers, and neither is anything inside single-quoted literals
//! (including `E'...'` backslash escapes), double-quoted identifiers,
//! dollar-quoted bodies (`$$...$$`, `$tag$...$tag$`), `--` line comments or
//! `/* */` block comments (which nest).

use crate::binding::Parameter;
use crate::error::{NativeQueryError, Result};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// One bind marker occurrence; `start..end` covers the colon and the name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMarker {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

pub fn bind_markers(sql: &str) -> Vec<BindMarker> {
    let bytes = sql.as_bytes();
    let mut markers = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let next = bytes.get(i + 1).copied();
        i = match bytes[i] {
            // A doubled quote closes and reopens the literal, which needs no special case
            b'\'' => skip_quoted(bytes, i, b'\'', is_escape_string(bytes, i)),
            b'"' => skip_quoted(bytes, i, b'"', false),
            b'-' if next == Some(b'-') => skip_line_comment(bytes, i),
            b'/' if next == Some(b'*') => skip_block_comment(bytes, i),
            b'$' => skip_dollar_quoted(sql, i),
            b':' if next == Some(b':') => i + 2,
            b':' if next.is_some_and(|c| c.is_ascii_alphabetic() || c == b'_') => {
                let start = i;
                let mut end = i + 1;
                while bytes.get(end).copied().is_some_and(is_ident_byte) {
                    end += 1;
                }
                markers.push(BindMarker {
                    name: sql[start + 1..end].to_string(),
                    start,
                    end,
                });
                end
            }
            _ => i + 1,
        };
    }

    markers
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `E'...'` or `e'...'` not preceded by an identifier character
fn is_escape_string(bytes: &[u8], quote: usize) -> bool {
    quote > 0
        && matches!(bytes[quote - 1], b'E' | b'e')
        && (quote < 2 || !is_ident_byte(bytes[quote - 2]))
}

/// Index just past the closing quote, or the end of input when unterminated
fn skip_quoted(bytes: &[u8], open: usize, quote: u8, backslash_escapes: bool) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if backslash_escapes => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|b| *b == b'\n')
        .map_or(bytes.len(), |newline| start + newline + 1)
}

fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match (bytes[i], bytes.get(i + 1).copied()) {
            (b'/', Some(b'*')) => {
                depth += 1;
                i += 2;
            }
            (b'*', Some(b'/')) => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Skip a `$tag$ ... $tag$` body; a `$` that opens no tag (such as `$1`) is skipped alone
fn skip_dollar_quoted(sql: &str, start: usize) -> usize {
    let bytes = sql.as_bytes();
    if start > 0 && is_ident_byte(bytes[start - 1]) {
        return start + 1;
    }

    let mut end = start + 1;
    if bytes.get(end).is_some_and(u8::is_ascii_digit) {
        return start + 1;
    }
    while bytes.get(end).copied().is_some_and(is_ident_byte) {
        end += 1;
    }
    if bytes.get(end) != Some(&b'$') {
        return start + 1;
    }

    let tag = &sql[start..=end];
    let body = end + 1;
    sql[body..]
        .find(tag)
        .map_or(sql.len(), |close| body + close + tag.len())
}

/// Distinct marker names present in `sql`
pub fn references(sql: &str) -> HashSet<String> {
    bind_markers(sql).into_iter().map(|m| m.name).collect()
}

/// SQL rewritten to `$n` placeholders with the values in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct PositionalSql {
    pub sql: String,
    pub values: Vec<Value>,
}

/// Rewrite named markers into Postgres positional placeholders.
///
/// A repeated name reuses its placeholders. An array value expands into a
/// comma-separated placeholder list so `IN (:ids)` works; an empty array binds
/// a single `NULL`.
pub fn to_positional(sql: &str, parameters: &[Parameter]) -> Result<PositionalSql> {
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut assigned: HashMap<String, String> = HashMap::new();
    let mut cursor = 0;

    for marker in bind_markers(sql) {
        out.push_str(&sql[cursor..marker.start]);
        cursor = marker.end;

        if let Some(placeholders) = assigned.get(&marker.name) {
            out.push_str(placeholders);
            continue;
        }

        let value = parameters
            .iter()
            .rev()
            .find(|p| p.name == marker.name)
            .map(|p| &p.value)
            .ok_or_else(|| {
                NativeQueryError::argument_mismatch(
                    "positional rewrite",
                    format!("no parameter bound for marker :{}", marker.name),
                )
            })?;

        let elements: Vec<Value> = match value {
            Value::Array(items) if items.is_empty() => vec![Value::Null],
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };

        let placeholders = elements
            .into_iter()
            .map(|element| {
                values.push(element);
                format!("${}", values.len())
            })
            .collect::<Vec<_>>()
            .join(", ");

        out.push_str(&placeholders);
        assigned.insert(marker.name, placeholders);
    }

    out.push_str(&sql[cursor..]);
    Ok(PositionalSql { sql: out, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(sql: &str) -> Vec<String> {
        bind_markers(sql).into_iter().map(|m| m.name).collect()
    }

    #[test]
    fn test_markers_skip_casts_and_literals() {
        assert_eq!(
            names("SELECT id::text, ':ignored' FROM users WHERE name = :name AND \"a:b\" = :a_1"),
            vec!["name", "a_1"]
        );
        assert_eq!(names("SELECT arr[1:2] FROM t"), Vec::<String>::new());
        assert_eq!(names("SELECT 'it''s :x' , :y"), vec!["y"]);
    }

    #[test]
    fn test_markers_skip_comments_and_dollar_quotes() {
        let sql = "SELECT 1 -- :a\n, /* :b /* :c */ :c2 */ :d, E'it\\'s :e', $$ :f $$, \
                   $fn$ :g $fn$, :h, $1, a$b";
        assert_eq!(names(sql), vec!["d", "h"]);
        assert_eq!(names("SELECT :x -- trailing :y"), vec!["x"]);
    }

    #[test]
    fn test_commented_marker_is_not_required() {
        let positional = to_positional(
            "SELECT * FROM users WHERE id = :id /* AND name = :name */",
            &[Parameter::new("id", json!(7))],
        )
        .unwrap();

        assert_eq!(positional.sql, "SELECT * FROM users WHERE id = $1 /* AND name = :name */");
        assert_eq!(positional.values, vec![json!(7)]);
    }

    #[test]
    fn test_references_are_exact() {
        let refs = references("WHERE name = :nameLike");
        assert!(refs.contains("nameLike"));
        assert!(!refs.contains("name"));
    }

    #[test]
    fn test_to_positional() {
        let parameters = vec![
            Parameter::new("name", json!("%al%")),
            Parameter::new("ids", json!([1, 2, 3])),
        ];
        let positional = to_positional(
            "SELECT * FROM users WHERE (:name IS NULL OR name LIKE :name) AND id IN (:ids)",
            &parameters,
        )
        .unwrap();

        assert_eq!(
            positional.sql,
            "SELECT * FROM users WHERE ($1 IS NULL OR name LIKE $1) AND id IN ($2, $3, $4)"
        );
        assert_eq!(
            positional.values,
            vec![json!("%al%"), json!(1), json!(2), json!(3)]
        );
    }

    #[test]
    fn test_to_positional_empty_array_and_missing() {
        let positional =
            to_positional("id IN (:ids)", &[Parameter::new("ids", json!([]))]).unwrap();
        assert_eq!(positional.sql, "id IN ($1)");
        assert_eq!(positional.values, vec![Value::Null]);

        assert!(matches!(
            to_positional("id = :id", &[]),
            Err(NativeQueryError::ArgumentMismatch { .. })
        ));
    }
}
