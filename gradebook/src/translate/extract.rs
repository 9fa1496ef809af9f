//! Locate a SQL statement inside free-form model output
//!
//! Rules are tried in order and the first match wins:
//! 1. a fenced ```sql code block
//! 2. the text after a `SQLQuery:` marker
//! 3. the first line mentioning `SELECT` or `PRAGMA` (any case)
//! 4. the whole trimmed text
//!
//! The result is still untrusted and must be executed with the same error
//! handling as user-supplied SQL.

use regex::Regex;
use std::sync::LazyLock;

/// Marker emitted by SQL-chain style prompts before the query
pub const SQL_QUERY_MARKER: &str = "SQLQuery:";

static FENCED_SQL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```sql\s*(.*?)\s*```").expect("Invalid fenced sql regex"));

type Rule = fn(&str) -> Option<String>;

const RULES: &[(&str, Rule)] = &[
    ("fenced_block", fenced_block),
    ("marker", after_marker),
    ("keyword_line", keyword_line),
];

/// Extract the SQL statement from model output
pub fn extract_sql(text: &str) -> String {
    for (name, rule) in RULES {
        if let Some(sql) = rule(text) {
            tracing::debug!("SQL extracted by rule '{}'", name);
            return sql;
        }
    }
    text.trim().to_string()
}

fn fenced_block(text: &str) -> Option<String> {
    FENCED_SQL_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|sql| !sql.is_empty())
}

/// Text between the first marker and the next one (or the end)
fn after_marker(text: &str) -> Option<String> {
    text.split(SQL_QUERY_MARKER)
        .nth(1)
        .map(|rest| rest.trim().to_string())
        .filter(|sql| !sql.is_empty())
}

fn keyword_line(text: &str) -> Option<String> {
    text.lines()
        .find(|line| {
            let upper = line.to_uppercase();
            upper.contains("SELECT") || upper.contains("PRAGMA")
        })
        .map(|line| line.trim().to_string())
}
