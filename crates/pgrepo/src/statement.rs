//! SQL text synthesis for repository operations.
//!
//! Every function here is pure: it only formats text. Placeholders are emitted
//! as `$c1..$cN` and resolved by [`bind_named`](crate::params::bind_named) at
//! execution time. Clause fragments are appended verbatim after a single space
//! (nothing is appended when the fragment is blank).

use crate::error::{OrmError, OrmResult};
use crate::params::placeholder;

/// The kind of statement a repository operation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Count,
    Select,
    SelectOne,
    Insert,
    Update,
    Upsert,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Count => "count",
            Operation::Select => "select",
            Operation::SelectOne => "select_one",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Upsert => "upsert",
            Operation::Delete => "delete",
        }
    }
}

fn with_clause(mut prefix: String, clause: &str) -> String {
    if !clause.trim().is_empty() {
        prefix.push(' ');
        prefix.push_str(clause);
    }
    prefix
}

fn placeholders(count: usize) -> String {
    (1..=count).map(placeholder).collect::<Vec<_>>().join(", ")
}

/// `SELECT COUNT(*) FROM <table> <clause>`
pub fn count_sql(table: &str, clause: &str) -> String {
    with_clause(format!("SELECT COUNT(*) FROM {table}"), clause)
}

/// `SELECT <columns> FROM <table> <clause>`
pub fn select_sql(table: &str, columns: &[String], clause: &str) -> String {
    with_clause(
        format!("SELECT {} FROM {table}", columns.join(", ")),
        clause,
    )
}

/// `SELECT <columns> FROM <table> <clause> LIMIT 1`
pub fn select_one_sql(table: &str, columns: &[String], clause: &str) -> String {
    let mut sql = select_sql(table, columns, clause);
    sql.push_str(" LIMIT 1");
    sql
}

/// `INSERT INTO <table> (<columns>) VALUES ($c1, ..., $cN)`
pub fn insert_sql(table: &str, columns: &[String]) -> String {
    format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders(columns.len())
    )
}

/// `UPDATE <table> <clause>`; the clause carries `SET ...` and any `WHERE ...`.
pub fn update_sql(table: &str, clause: &str) -> String {
    with_clause(format!("UPDATE {table}"), clause)
}

/// `DELETE FROM <table> <clause>`
pub fn delete_sql(table: &str, clause: &str) -> String {
    with_clause(format!("DELETE FROM {table}"), clause)
}

/// Columns an upsert rewrites on conflict, paired with their 1-based position
/// in `columns`.
///
/// A column survives unless it is a primary key or is listed in `excluded`.
pub fn upsert_assignments<'a, S: AsRef<str>>(
    columns: &'a [String],
    primary_keys: &[String],
    excluded: &[S],
) -> Vec<(usize, &'a str)> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, col)| !primary_keys.iter().any(|pk| pk == *col))
        .filter(|(_, col)| !excluded.iter().any(|c| c.as_ref() == col.as_str()))
        .map(|(i, col)| (i + 1, col.as_str()))
        .collect()
}

/// `INSERT ... ON CONFLICT (<primary keys>) DO UPDATE SET <survivors>`
///
/// The conflict target is always the primary key list; `excluded` only
/// removes columns from the SET list. Each surviving column reuses the
/// placeholder of its VALUES position.
pub fn upsert_sql<S: AsRef<str>>(
    table: &str,
    columns: &[String],
    primary_keys: &[String],
    excluded: &[S],
) -> OrmResult<String> {
    if primary_keys.is_empty() {
        return Err(OrmError::validation(format!(
            "upsert on {table}: no primary key columns to use as conflict target"
        )));
    }

    let setters: Vec<String> = upsert_assignments(columns, primary_keys, excluded)
        .into_iter()
        .map(|(pos, col)| format!("{col} = {}", placeholder(pos)))
        .collect();
    if setters.is_empty() {
        return Err(OrmError::validation(format!(
            "upsert on {table}: every column is a primary key or excluded, nothing to update"
        )));
    }

    Ok(format!(
        "{} ON CONFLICT ({}) DO UPDATE SET {}",
        insert_sql(table, columns),
        primary_keys.join(", "),
        setters.join(", ")
    ))
}
