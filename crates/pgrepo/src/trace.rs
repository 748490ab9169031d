//! SQL logging via `tracing`.
//!
//! Enabled by the `tracing` crate feature. Statements are emitted at DEBUG
//! under the `pgrepo.sql` target right before they are sent; failures are
//! emitted at WARN.

use crate::error::OrmError;
use crate::statement::Operation;

const MAX_SQL_BYTES: usize = 200;

#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg(feature = "tracing")]
pub(crate) fn statement(op: Operation, table: &str, sql: &str, param_count: usize) {
    let shown = truncate_sql_bytes(sql, MAX_SQL_BYTES);
    let ellipsis = if shown.len() < sql.len() { "..." } else { "" };
    tracing::debug!(
        target: "pgrepo.sql",
        op = op.as_str(),
        table,
        param_count,
        sql = %format_args!("{shown}{ellipsis}"),
    );
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn statement(op: Operation, table: &str, sql: &str, param_count: usize) {
    let _ = (op, table, sql, param_count, MAX_SQL_BYTES);
}

#[cfg(feature = "tracing")]
pub(crate) fn failed(op: Operation, table: &str, err: &OrmError) {
    tracing::warn!(target: "pgrepo.sql", op = op.as_str(), table, error = %err);
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn failed(op: Operation, table: &str, err: &OrmError) {
    let _ = (op, table, err);
}
