//! Named parameter binding.
//!
//! Statements built by [`Repo`](crate::Repo) and the clause fragments callers
//! pass in reference bind arguments as `$c1, $c2, ...` (1-based, per call).
//! `tokio-postgres` only understands positional `$1, $2, ...`, so before a
//! statement is sent each `$cN` outside of literals, quoted identifiers,
//! dollar-quoted bodies and comments is rewritten to `$N`.
//!
//! Rewriting only happens when the call carries at least one argument. A
//! zero-argument call is sent exactly as written.
//!
//! The same `$cN` may appear several times; PostgreSQL binds every occurrence
//! of `$N` to the same value.

use crate::error::{OrmError, OrmResult};
use std::borrow::Cow;

/// Placeholder text for the `index`-th (1-based) argument.
pub fn placeholder(index: usize) -> String {
    format!("$c{index}")
}

/// Resolve `$cN` placeholders in `sql` against `arg_count` arguments.
///
/// Returns the text unchanged (borrowed) when `arg_count` is zero. Otherwise
/// every `$cN` becomes `$N`, and a placeholder outside `1..=arg_count` is a
/// [`OrmError::Validation`].
///
/// ```
/// use pgrepo::params::bind_named;
///
/// let sql = bind_named("WHERE id = $c1 OR parent = $c1", 1).unwrap();
/// assert_eq!(sql, "WHERE id = $1 OR parent = $1");
///
/// let untouched = bind_named("WHERE name = '$c1'", 0).unwrap();
/// assert_eq!(untouched, "WHERE name = '$c1'");
/// ```
pub fn bind_named(sql: &str, arg_count: usize) -> OrmResult<Cow<'_, str>> {
    if arg_count == 0 {
        return Ok(Cow::Borrowed(sql));
    }

    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => i = skip_quoted(bytes, i, b'\'', is_escape_string(bytes, i)),
            b'"' => i = skip_quoted(bytes, i, b'"', false),
            b'-' if bytes.get(i + 1) == Some(&b'-') => i = skip_line_comment(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i),
            b'$' if i == 0 || !is_ident_byte(bytes[i - 1]) => {
                if let Some((index, end)) = named_placeholder(sql, i)? {
                    if index == 0 || index > arg_count {
                        return Err(OrmError::validation(format!(
                            "placeholder $c{index} has no matching argument ({arg_count} bound)"
                        )));
                    }
                    out.push_str(&sql[last..i]);
                    out.push('$');
                    out.push_str(&index.to_string());
                    last = end;
                    i = end;
                } else if let Some(end) = skip_dollar_quoted(bytes, i) {
                    i = end;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }

    out.push_str(&sql[last..]);
    Ok(Cow::Owned(out))
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Parse `$c<digits>` at `start`. Returns the index and the end offset.
fn named_placeholder(sql: &str, start: usize) -> OrmResult<Option<(usize, usize)>> {
    let bytes = sql.as_bytes();
    if bytes.get(start + 1) != Some(&b'c') {
        return Ok(None);
    }
    let digits = start + 2;
    let mut end = digits;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits || bytes.get(end).is_some_and(|b| is_ident_byte(*b)) {
        return Ok(None);
    }
    let index = sql[digits..end]
        .parse::<usize>()
        .map_err(|e| OrmError::validation(format!("invalid placeholder '{}': {e}", &sql[start..end])))?;
    Ok(Some((index, end)))
}

/// Whether the quote at `quote` opens an `E'...'` escape string.
fn is_escape_string(bytes: &[u8], quote: usize) -> bool {
    match quote.checked_sub(1).map(|p| bytes[p]) {
        Some(b'E' | b'e') => quote < 2 || !is_ident_byte(bytes[quote - 2]),
        _ => false,
    }
}

/// Skip a `'...'` or `"..."` section (doubled quote escapes, plus backslash
/// escapes when `backslash` is set). Returns the offset after the closing
/// quote, or the end of input if unterminated.
fn skip_quoted(bytes: &[u8], start: usize, quote: u8, backslash: bool) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if backslash && bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    match bytes[start..].iter().position(|b| *b == b'\n') {
        Some(pos) => start + pos + 1,
        None => bytes.len(),
    }
}

fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    match bytes[start + 2..].windows(2).position(|w| w == b"*/") {
        Some(pos) => start + 2 + pos + 2,
        None => bytes.len(),
    }
}

/// Skip a `$tag$ ... $tag$` body starting at `start`, if one opens there.
fn skip_dollar_quoted(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if let Some(first) = bytes.get(i) {
        if first.is_ascii_digit() {
            return None;
        }
    }
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    if bytes.get(i) != Some(&b'$') {
        return None;
    }
    let tag = &bytes[start..=i];
    let body = i + 1;
    match bytes[body..].windows(tag.len()).position(|w| w == tag) {
        Some(pos) => Some(body + pos + tag.len()),
        None => Some(bytes.len()),
    }
}
