//! Field mapping contract: how a record type exposes its columns.
//!
//! A record type implements [`Mapper`] (usually via `#[derive(Mapper)]`) and
//! returns a [`SqlMap`] from column name to [`Accessor`]. An accessor is a pair
//! of plain function pointers addressing one field: `read` borrows the field as
//! a bind parameter, `write` borrows it mutably as a decode target. Neither
//! owns data and neither captures state, so the map built once from a
//! `Default` instance is reused against every real instance.
//!
//! # Example
//!
//! ```ignore
//! use pgrepo::{Mapper, SqlMap, accessor};
//!
//! #[derive(Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl Mapper for User {
//!     fn mapper(&self) -> SqlMap<Self> {
//!         SqlMap::new()
//!             .column("id", accessor!(User, id))
//!             .column("name", accessor!(User, name))
//!     }
//! }
//! ```

use crate::error::{OrmError, OrmResult};
use std::fmt;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, ToSql};

/// A field that can be overwritten from a result column.
///
/// Blanket-implemented for every type `tokio-postgres` can decode, so record
/// fields never implement it by hand.
pub trait ColumnValue: Send + Sync {
    /// Overwrite `self` with column `idx` of `row`.
    fn decode_from(&mut self, row: &Row, idx: usize) -> OrmResult<()>;
}

impl<V> ColumnValue for V
where
    V: for<'a> FromSql<'a> + Send + Sync,
{
    fn decode_from(&mut self, row: &Row, idx: usize) -> OrmResult<()> {
        *self = row
            .try_get::<_, V>(idx)
            .map_err(|e| OrmError::decode(column_name(row, idx), e.to_string()))?;
        Ok(())
    }
}

fn column_name(row: &Row, idx: usize) -> String {
    row.columns()
        .get(idx)
        .map(|c| c.name().to_string())
        .unwrap_or_else(|| format!("#{idx}"))
}

/// Borrows a field of `T` as a bind parameter.
pub type ReadFn<T> = for<'r> fn(&'r T) -> &'r (dyn ToSql + Sync);

/// Borrows a field of `T` as a decode target.
pub type WriteFn<T> = for<'r> fn(&'r mut T) -> &'r mut dyn ColumnValue;

/// Bidirectional handle to one field of a record type.
///
/// Build it with [`accessor!`](crate::accessor) so both halves are guaranteed
/// to address the same field.
pub struct Accessor<T> {
    read: ReadFn<T>,
    write: WriteFn<T>,
}

impl<T> Accessor<T> {
    /// Pair a read and a write function. Both must address the same field.
    pub const fn new(read: ReadFn<T>, write: WriteFn<T>) -> Self {
        Self { read, write }
    }

    /// Borrow the field of `record` as a statement parameter.
    pub fn read<'r>(&self, record: &'r T) -> &'r (dyn ToSql + Sync) {
        (self.read)(record)
    }

    /// Borrow the field of `record` as a decode target.
    pub fn write<'r>(&self, record: &'r mut T) -> &'r mut dyn ColumnValue {
        (self.write)(record)
    }
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Accessor<T> {}

impl<T> fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor").finish_non_exhaustive()
    }
}

/// Build an [`Accessor`] for a (possibly nested) field.
///
/// ```ignore
/// let id = pgrepo::accessor!(User, id);
/// let city = pgrepo::accessor!(User, address.city);
/// ```
#[macro_export]
macro_rules! accessor {
    ($ty:ty, $($field:ident).+) => {
        $crate::Accessor::<$ty>::new(|r| &r.$($field).+, |r| &mut r.$($field).+)
    };
}

/// Column name to accessor mapping for one record type.
///
/// Inserting a name that is already present replaces its accessor in place.
/// Iteration follows first-insertion order.
pub struct SqlMap<T> {
    entries: Vec<(String, Accessor<T>)>,
}

impl<T> SqlMap<T> {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a column (builder style).
    pub fn column(mut self, name: impl Into<String>, accessor: Accessor<T>) -> Self {
        self.insert(name, accessor);
        self
    }

    /// Add a column, returning the accessor it replaced, if any.
    pub fn insert(&mut self, name: impl Into<String>, accessor: Accessor<T>) -> Option<Accessor<T>> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, accessor)),
            None => {
                self.entries.push((name, accessor));
                None
            }
        }
    }

    /// Look up the accessor for `name`.
    pub fn get(&self, name: &str) -> Option<&Accessor<T>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, accessor)| accessor)
    }

    /// Number of mapped columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no column is mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Column names in iteration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Column names with their accessors, in iteration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Accessor<T>)> {
        self.entries.iter().map(|(n, a)| (n.as_str(), a))
    }
}

impl<T> Default for SqlMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SqlMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl<T> IntoIterator for SqlMap<T> {
    type Item = (String, Accessor<T>);
    type IntoIter = std::vec::IntoIter<(String, Accessor<T>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<T, S: Into<String>> FromIterator<(S, Accessor<T>)> for SqlMap<T> {
    fn from_iter<I: IntoIterator<Item = (S, Accessor<T>)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, accessor) in iter {
            map.insert(name, accessor);
        }
        map
    }
}

/// Trait for record types that can be stored through a [`Repo`](crate::Repo).
///
/// `mapper` is called once, on `Self::default()`, when the repository is built.
/// The returned mapping must not depend on the instance's field values.
///
/// This trait should typically be derived using `#[derive(Mapper)]`.
pub trait Mapper: Default + Send + Sync {
    /// Return the column mapping for this type.
    fn mapper(&self) -> SqlMap<Self>;
}
