//! Repository descriptor and statement engine.
//!
//! A [`Repo`] is built once per record type and is read-only afterwards, so
//! it can be shared by reference (or in an `Arc`) across tasks without
//! locking. Every operation borrows a [`GenericClient`], which may be a plain
//! connection or a transaction. A descriptor may also carry a default store
//! handle (a pool, say) reachable through [`Repo::db`].
//!
//! # Example
//!
//! ```ignore
//! use pgrepo::{Mapper, Repo};
//!
//! #[derive(Debug, Default, Mapper)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     email: String,
//! }
//!
//! let users: Repo<User> = Repo::new("users", ["id"]);
//!
//! users.insert(&client, &User { id: 1, name: "A".into(), email: "a@x".into() }).await?;
//! let user = users.select_one(&client, "WHERE id = $c1", &[&1_i64]).await?;
//! users.upsert(&client, &User { name: "B".into(), ..user }, &["email"]).await?;
//! ```

use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::mapper::{Accessor, Mapper};
use crate::params::bind_named;
use crate::statement::{self, Operation};
use crate::trace;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Immutable per-type descriptor: table, primary keys, columns and accessors.
///
/// `columns` and `accessors` are parallel: column *i* of every SELECT decodes
/// through accessor *i*, and insert parameter `$c<i+1>` is read through it.
///
/// `C` is the store handle the descriptor was built with; `()` when it was
/// built without one. Operations never use it implicitly.
pub struct Repo<T, C = ()> {
    db: C,
    table: String,
    primary_keys: Vec<String>,
    columns: Vec<String>,
    accessors: Vec<Accessor<T>>,
}

impl<T: Mapper> Repo<T> {
    /// Build a descriptor for `table`, discovering columns from
    /// `T::default().mapper()`.
    ///
    /// Primary keys are not checked against the column list; they are only
    /// used as the upsert conflict target.
    pub fn new<I, S>(table: impl Into<String>, primary_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Repo::with_db((), table, primary_keys)
    }
}

impl<T: Mapper, C> Repo<T, C> {
    /// Like [`Repo::new`], keeping `db` as the descriptor's store handle.
    ///
    /// ```ignore
    /// let users = Repo::<User, _>::with_db(pool, "users", ["id"]);
    /// let client = users.db().get().await?;
    /// users.insert(&client, &user).await?;
    /// ```
    pub fn with_db<I, S>(db: C, table: impl Into<String>, primary_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (columns, accessors) = T::default().mapper().into_iter().unzip();
        Self {
            db,
            table: table.into(),
            primary_keys: primary_keys.into_iter().map(Into::into).collect(),
            columns,
            accessors,
        }
    }

    /// The store handle given to [`Repo::with_db`].
    pub fn db(&self) -> &C {
        &self.db
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_keys(&self) -> &[String] {
        &self.primary_keys
    }

    /// Column names in the order used by every generated statement.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Comma-separated column list, for callers writing their own joins.
    pub fn select_columns(&self) -> String {
        self.columns.join(", ")
    }

    /// `SELECT COUNT(*) FROM <table> <clause>`
    pub async fn count(
        &self,
        conn: &impl GenericClient,
        clause: &str,
        args: &[&(dyn ToSql + Sync)],
    ) -> OrmResult<i64> {
        let op = Operation::Count;
        let sql = statement::count_sql(&self.table, clause);
        let row = self
            .observe(op, async {
                let sql = bind_named(&sql, args.len())?;
                trace::statement(op, &self.table, &sql, args.len());
                conn.query_one(&sql, args).await
            })
            .await?;
        row.try_get::<_, i64>(0)
            .map_err(|e| OrmError::decode("count", e.to_string()))
    }

    /// Whether at least one row matches `clause`.
    pub async fn exists(
        &self,
        conn: &impl GenericClient,
        clause: &str,
        args: &[&(dyn ToSql + Sync)],
    ) -> OrmResult<bool> {
        Ok(self.count(conn, clause, args).await? > 0)
    }

    /// `SELECT <columns> FROM <table> <clause>`, decoded into records.
    ///
    /// Zero matching rows is an empty `Vec`. A row that fails to decode fails
    /// the whole call with [`OrmError::Decode`].
    pub async fn select(
        &self,
        conn: &impl GenericClient,
        clause: &str,
        args: &[&(dyn ToSql + Sync)],
    ) -> OrmResult<Vec<T>> {
        let op = Operation::Select;
        self.require_columns(op)?;
        let sql = statement::select_sql(&self.table, &self.columns, clause);
        self.observe(op, async {
            let sql = bind_named(&sql, args.len())?;
            trace::statement(op, &self.table, &sql, args.len());
            let rows = conn.query(&sql, args).await?;
            rows.iter()
                .map(|row| self.decode(row))
                .collect::<OrmResult<Vec<T>>>()
        })
        .await
    }

    /// Like [`Repo::select`] with `LIMIT 1`; no match is [`OrmError::NotFound`].
    pub async fn select_one(
        &self,
        conn: &impl GenericClient,
        clause: &str,
        args: &[&(dyn ToSql + Sync)],
    ) -> OrmResult<T> {
        let op = Operation::SelectOne;
        self.require_columns(op)?;
        let sql = statement::select_one_sql(&self.table, &self.columns, clause);
        self.observe(op, async {
            let sql = bind_named(&sql, args.len())?;
            trace::statement(op, &self.table, &sql, args.len());
            let row = conn.query_opt(&sql, args).await?.ok_or_else(|| {
                OrmError::not_found(format!("no row in {} matching '{clause}'", self.table))
            })?;
            self.decode(&row)
        })
        .await
    }

    /// Insert one record, binding every mapped field as `$c1..$cN`.
    pub async fn insert(&self, conn: &impl GenericClient, item: &T) -> OrmResult<u64> {
        let op = Operation::Insert;
        self.require_columns(op)?;
        let sql = statement::insert_sql(&self.table, &self.columns);
        let values = self.values(item);
        self.execute(op, conn, &sql, &values).await
    }

    /// Insert records one after another on the same handle.
    ///
    /// Stops at the first failure; pass a transaction to make the batch atomic.
    pub async fn insert_many(&self, conn: &impl GenericClient, items: &[T]) -> OrmResult<u64> {
        let mut affected = 0;
        for item in items {
            affected += self.insert(conn, item).await?;
        }
        Ok(affected)
    }

    /// `UPDATE <table> <clause>`; the clause supplies `SET ...` and `WHERE ...`.
    pub async fn update(
        &self,
        conn: &impl GenericClient,
        clause: &str,
        args: &[&(dyn ToSql + Sync)],
    ) -> OrmResult<u64> {
        let sql = statement::update_sql(&self.table, clause);
        self.execute(Operation::Update, conn, &sql, args).await
    }

    /// Insert `item`, or on a primary-key conflict overwrite every column
    /// that is neither a primary key nor listed in `conflict`.
    ///
    /// Fails with [`OrmError::Validation`] before touching the store when no
    /// column is left to overwrite.
    pub async fn upsert<S: AsRef<str>>(
        &self,
        conn: &impl GenericClient,
        item: &T,
        conflict: &[S],
    ) -> OrmResult<u64> {
        let op = Operation::Upsert;
        self.require_columns(op)?;
        let sql = match statement::upsert_sql(
            &self.table,
            &self.columns,
            &self.primary_keys,
            conflict,
        ) {
            Ok(sql) => sql,
            Err(e) => {
                trace::failed(op, &self.table, &e);
                return Err(e);
            }
        };
        let values = self.values(item);
        self.execute(op, conn, &sql, &values).await
    }

    /// `DELETE FROM <table> <clause>`
    pub async fn delete(
        &self,
        conn: &impl GenericClient,
        clause: &str,
        args: &[&(dyn ToSql + Sync)],
    ) -> OrmResult<u64> {
        let sql = statement::delete_sql(&self.table, clause);
        self.execute(Operation::Delete, conn, &sql, args).await
    }

    /// Column-driven statements need at least one mapped column.
    fn require_columns(&self, op: Operation) -> OrmResult<()> {
        if !self.columns.is_empty() {
            return Ok(());
        }
        let err = OrmError::validation(format!(
            "{} on {}: mapping has no columns",
            op.as_str(),
            self.table
        ));
        trace::failed(op, &self.table, &err);
        Err(err)
    }

    fn values<'a>(&self, item: &'a T) -> Vec<&'a (dyn ToSql + Sync)> {
        self.accessors.iter().map(|a| a.read(item)).collect()
    }

    fn decode(&self, row: &Row) -> OrmResult<T> {
        if row.len() != self.accessors.len() {
            return Err(OrmError::decode(
                "*",
                format!(
                    "row has {} columns, {} mapping expects {}",
                    row.len(),
                    self.table,
                    self.accessors.len()
                ),
            ));
        }
        let mut item = T::default();
        for (idx, accessor) in self.accessors.iter().enumerate() {
            accessor.write(&mut item).decode_from(row, idx)?;
        }
        Ok(item)
    }

    async fn execute(
        &self,
        op: Operation,
        conn: &impl GenericClient,
        sql: &str,
        args: &[&(dyn ToSql + Sync)],
    ) -> OrmResult<u64> {
        self.observe(op, async {
            let sql = bind_named(sql, args.len())?;
            trace::statement(op, &self.table, &sql, args.len());
            conn.execute(&sql, args).await
        })
        .await
    }

    async fn observe<R>(
        &self,
        op: Operation,
        fut: impl std::future::Future<Output = OrmResult<R>>,
    ) -> OrmResult<R> {
        let result = fut.await;
        if let Err(e) = &result {
            trace::failed(op, &self.table, e);
        }
        result
    }
}

impl<T, C> std::fmt::Debug for Repo<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repo")
            .field("table", &self.table)
            .field("primary_keys", &self.primary_keys)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
