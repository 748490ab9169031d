//! # pgrepo
//!
//! Repository-style PostgreSQL access without per-entity SQL.
//!
//! A record type declares, once, which column each of its fields maps to
//! (the [`Mapper`] trait, usually derived). A [`Repo`] turns that mapping
//! into SELECT / INSERT / UPSERT / UPDATE / DELETE / COUNT statements and
//! decodes result rows back into records through the same accessors.
//!
//! ## Features
//!
//! - **Reflection-free mapping**: each column is a pair of plain function
//!   pointers into the record, built with [`accessor!`] or `#[derive(Mapper)]`
//! - **Caller-owned predicates**: WHERE / ORDER / LIMIT are passed as a raw
//!   clause fragment; arguments are referenced as `$c1, $c2, ...`
//! - **Transaction-friendly**: pass a transaction anywhere a `GenericClient` is expected
//! - **Safe upserts**: an upsert with nothing to update is rejected before it is sent
//! - **SQL logging**: statements are traced under `pgrepo.sql` (feature `tracing`)
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
//! let n = users.count(&client, "WHERE email LIKE $c1", &[&"%@x"]).await?;
//! let page = users.select(&client, "ORDER BY id LIMIT $c1", &[&20_i64]).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod mapper;
pub mod params;
pub mod repo;
pub mod statement;

mod trace;

pub use client::GenericClient;
pub use config::DatabaseConfig;
pub use error::{OrmError, OrmResult};
pub use mapper::{Accessor, ColumnValue, Mapper, SqlMap};
pub use repo::Repo;
pub use statement::Operation;
pub use tokio_postgres::types::ToSql;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_from_config, create_pool_with_config, create_pool_with_tls};

#[cfg(feature = "derive")]
pub use pgrepo_derive::Mapper;

pub mod prelude;
