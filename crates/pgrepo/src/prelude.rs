//! Convenience re-exports for repository code.
//!
//! ```ignore
//! use pgrepo::prelude::*;
//! ```

pub use crate::accessor;
pub use crate::client::GenericClient;
pub use crate::error::{OrmError, OrmResult};
pub use crate::mapper::{Accessor, Mapper, SqlMap};
pub use crate::repo::Repo;
pub use tokio_postgres::types::ToSql;

#[cfg(feature = "derive")]
pub use pgrepo_derive::Mapper;
