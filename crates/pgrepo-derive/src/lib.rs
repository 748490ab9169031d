//! Derive macros for pgrepo
//!
//! Provides `#[derive(Mapper)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod mapper;
mod sql_ident;

/// Derive the `Mapper` field mapping for a struct.
///
/// Every named field becomes one column, in declaration order. The struct
/// must also implement `Default`.
///
/// # Example
///
/// ```ignore
/// use pgrepo::Mapper;
///
/// #[derive(Default, Mapper)]
/// struct User {
///     id: i64,
///     name: String,
///     #[repo(column = "email_address")]
///     email: Option<String>,
///     #[repo(skip)]
///     cached_score: u32,
/// }
/// ```
///
/// # Attributes
///
/// - `#[repo(rename_all = "...")]` - Rename every column: `snake_case` or
///   `lowercase`. Column names must be lowercase since they are emitted
///   unquoted.
/// - `#[repo(column = "name")]` - Map field to a different column name
/// - `#[repo(skip)]` - Leave the field out of the mapping (it keeps its
///   `Default` value when records are decoded)
#[proc_macro_derive(Mapper, attributes(repo))]
pub fn derive_mapper(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    mapper::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
