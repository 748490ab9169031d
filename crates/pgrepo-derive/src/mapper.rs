//! Mapper derive macro implementation

use crate::sql_ident::check_sql_ident;
use heck::ToSnakeCase;
use proc_macro2::{Span, TokenStream};
use quote::quote;
use std::collections::HashSet;
use syn::{Data, DeriveInput, Error, Fields, LitStr, Result};

/// Column names are emitted unquoted, so PostgreSQL folds them to lowercase.
/// Only rules that already produce lowercase names are accepted.
#[derive(Clone, Copy)]
enum RenameRule {
    Snake,
    Lower,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> Result<Self> {
        match lit.value().as_str() {
            "snake_case" => Ok(Self::Snake),
            "lowercase" => Ok(Self::Lower),
            mixed @ ("camelCase" | "PascalCase" | "SCREAMING_SNAKE_CASE") => Err(Error::new(
                lit.span(),
                format!(
                    "rename_all rule '{mixed}' produces mixed-case names, which unquoted SQL \
                     folds to lowercase; use `snake_case` or `lowercase`"
                ),
            )),
            other => Err(Error::new(
                lit.span(),
                format!("unknown rename_all rule '{other}'"),
            )),
        }
    }

    fn apply(self, name: &str) -> String {
        match self {
            Self::Snake => name.to_snake_case(),
            Self::Lower => name.to_lowercase(),
        }
    }
}

fn check_lowercase(column: &str, span: Span) -> Result<()> {
    if column.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(Error::new(
            span,
            format!(
                "column '{column}' must be lowercase; unquoted SQL folds it to '{}'",
                column.to_lowercase()
            ),
        ));
    }
    Ok(())
}

#[derive(Default)]
struct FieldAttr {
    column: Option<LitStr>,
    skip: bool,
}

fn container_rename(input: &DeriveInput) -> Result<Option<RenameRule>> {
    let mut rule = None;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("repo")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                let lit: LitStr = meta.value()?.parse()?;
                rule = Some(RenameRule::parse(&lit)?);
                Ok(())
            } else {
                Err(meta.error("unsupported repo attribute; expected `rename_all`"))
            }
        })?;
    }
    Ok(rule)
}

fn field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut out = FieldAttr::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("repo")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                out.column = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("skip") {
                out.skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported repo attribute; expected `column` or `skip`"))
            }
        })?;
    }
    Ok(out)
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(Error::new_spanned(
                    &input,
                    "Mapper can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(Error::new_spanned(
                &input,
                "Mapper can only be derived for structs",
            ));
        }
    };

    let rename = container_rename(&input)?;
    let mut seen = HashSet::new();
    let mut columns = Vec::new();

    for field in fields {
        let attr = field_attr(field)?;
        if attr.skip {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_name = ident.to_string();
        let field_name = field_name.strip_prefix("r#").unwrap_or(&field_name);

        let (column, span) = match &attr.column {
            Some(lit) => (lit.value(), lit.span()),
            None => (
                rename.map_or_else(|| field_name.to_string(), |r| r.apply(field_name)),
                ident.span(),
            ),
        };
        check_sql_ident(&column, span, "column")?;
        check_lowercase(&column, span)?;
        if !seen.insert(column.clone()) {
            return Err(Error::new(span, format!("duplicate column '{column}'")));
        }

        columns.push(quote! {
            .column(#column, ::pgrepo::Accessor::<Self>::new(|r| &r.#ident, |r| &mut r.#ident))
        });
    }

    Ok(quote! {
        impl #impl_generics ::pgrepo::Mapper for #name #ty_generics #where_clause {
            fn mapper(&self) -> ::pgrepo::SqlMap<Self> {
                ::pgrepo::SqlMap::new()
                    #(#columns)*
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn error_of(input: DeriveInput) -> String {
        match expand(input) {
            Ok(_) => panic!("expected a compile error"),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn lowercase_rules_expand() {
        let input: DeriveInput = parse_quote! {
            #[repo(rename_all = "snake_case")]
            struct Audit { entry_id: i64, #[repo(column = "by_user")] created_by: String }
        };
        let out = expand(input).unwrap().to_string();
        assert!(out.contains("\"entry_id\""));
        assert!(out.contains("\"by_user\""));
    }

    #[test]
    fn mixed_case_rename_rules_are_rejected() {
        for rule in ["camelCase", "PascalCase", "SCREAMING_SNAKE_CASE"] {
            let lit = LitStr::new(rule, Span::call_site());
            let input: DeriveInput = parse_quote! {
                #[repo(rename_all = #lit)]
                struct Audit { entry_id: i64, created_by: String }
            };
            assert!(error_of(input).contains("mixed-case"), "{rule}");
        }
    }

    #[test]
    fn mixed_case_column_is_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Audit { #[repo(column = "entryId")] entry_id: i64 }
        };
        assert!(error_of(input).contains("must be lowercase"));
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Audit { id: i64, #[repo(column = "id")] other: i64 }
        };
        assert!(error_of(input).contains("duplicate column"));
    }
}
