//! Procedural macros for daoguard
//!
//! This crate provides derive macros for `Record` and `FromRow`.

mod attributes;
mod macros;
mod utils;

use proc_macro::TokenStream;

/// Derive macro for `Record` - generates the schema descriptor for a table row
///
/// This macro generates:
/// - `Record` implementation (`TABLE`, `fields()`, `values()`)
/// - `FromRow` implementation (automatic, do not derive it as well)
/// - One associated `Field<Self>` constant per field, named after the field in
///   upper case (`price` becomes `Self::PRICE`)
///
/// Attributes:
/// - `#[table_name = "..."]` on the struct; defaults to the snake_case struct name
/// - `#[primary_key]`, `#[auto_increment]`, `#[column_name = "..."]` on fields
///
/// ```ignore
/// #[derive(Record)]
/// #[table_name = "products"]
/// struct Product {
///     #[primary_key]
///     #[auto_increment]
///     id: i64,
///     #[column_name = "sku"]
///     code: String,
///     price: i32,
/// }
/// ```
#[proc_macro_derive(Record, attributes(table_name, primary_key, auto_increment, column_name))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    macros::derive_record(input)
}

/// Derive macro for `FromRow` - decodes a row by column name
///
/// Use it for projection types; `Record` already generates `FromRow`.
#[proc_macro_derive(FromRow, attributes(column_name))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    macros::derive_from_row(input)
}
