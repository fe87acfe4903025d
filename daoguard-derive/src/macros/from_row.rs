//! Derive macro for `FromRow` trait
//!
//! Columns are read by name: the `column_name` attribute if present, otherwise
//! the snake_case field name.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields};

use crate::attributes;
use crate::utils;

pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let fields = match named_fields(&input) {
        Ok(fields) => fields,
        Err(err) => return err.to_compile_error().into(),
    };

    let struct_name = &input.ident;
    let body = from_row_body(fields);

    TokenStream::from(quote! {
        impl ::daoguard::FromRow for #struct_name {
            fn from_row(row: &::daoguard::Row) -> ::std::result::Result<Self, ::daoguard::PostgresError> {
                #body
            }
        }
    })
}

/// Named fields of a struct, or a spanned error for anything else
pub fn named_fields(input: &DeriveInput) -> syn::Result<&Punctuated<Field, Comma>> {
    match &input.data {
        Data::Struct(syn::DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => Ok(&fields.named),
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            "can only be derived for structs with named fields",
        )),
    }
}

/// Column a field is read from and written to
pub fn column_for(field: &Field) -> String {
    attributes::parse_column_attributes(field)
        .column_name
        .unwrap_or_else(|| field.ident.as_ref().map(|i| utils::snake_case(&utils::unraw(i))).unwrap_or_default())
}

/// `Ok(Self { .. })` reading every field from `row`
pub fn from_row_body(fields: &Punctuated<Field, Comma>) -> TokenStream2 {
    let assignments = fields.iter().map(|field| {
        let field_name = &field.ident;
        let column = column_for(field);

        // PostgreSQL has no unsigned types; read the wider signed type and narrow
        let get_expr = match unsigned_source(&field.ty) {
            Some(signed) => {
                let field_type = &field.ty;
                quote! {
                    {
                        let val: #signed = row.try_get(#column)?;
                        val as #field_type
                    }
                }
            }
            None => quote! { row.try_get(#column)? },
        };

        quote! { #field_name: #get_expr, }
    });

    quote! {
        ::std::result::Result::Ok(Self {
            #(#assignments)*
        })
    }
}

fn unsigned_source(ty: &syn::Type) -> Option<TokenStream2> {
    let syn::Type::Path(syn::TypePath { path, qself: None }) = ty else {
        return None;
    };
    let ident = path.get_ident()?.to_string();
    match ident.as_str() {
        "u8" => Some(quote! { i16 }),
        "u16" => Some(quote! { i32 }),
        "u32" | "u64" => Some(quote! { i64 }),
        _ => None,
    }
}
