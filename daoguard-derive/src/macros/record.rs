//! Derive macro for the `Record` trait

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Ident};

use super::from_row::{from_row_body, named_fields};
use crate::attributes;
use crate::utils;

pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let fields = match named_fields(&input) {
        Ok(fields) => fields,
        Err(err) => return err.to_compile_error().into(),
    };

    let struct_name = &input.ident;
    let table_name = attributes::extract_table_name(&input.attrs)
        .unwrap_or_else(|| utils::snake_case(&struct_name.to_string()));

    let primary_keys = fields
        .iter()
        .filter(|f| attributes::parse_column_attributes(f).is_primary_key)
        .count();
    if primary_keys > 1 {
        return syn::Error::new_spanned(
            struct_name,
            "at most one field can be marked #[primary_key]",
        )
        .to_compile_error()
        .into();
    }

    let mut field_defs = Vec::new();
    let mut values = Vec::new();
    let mut field_consts = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let name = utils::unraw(ident);
        let attrs = attributes::parse_column_attributes(field);

        let mut def = quote! { ::daoguard::FieldDef::new(#name) };
        if let Some(column) = &attrs.column_name {
            def = quote! { #def.column(#column) };
        }
        if attrs.is_primary_key {
            def = quote! { #def.primary_key() };
        }
        if attrs.is_auto_increment {
            def = quote! { #def.auto_increment() };
        }
        field_defs.push(def);

        values.push(quote! {
            ::daoguard::Value::from(::std::clone::Clone::clone(&self.#ident))
        });

        let const_name = Ident::new(&name.to_uppercase(), Span::call_site());
        let doc = format!("Column reference for `{name}`");
        field_consts.push(quote! {
            #[doc = #doc]
            pub const #const_name: ::daoguard::Field<#struct_name> = ::daoguard::Field::new(#name);
        });
    }

    let from_row = from_row_body(fields);

    TokenStream::from(quote! {
        impl ::daoguard::FromRow for #struct_name {
            fn from_row(row: &::daoguard::Row) -> ::std::result::Result<Self, ::daoguard::PostgresError> {
                #from_row
            }
        }

        impl ::daoguard::Record for #struct_name {
            const TABLE: &'static str = #table_name;

            fn fields() -> &'static [::daoguard::FieldDef] {
                const FIELDS: &[::daoguard::FieldDef] = &[#(#field_defs),*];
                FIELDS
            }

            fn values(&self) -> ::std::vec::Vec<::daoguard::Value> {
                ::std::vec![#(#values),*]
            }
        }

        #[allow(dead_code)]
        impl #struct_name {
            #(#field_consts)*
        }
    })
}
