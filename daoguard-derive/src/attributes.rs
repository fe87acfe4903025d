//! Attribute parsing utilities

use syn::{Attribute, ExprLit, Field, Lit};

/// `#[name = "value"]` string attribute
fn string_value(attrs: &[Attribute], name: &str) -> Option<String> {
    for attr in attrs {
        if attr.path().is_ident(name) {
            if let Ok(meta) = attr.meta.require_name_value() {
                if let syn::Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) = &meta.value
                {
                    return Some(s.value());
                }
            }
        }
    }
    None
}

/// Extract table name from struct attributes
pub fn extract_table_name(attrs: &[Attribute]) -> Option<String> {
    string_value(attrs, "table_name")
}

/// Parsed field-level attributes
#[derive(Debug, Default)]
pub struct ColumnAttributes {
    pub column_name: Option<String>,
    pub is_primary_key: bool,
    pub is_auto_increment: bool,
}

pub fn parse_column_attributes(field: &Field) -> ColumnAttributes {
    let mut attrs = ColumnAttributes {
        column_name: string_value(&field.attrs, "column_name"),
        ..ColumnAttributes::default()
    };

    for attr in &field.attrs {
        if attr.path().is_ident("primary_key") {
            attrs.is_primary_key = true;
        } else if attr.path().is_ident("auto_increment") {
            attrs.is_auto_increment = true;
        }
    }

    attrs
}
