//! Expansion tests for `#[derive(Record)]` and `#[derive(FromRow)]`

use daoguard::{ColumnResolver, FieldDef, FromRow, IntoColumn, Query, Record};
use sea_query::Value;

#[derive(Record, Debug, Clone)]
#[table_name = "products"]
struct Product {
    #[primary_key]
    #[auto_increment]
    id: i64,
    #[column_name = "sku"]
    code: String,
    unit_price: i32,
    discontinued: bool,
    note: Option<String>,
}

#[derive(Record)]
struct AuditEntry {
    entry_no: i64,
    stock: u32,
}

#[derive(FromRow)]
#[allow(dead_code)]
struct PriceBand {
    band: String,
    #[column_name = "n"]
    count: i64,
}

fn accepts_from_row<R: FromRow>() {}

#[test]
fn test_table_and_fields() {
    assert_eq!(Product::TABLE, "products");
    assert_eq!(
        Product::fields(),
        &[
            FieldDef::new("id").primary_key().auto_increment(),
            FieldDef::new("code").column("sku"),
            FieldDef::new("unit_price"),
            FieldDef::new("discontinued"),
            FieldDef::new("note"),
        ]
    );
}

#[test]
fn test_default_table_name_is_snake_case() {
    assert_eq!(AuditEntry::TABLE, "audit_entry");
}

#[test]
fn test_values_follow_field_order() {
    let p = Product {
        id: 3,
        code: "D42".to_string(),
        unit_price: 100,
        discontinued: false,
        note: None,
    };
    let values = p.values();
    assert_eq!(values.len(), Product::fields().len());
    assert_eq!(values[0], Value::from(3i64));
    assert_eq!(values[1], Value::from("D42"));
    assert_eq!(values[2], Value::from(100i32));
    assert_eq!(values[3], Value::from(false));
    assert_eq!(values[4], Value::from(None::<String>));
}

#[test]
fn test_unsigned_fields_bind_as_values() {
    let entry = AuditEntry {
        entry_no: 1,
        stock: 12,
    };
    assert_eq!(entry.values()[1], Value::from(12u32));
}

#[test]
fn test_field_constants_resolve_columns() {
    assert_eq!(IntoColumn::<Product>::into_column(Product::CODE), "sku");
    assert_eq!(IntoColumn::<Product>::into_column(Product::UNIT_PRICE), "unit_price");
    assert_eq!(Product::ID.name(), "id");
}

#[test]
fn test_primary_key_resolution() {
    assert_eq!(ColumnResolver::primary_key_column::<Product>("id"), "id");
    assert_eq!(ColumnResolver::primary_key_column::<AuditEntry>("entry_no"), "entry_no");
}

#[test]
fn test_field_constants_in_queries() {
    let typed = Query::<Product>::new()
        .eq(Product::CODE, "D42")
        .gt(Product::UNIT_PRICE, 10)
        .finalize();
    let raw = Query::<Product>::new()
        .eq("sku", "D42")
        .gt("unit_price", 10)
        .finalize();
    assert_eq!(typed, raw);
}

#[test]
fn test_from_row_derive_for_projection() {
    accepts_from_row::<PriceBand>();
    accepts_from_row::<Product>();
}
