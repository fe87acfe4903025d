//! Record descriptors and column resolution.
//!
//! Every record type declares a static schema through [`Record`]: its table
//! and, in declaration order, one [`FieldDef`] per persisted field. The
//! descriptor is normally generated by `#[derive(Record)]`, but a hand-written
//! impl is just as valid. [`ColumnResolver`] turns that metadata into physical
//! column names.

use may_postgres::Row;
use sea_query::Value;
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

/// Decode one result row into `Self`
///
/// Projection targets only need this trait; full records also implement [`Record`].
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, may_postgres::Error>;
}

/// Metadata for one persisted field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Logical (Rust) field name
    pub name: &'static str,
    /// Explicit column override; `None` applies the naming convention
    pub column: Option<&'static str>,
    pub primary_key: bool,
    /// Zero values in this field are left for the database to generate
    pub auto_increment: bool,
}

impl FieldDef {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            primary_key: false,
            auto_increment: false,
        }
    }

    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

/// A record type the DAO can persist
///
/// `values()` must return one value per entry of `fields()`, in the same order.
///
/// ```
/// use daoguard::{FieldDef, FromRow, Record};
/// use sea_query::Value;
///
/// struct Tag { id: i64, label: String }
///
/// impl FromRow for Tag {
///     fn from_row(row: &may_postgres::Row) -> Result<Self, may_postgres::Error> {
///         Ok(Tag { id: row.try_get("id")?, label: row.try_get("label")? })
///     }
/// }
///
/// impl Record for Tag {
///     const TABLE: &'static str = "tags";
///     fn fields() -> &'static [FieldDef] {
///         const FIELDS: &[FieldDef] = &[
///             FieldDef::new("id").primary_key().auto_increment(),
///             FieldDef::new("label"),
///         ];
///         FIELDS
///     }
///     fn values(&self) -> Vec<Value> {
///         vec![self.id.into(), self.label.clone().into()]
///     }
/// }
/// ```
pub trait Record: FromRow {
    const TABLE: &'static str;

    fn fields() -> &'static [FieldDef];

    fn values(&self) -> Vec<Value>;
}

/// Typed reference to a field of `T`
///
/// Resolves to the same column as the field's name written as a string.
pub struct Field<T> {
    name: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T> Field<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _record: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}

/// Anything that names a column of `T`: a raw column string or a [`Field<T>`]
pub trait IntoColumn<T> {
    fn into_column(self) -> String;
}

impl<T> IntoColumn<T> for &str {
    fn into_column(self) -> String {
        self.to_string()
    }
}

impl<T> IntoColumn<T> for String {
    fn into_column(self) -> String {
        self
    }
}

impl<T> IntoColumn<T> for &String {
    fn into_column(self) -> String {
        self.clone()
    }
}

impl<T: Record> IntoColumn<T> for Field<T> {
    fn into_column(self) -> String {
        ColumnResolver::field_column(&self).into_owned()
    }
}

/// Pure functions from schema metadata to column names
pub struct ColumnResolver;

impl ColumnResolver {
    /// Column for one field: the explicit override, else the naming convention
    pub fn column_name(field: &FieldDef) -> Cow<'static, str> {
        match field.column {
            Some(column) => Cow::Borrowed(column),
            None => Cow::Owned(Self::naming_convention(field.name)),
        }
    }

    /// Column for a typed field reference
    ///
    /// Names missing from `T::fields()` still resolve through the naming convention.
    pub fn field_column<T: Record>(field: &Field<T>) -> Cow<'static, str> {
        T::fields()
            .iter()
            .find(|def| def.name == field.name())
            .map(Self::column_name)
            .unwrap_or_else(|| Cow::Owned(Self::naming_convention(field.name())))
    }

    /// First field marked primary key, in declaration order, or `default`
    pub fn primary_key_column<T: Record>(default: &str) -> Cow<'static, str> {
        T::fields()
            .iter()
            .find(|def| def.primary_key)
            .map(Self::column_name)
            .unwrap_or_else(|| Cow::Owned(default.to_string()))
    }

    /// Index of the primary-key field inside `T::fields()`, if one is marked
    pub fn primary_key_index<T: Record>() -> Option<usize> {
        T::fields().iter().position(|def| def.primary_key)
    }

    /// All columns of `T` in declaration order
    pub fn columns<T: Record>() -> Vec<Cow<'static, str>> {
        T::fields().iter().map(Self::column_name).collect()
    }

    /// snake_case with initialisms kept together: `UserID` -> `user_id`,
    /// `HTTPServer` -> `http_server`, `createdAt` -> `created_at`
    pub fn naming_convention(name: &str) -> String {
        let chars: Vec<char> = name.chars().collect();
        let mut out = String::with_capacity(name.len() + 4);

        for (i, &c) in chars.iter().enumerate() {
            if c.is_uppercase() {
                let prev = if i > 0 { Some(chars[i - 1]) } else { None };
                let next = chars.get(i + 1).copied();
                let boundary = match prev {
                    None => false,
                    Some(p) if p == '_' => false,
                    Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                    Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                    Some(_) => false,
                };
                if boundary {
                    out.push('_');
                }
                out.extend(c.to_lowercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}
