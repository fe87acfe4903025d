//! sea-query statement assembly from builder state.
//!
//! Every function returns a rendered `(sql, values)` pair with `$n`
//! placeholders, ready for `with_converted_params`.

use crate::executor::DaoError;
use crate::page::Pagination;
use crate::query::{Condition, Query};
use crate::schema::{ColumnResolver, Record};
use sea_query::{
    Asterisk, DeleteStatement, Expr, Iden, InsertStatement, Order, PostgresQueryBuilder,
    SelectStatement, UpdateStatement, Value,
};

/// Rendered statement text plus its positional values
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub sql: String,
    pub values: Vec<Value>,
}

impl Rendered {
    fn from_built((sql, values): (String, sea_query::Values)) -> Self {
        Self {
            sql,
            values: values.0,
        }
    }
}

/// Table or column name handed to sea-query for quoting
#[derive(Debug, Clone)]
pub(crate) struct Ident(pub String);

impl Iden for Ident {
    fn unquoted(&self) -> &str {
        &self.0
    }
}

fn table<T: Record>() -> Ident {
    Ident(T::TABLE.to_string())
}

/// Custom sea-query expression for a condition, checked for placeholder arity
fn custom(condition: &Condition) -> Result<Expr, DaoError> {
    let placeholders = condition.placeholder_count();
    if placeholders != condition.values.len() {
        return Err(DaoError::Query(format!(
            "condition `{}` has {placeholders} placeholders but {} values",
            condition.sql,
            condition.values.len()
        )));
    }
    Ok(Expr::cust_with_values(
        condition.numbered_sql(),
        condition.values.clone(),
    ))
}

/// `SELECT` for `query`, optionally windowed; `ORDER BY` is left out when `ordered` is false
fn select_statement<T: Record>(
    query: &Query<T>,
    ordered: bool,
    window: Option<Pagination>,
) -> Result<SelectStatement, DaoError> {
    let mut stmt = SelectStatement::default();
    stmt.from(table::<T>());

    // DISTINCT columns lead the projection; plain selections follow
    let mut projection: Vec<&String> = query.distinct_columns().iter().collect();
    for column in query.select_columns() {
        if !projection.contains(&column) {
            projection.push(column);
        }
    }
    if !query.distinct_columns().is_empty() {
        stmt.distinct();
    }
    if projection.is_empty() {
        stmt.column(Asterisk);
    } else {
        for column in projection {
            stmt.expr(Expr::cust(column.clone()));
        }
    }

    let condition = query.finalize();
    if !condition.is_empty() {
        stmt.and_where(custom(&condition)?);
    }

    if !query.group_columns().is_empty() {
        stmt.add_group_by(
            query
                .group_columns()
                .iter()
                .map(|column| Expr::cust(column.clone())),
        );
    }

    let having = query.having_condition();
    if !having.is_empty() {
        stmt.and_having(custom(having)?);
    }

    if ordered {
        for item in query.order() {
            let order = if item.ascending { Order::Asc } else { Order::Desc };
            stmt.order_by_expr(Expr::cust(item.column.clone()), order);
        }
    }

    if let Some(window) = window {
        stmt.limit(window.limit);
        if window.offset > 0 {
            stmt.offset(window.offset);
        }
    }

    Ok(stmt)
}

/// Full data query
pub fn select<T: Record>(
    query: &Query<T>,
    window: Option<Pagination>,
) -> Result<Rendered, DaoError> {
    let stmt = select_statement(query, true, window)?;
    Ok(Rendered::from_built(stmt.build(PostgresQueryBuilder)))
}

/// `SELECT COUNT(*)` over the unordered, unwindowed data query
pub fn count<T: Record>(query: &Query<T>) -> Result<Rendered, DaoError> {
    let (inner, values) = select_statement(query, false, None)?.build(PostgresQueryBuilder);
    Ok(Rendered {
        sql: format!("SELECT COUNT(*) FROM ({inner}) AS count_subquery"),
        values: values.0,
    })
}

/// Multi-row `INSERT .. RETURNING *`
///
/// Auto-increment columns are omitted when every row leaves them zero; in a
/// chunk that mixes zero and explicit keys the zero cells render `DEFAULT`.
pub fn insert<T: Record>(rows: &[&T]) -> Result<Rendered, DaoError> {
    let fields = T::fields();
    let row_values: Vec<Vec<Value>> = rows.iter().map(|row| row.values()).collect();

    for values in &row_values {
        if values.len() != fields.len() {
            return Err(DaoError::Query(format!(
                "{} declares {} fields but produced {} values",
                T::TABLE,
                fields.len(),
                values.len()
            )));
        }
    }

    let included: Vec<usize> = (0..fields.len())
        .filter(|&i| {
            !fields[i].auto_increment || row_values.iter().any(|values| !is_zero(&values[i]))
        })
        .collect();

    let columns = ColumnResolver::columns::<T>();
    let mut stmt = InsertStatement::default();
    stmt.into_table(table::<T>());

    if included.is_empty() {
        let count = u32::try_from(rows.len())
            .map_err(|_| DaoError::Query(format!("too many rows for one insert: {}", rows.len())))?;
        stmt.or_default_values_many(count);
    } else {
        stmt.columns(included.iter().map(|&i| Ident(columns[i].to_string())));
        for values in row_values {
            // zero auto-increment cells in a mixed chunk still take the generated value
            let picked = included.iter().map(|&i| {
                if fields[i].auto_increment && is_zero(&values[i]) {
                    Expr::cust("DEFAULT")
                } else {
                    Expr::from(values[i].clone())
                }
            });
            stmt.values(picked)
                .map_err(|e| DaoError::Query(format!("Failed to build insert: {e}")))?;
        }
    }
    stmt.returning_col(Asterisk);

    Ok(Rendered::from_built(stmt.build(PostgresQueryBuilder)))
}

/// `UPDATE .. SET` with `assignments`, restricted by `query`'s condition
pub fn update<T: Record>(
    assignments: &[(String, Value)],
    query: &Query<T>,
) -> Result<Rendered, DaoError> {
    let mut stmt = UpdateStatement::default();
    stmt.table(table::<T>());
    for (column, value) in assignments {
        stmt.value(Ident(column.clone()), Expr::from(value.clone()));
    }
    let condition = query.finalize();
    if !condition.is_empty() {
        stmt.and_where(custom(&condition)?);
    }
    Ok(Rendered::from_built(stmt.build(PostgresQueryBuilder)))
}

/// `DELETE` restricted by `query`'s condition
pub fn delete<T: Record>(query: &Query<T>) -> Result<Rendered, DaoError> {
    let mut stmt = DeleteStatement::default();
    stmt.from_table(table::<T>());
    let condition = query.finalize();
    if !condition.is_empty() {
        stmt.and_where(custom(&condition)?);
    }
    Ok(Rendered::from_built(stmt.build(PostgresQueryBuilder)))
}

/// Zero value of a field: NULL, numeric zero, empty text/bytes, `false`, nil UUID
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Bool(v) => matches!(v, None | Some(false)),
        Value::TinyInt(v) => v.unwrap_or(0) == 0,
        Value::SmallInt(v) => v.unwrap_or(0) == 0,
        Value::Int(v) => v.unwrap_or(0) == 0,
        Value::BigInt(v) => v.unwrap_or(0) == 0,
        Value::TinyUnsigned(v) => v.unwrap_or(0) == 0,
        Value::SmallUnsigned(v) => v.unwrap_or(0) == 0,
        Value::Unsigned(v) => v.unwrap_or(0) == 0,
        Value::BigUnsigned(v) => v.unwrap_or(0) == 0,
        Value::Float(v) => v.unwrap_or(0.0) == 0.0,
        Value::Double(v) => v.unwrap_or(0.0) == 0.0,
        Value::String(v) => v.as_ref().map_or(true, |s| s.is_empty()),
        Value::Char(v) => v.is_none(),
        Value::Bytes(v) => v.as_ref().map_or(true, |b| b.is_empty()),
        Value::Json(v) => v.is_none(),
        Value::ChronoDate(v) => v.is_none(),
        Value::ChronoTime(v) => v.is_none(),
        Value::ChronoDateTime(v) => v.is_none(),
        Value::ChronoDateTimeUtc(v) => v.is_none(),
        Value::ChronoDateTimeLocal(v) => v.is_none(),
        Value::ChronoDateTimeWithTimeZone(v) => v.is_none(),
        Value::Uuid(v) => v.as_ref().map_or(true, |u| u.is_nil()),
        Value::Decimal(v) => v.as_ref().map_or(true, |d| d.is_zero()),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}
