//! Selects built for one record type, decoded into another shape.
//!
//! The query runs against `T`'s table; each row is decoded with `R::from_row`.
//! Nothing checks that the selected columns fit `R`; a mismatch surfaces as
//! `DaoError::Parse`.

use crate::dao::{decode, run_count, run_fetch, statement, ExecContext};
use crate::executor::{DaoError, DaoExecutor};
use crate::page::Page;
use crate::query::Query;
use crate::schema::{FromRow, Record};

/// Run `query` against `T`'s table and decode every row as `R`
///
/// ```no_run
/// use daoguard::projection::select_list_model;
/// use daoguard::{DaoExecutor, FromRow, Query};
/// # use daoguard::{FieldDef, Record};
/// # struct Order;
/// # impl FromRow for Order {
/// #     fn from_row(_row: &may_postgres::Row) -> Result<Self, may_postgres::Error> { Ok(Order) }
/// # }
/// # impl Record for Order {
/// #     const TABLE: &'static str = "orders";
/// #     fn fields() -> &'static [FieldDef] { &[] }
/// #     fn values(&self) -> Vec<sea_query::Value> { vec![] }
/// # }
///
/// struct Totals { customer: String, spent: i64 }
///
/// impl FromRow for Totals {
///     fn from_row(row: &may_postgres::Row) -> Result<Self, may_postgres::Error> {
///         Ok(Totals { customer: row.try_get("customer")?, spent: row.try_get("spent")? })
///     }
/// }
///
/// # fn run(executor: &dyn DaoExecutor) -> Result<(), daoguard::DaoError> {
/// let query = Query::<Order>::new()
///     .select(["customer", "SUM(amount)::bigint AS spent"])
///     .group_by(["customer"]);
/// let totals: Vec<Totals> = select_list_model(executor, &query)?;
/// # Ok(())
/// # }
/// ```
pub fn select_list_model<T: Record, R: FromRow>(
    executor: &dyn DaoExecutor,
    query: &Query<T>,
) -> Result<Vec<R>, DaoError> {
    select_list_model_with(executor, &ExecContext::default(), query)
}

/// Paged variant of [`select_list_model`]; same two-phase rules as `BaseDao::select_page`
pub fn select_page_model<T: Record, R: FromRow>(
    executor: &dyn DaoExecutor,
    page: &mut Page<R>,
    query: &Query<T>,
) -> Result<(), DaoError> {
    select_page_model_with(executor, &ExecContext::default(), page, query)
}

pub(crate) fn select_list_model_with<T: Record, R: FromRow>(
    executor: &dyn DaoExecutor,
    ctx: &ExecContext,
    query: &Query<T>,
) -> Result<Vec<R>, DaoError> {
    let rows = run_fetch(executor, ctx, &statement::select(query, None)?)?;
    rows.iter().map(decode).collect()
}

pub(crate) fn select_page_model_with<T: Record, R: FromRow>(
    executor: &dyn DaoExecutor,
    ctx: &ExecContext,
    page: &mut Page<R>,
    query: &Query<T>,
) -> Result<(), DaoError> {
    page.total = run_count(executor, ctx, query)?;

    let rendered = statement::select(query, Some(page.pagination()))?;
    let rows = run_fetch(executor, ctx, &rendered)?;
    page.records = rows.iter().map(decode).collect::<Result<Vec<R>, DaoError>>()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::mock::MockExecutor;
    use crate::schema::FieldDef;
    use may_postgres::Row;
    use sea_query::Value;

    struct Order;

    impl FromRow for Order {
        fn from_row(_row: &Row) -> Result<Self, may_postgres::Error> {
            Ok(Order)
        }
    }

    impl Record for Order {
        const TABLE: &'static str = "orders";

        fn fields() -> &'static [FieldDef] {
            const FIELDS: &[FieldDef] = &[FieldDef::new("id").primary_key()];
            FIELDS
        }

        fn values(&self) -> Vec<Value> {
            vec![]
        }
    }

    struct CustomerTotal;

    impl FromRow for CustomerTotal {
        fn from_row(_row: &Row) -> Result<Self, may_postgres::Error> {
            Ok(CustomerTotal)
        }
    }

    fn totals_query() -> Query<Order> {
        Query::new()
            .select(["customer", "SUM(amount) AS spent"])
            .gt("amount", 0)
            .group_by(["customer"])
            .having("SUM(amount) > ?", [100])
    }

    #[test]
    fn test_list_projection_queries_source_table() {
        let mock = MockExecutor::new();
        let totals: Vec<CustomerTotal> = select_list_model(&mock, &totals_query()).unwrap();
        assert!(totals.is_empty());

        let sql = &mock.get_captured_sql()[0];
        assert!(sql.starts_with(r#"SELECT customer, SUM(amount) AS spent FROM "orders""#));
        assert!(sql.contains("GROUP BY customer"));
        assert!(sql.contains("HAVING SUM(amount) > $2"));
        assert_eq!(mock.get_captured_param_counts(), vec![2]);
    }

    #[test]
    fn test_page_projection_counts_grouped_rows() {
        let mock = MockExecutor::new();
        let mut page: Page<CustomerTotal> = Page::new(2, 5);
        select_page_model(&mock, &mut page, &totals_query()).unwrap();

        let sql = mock.get_captured_sql();
        assert_eq!(sql.len(), 2);
        assert!(sql[0].starts_with("SELECT COUNT(*) FROM (SELECT customer"));
        assert!(sql[1].contains("LIMIT"));
        assert_eq!(mock.get_captured_param_counts(), vec![2, 4]);
    }

    #[test]
    fn test_page_projection_stops_after_failed_count() {
        let mock = MockExecutor::failing_on(1);
        let mut page: Page<CustomerTotal> = Page::new(1, 10);
        assert!(select_page_model(&mock, &mut page, &totals_query()).is_err());
        assert_eq!(mock.get_captured_sql().len(), 1);
        assert!(page.records.is_empty());
    }
}
