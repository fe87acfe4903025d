//! Generic CRUD over any [`Record`] type.
//!
//! [`BaseDao<T>`] binds a record type to an executor and turns [`Query<T>`]
//! state into single statements: one round-trip per call, except
//! `insert_batch` (one per chunk) and `select_page` (count, then data).
//!
//! # Examples
//!
//! ```no_run
//! use daoguard::{BaseDao, DaoError, Page, Query};
//! # use daoguard::{FieldDef, FromRow, Record};
//! # struct Product { id: i64, code: String, price: i32 }
//! # impl FromRow for Product {
//! #     fn from_row(_row: &may_postgres::Row) -> Result<Self, may_postgres::Error> { todo!() }
//! # }
//! # impl Record for Product {
//! #     const TABLE: &'static str = "products";
//! #     fn fields() -> &'static [FieldDef] { &[] }
//! #     fn values(&self) -> Vec<sea_query::Value> { vec![] }
//! # }
//!
//! # fn main() -> Result<(), DaoError> {
//! let dao = BaseDao::<Product>::new()?;
//!
//! let cheap = dao.select_list(&Query::new().lt("price", 100).order_by_asc("code"))?;
//!
//! let mut page = Page::new(2, 20);
//! dao.select_page(&mut page, &Query::new().like("code", "D4"))?;
//! println!("{} of {}", page.records.len(), page.total);
//! # Ok(())
//! # }
//! ```

pub mod statement;

use crate::config::DaoSettings;
use crate::executor::{DaoExecutor, DaoError};
use crate::page::Page;
use crate::query::value_conversion::with_converted_params;
use crate::query::Query;
use crate::schema::{ColumnResolver, FromRow, Record};
use may_postgres::Row;
use sea_query::Value;
use statement::Rendered;
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Shared executor handle
pub type SharedExecutor = Arc<dyn DaoExecutor + Send + Sync>;

/// Caller context threaded through every operation
///
/// The label shows up in debug logs and operation spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecContext {
    label: Option<String>,
}

impl ExecContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Outcome of a write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
}

impl ExecResult {
    pub fn new(rows_affected: u64) -> Self {
        Self { rows_affected }
    }
}

/// Span and counter around one DAO operation
struct Observation {
    #[cfg(feature = "tracing")]
    _span: tracing::span::EnteredSpan,
}

/// Generic data-access object for record type `T`
pub struct BaseDao<T> {
    executor: SharedExecutor,
    ctx: ExecContext,
    settings: DaoSettings,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for BaseDao<T> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            ctx: self.ctx.clone(),
            settings: self.settings.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> fmt::Debug for BaseDao<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseDao")
            .field("table", &T::TABLE)
            .field("ctx", &self.ctx)
            .field("settings", &self.settings)
            .finish()
    }
}

impl<T: Record> BaseDao<T> {
    /// DAO over the process-wide executor set by `global::init`
    ///
    /// # Errors
    ///
    /// Returns `DaoError::Config` if no executor has been initialized.
    pub fn new() -> Result<Self, DaoError> {
        let (executor, settings) = crate::global::default_executor()?;
        Ok(Self::with_executor_and_settings(executor, settings))
    }

    /// DAO over `executor` with default settings
    pub fn from_executor(executor: SharedExecutor) -> Self {
        Self::with_executor_and_settings(executor, DaoSettings::default())
    }

    pub fn with_executor_and_settings(executor: SharedExecutor, settings: DaoSettings) -> Self {
        Self {
            executor,
            ctx: ExecContext::default(),
            settings,
            _record: PhantomData,
        }
    }

    /// Same DAO bound to a different caller context
    pub fn with_ctx(&self, ctx: ExecContext) -> Self {
        Self {
            ctx,
            ..self.clone()
        }
    }

    /// Same DAO routed through a different executor, e.g. a transaction handle
    pub fn with_executor(&self, executor: SharedExecutor) -> Self {
        Self {
            executor,
            ..self.clone()
        }
    }

    pub fn executor(&self) -> &SharedExecutor {
        &self.executor
    }

    pub fn context(&self) -> &ExecContext {
        &self.ctx
    }

    pub fn settings(&self) -> &DaoSettings {
        &self.settings
    }

    /// Resolved primary-key column of `T`
    pub fn primary_key(&self) -> Cow<'static, str> {
        ColumnResolver::primary_key_column::<T>(&self.settings.default_primary_key)
    }

    fn observe(&self, operation: &'static str) -> Observation {
        #[cfg(feature = "metrics")]
        METRICS.record_operation(operation, T::TABLE);
        #[cfg(not(any(feature = "metrics", feature = "tracing")))]
        let _ = operation;
        Observation {
            #[cfg(feature = "tracing")]
            _span: tracing_helpers::operation_span(operation, T::TABLE, self.ctx.label())
                .entered(),
        }
    }

    fn execute(&self, rendered: &Rendered) -> Result<u64, DaoError> {
        run_execute(self.executor.as_ref(), &self.ctx, rendered)
    }

    fn fetch(&self, rendered: &Rendered) -> Result<Vec<Row>, DaoError> {
        run_fetch(self.executor.as_ref(), &self.ctx, rendered)
    }

    /// Insert one record and overwrite it with the row the database returns
    ///
    /// Auto-increment fields left at zero are generated by the database.
    pub fn insert(&self, entity: &mut T) -> Result<ExecResult, DaoError> {
        let _obs = self.observe("insert");
        let rendered = statement::insert::<T>(&[&*entity])?;
        let rows = self.fetch(&rendered)?;
        if let Some(row) = rows.first() {
            *entity = decode(row)?;
        }
        Ok(ExecResult::new(rows.len() as u64))
    }

    /// Insert in chunks of the configured default batch size
    pub fn insert_batch(&self, entities: &mut [T]) -> Result<ExecResult, DaoError> {
        self.insert_batch_size(entities, 0)
    }

    /// Insert in chunks of `batch_size` rows, one statement per chunk, in order
    ///
    /// Non-positive sizes fall back to the configured default. Generated values
    /// are written back when a chunk returns one row per entity.
    ///
    /// # Errors
    ///
    /// A failing chunk stops the batch. If earlier chunks were applied the
    /// error is `DaoError::Partial` carrying the rows inserted so far.
    pub fn insert_batch_size(
        &self,
        entities: &mut [T],
        batch_size: i64,
    ) -> Result<ExecResult, DaoError> {
        if entities.is_empty() {
            return Ok(ExecResult::default());
        }
        let _obs = self.observe("insert_batch");
        let size = self.settings.batch_size(batch_size).max(1);
        if batch_size <= 0 {
            log::debug!("batch size {batch_size} not positive, using {size}");
        }

        let mut rows_affected = 0u64;
        for (index, chunk) in entities.chunks_mut(size).enumerate() {
            match self.insert_chunk(chunk) {
                Ok(n) => {
                    rows_affected += n;
                    #[cfg(feature = "metrics")]
                    METRICS.record_batch_chunk(T::TABLE);
                }
                Err(err) if index == 0 => return Err(err),
                Err(err) => {
                    log::warn!(
                        "batch insert into {} aborted at chunk {index} after {rows_affected} rows: {err}",
                        T::TABLE
                    );
                    return Err(DaoError::Partial {
                        rows_affected,
                        source: Box::new(err),
                    });
                }
            }
        }
        Ok(ExecResult::new(rows_affected))
    }

    fn insert_chunk(&self, chunk: &mut [T]) -> Result<u64, DaoError> {
        let refs: Vec<&T> = chunk.iter().collect();
        let rendered = statement::insert::<T>(&refs)?;
        let rows = self.fetch(&rendered)?;
        if rows.len() == chunk.len() {
            for (entity, row) in chunk.iter_mut().zip(&rows) {
                *entity = decode(row)?;
            }
        } else {
            log::warn!(
                "insert into {} returned {} rows for {} records, generated values not written back",
                T::TABLE,
                rows.len(),
                chunk.len()
            );
        }
        Ok(rows.len() as u64)
    }

    /// Delete the row whose primary key equals `id`
    pub fn delete_by_id<V: Into<Value>>(&self, id: V) -> Result<ExecResult, DaoError> {
        let pk = self.primary_key();
        self.delete(&Query::new().eq(&*pk, id))
    }

    /// Delete every row whose primary key is in `ids`
    pub fn delete_by_ids<V, I>(&self, ids: I) -> Result<ExecResult, DaoError>
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let pk = self.primary_key();
        self.delete(&Query::new().is_in(&*pk, ids))
    }

    /// Delete rows matching `query`; an empty query deletes every row
    pub fn delete(&self, query: &Query<T>) -> Result<ExecResult, DaoError> {
        let _obs = self.observe("delete");
        let rendered = statement::delete(query)?;
        self.execute(&rendered).map(ExecResult::new)
    }

    /// Set every non-zero field except the primary key, matched on the primary key
    ///
    /// A record with nothing to set issues no statement. A zero primary key is
    /// rejected with `DaoError::Query`.
    pub fn update_by_id(&self, entity: &T) -> Result<ExecResult, DaoError> {
        let _obs = self.observe("update_by_id");
        let fields = T::fields();
        let values = entity.values();
        let pk = self.primary_key();

        let pk_value = match ColumnResolver::primary_key_index::<T>() {
            Some(i) => values.get(i).cloned(),
            None => fields
                .iter()
                .zip(&values)
                .find(|(def, _)| ColumnResolver::column_name(def) == pk)
                .map(|(_, v)| v.clone()),
        }
        .ok_or_else(|| {
            DaoError::Query(format!("{} has no value for primary key {pk}", T::TABLE))
        })?;
        if statement::is_zero(&pk_value) {
            return Err(DaoError::Query(format!(
                "update_by_id on {} needs a non-zero primary key {pk}",
                T::TABLE
            )));
        }

        let assignments: Vec<(String, Value)> = fields
            .iter()
            .zip(values)
            .map(|(def, value)| (ColumnResolver::column_name(def).into_owned(), value))
            .filter(|(column, value)| *column != pk && !statement::is_zero(value))
            .collect();

        if assignments.is_empty() {
            log::debug!("update_by_id on {}: no non-zero fields to set", T::TABLE);
            return Ok(ExecResult::default());
        }

        let rendered = statement::update(&assignments, &Query::new().eq(&*pk, pk_value))?;
        self.execute(&rendered).map(ExecResult::new)
    }

    /// Apply the query's `set` assignments to matching rows
    ///
    /// No assignments is a no-op; an empty condition updates every row.
    pub fn update(&self, query: &Query<T>) -> Result<ExecResult, DaoError> {
        let _obs = self.observe("update");
        if query.updates().is_empty() {
            log::debug!("update on {}: no assignments", T::TABLE);
            return Ok(ExecResult::default());
        }
        let rendered = statement::update(query.updates(), query)?;
        self.execute(&rendered).map(ExecResult::new)
    }

    pub fn select_by_id<V: Into<Value>>(&self, id: V) -> Result<Option<T>, DaoError> {
        let pk = self.primary_key();
        self.select_one(&Query::new().eq(&*pk, id))
    }

    pub fn select_by_ids<V, I>(&self, ids: I) -> Result<Vec<T>, DaoError>
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let pk = self.primary_key();
        self.select_list(&Query::new().is_in(&*pk, ids))
    }

    /// First matching row under `LIMIT 1`, or `None`
    pub fn select_one(&self, query: &Query<T>) -> Result<Option<T>, DaoError> {
        let _obs = self.observe("select_one");
        let window = crate::page::Pagination { offset: 0, limit: 1 };
        let rendered = statement::select(query, Some(window))?;
        let rows = self.fetch(&rendered)?;
        rows.first().map(decode).transpose()
    }

    pub fn select_list(&self, query: &Query<T>) -> Result<Vec<T>, DaoError> {
        let _obs = self.observe("select_list");
        self.select_list_as(query)
    }

    pub fn select_count(&self, query: &Query<T>) -> Result<i64, DaoError> {
        let _obs = self.observe("select_count");
        run_count(self.executor.as_ref(), &self.ctx, query)
    }

    /// Count, then fetch the requested window into `page`
    ///
    /// If counting fails no data query is issued and `page` is left as it was.
    pub fn select_page(&self, page: &mut Page<T>, query: &Query<T>) -> Result<(), DaoError> {
        let _obs = self.observe("select_page");
        self.select_page_as(page, query)
    }

    /// [`select_list`](Self::select_list) decoded into a projection type
    pub fn select_list_as<R: FromRow>(&self, query: &Query<T>) -> Result<Vec<R>, DaoError> {
        crate::projection::select_list_model_with(self.executor.as_ref(), &self.ctx, query)
    }

    /// [`select_page`](Self::select_page) decoded into a projection type
    pub fn select_page_as<R: FromRow>(
        &self,
        page: &mut Page<R>,
        query: &Query<T>,
    ) -> Result<(), DaoError> {
        crate::projection::select_page_model_with(self.executor.as_ref(), &self.ctx, page, query)
    }
}

pub(crate) fn decode<R: FromRow>(row: &Row) -> Result<R, DaoError> {
    R::from_row(row).map_err(|e| DaoError::Parse(format!("Failed to parse row: {e}")))
}

fn log_statement(ctx: &ExecContext, rendered: &Rendered) {
    log::debug!(
        "[{}] {} ({} params)",
        ctx.label().unwrap_or("-"),
        rendered.sql,
        rendered.values.len()
    );
}

pub(crate) fn run_execute(
    executor: &dyn DaoExecutor,
    ctx: &ExecContext,
    rendered: &Rendered,
) -> Result<u64, DaoError> {
    log_statement(ctx, rendered);
    with_converted_params(&rendered.values, |params| {
        executor.execute(&rendered.sql, params)
    })
}

pub(crate) fn run_fetch(
    executor: &dyn DaoExecutor,
    ctx: &ExecContext,
    rendered: &Rendered,
) -> Result<Vec<Row>, DaoError> {
    log_statement(ctx, rendered);
    with_converted_params(&rendered.values, |params| {
        executor.query_all(&rendered.sql, params)
    })
}

pub(crate) fn run_count<T: Record>(
    executor: &dyn DaoExecutor,
    ctx: &ExecContext,
    query: &Query<T>,
) -> Result<i64, DaoError> {
    let rows = run_fetch(executor, ctx, &statement::count(query)?)?;
    match rows.first() {
        Some(row) => row
            .try_get::<_, i64>(0)
            .map_err(|e| DaoError::Parse(format!("Failed to read count: {e}"))),
        None => Ok(0),
    }
}
