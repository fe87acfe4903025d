//! Condition builder for `BaseDao` operations.
//!
//! [`Query<T>`] accumulates predicates, bracketed groups, ordering, grouping,
//! having, projection and update assignments for record type `T`. Every method
//! consumes the builder and returns it, so a query is owned by exactly one call
//! site while it is being built.
//!
//! Predicates are kept as SQL text with `?` placeholders and a positionally
//! aligned argument list. [`Query::finalize`] merges AND-brackets and then
//! OR-brackets into a fresh [`Condition`] without touching the builder.

use super::condition::Condition;
use crate::schema::IntoColumn;
use sea_query::Value;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Connector {
    #[default]
    And,
    Or,
}

impl Connector {
    fn as_str(self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// One ORDER BY entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub column: String,
    pub ascending: bool,
}

/// Condition builder for record type `T`
///
/// ```
/// use daoguard::Query;
///
/// # struct User;
/// let q = Query::<User>::new()
///     .eq("code", "D42")
///     .gt("price", 100)
///     .or()
///     .is_null("deleted_at")
///     .order_by_desc("price");
///
/// let cond = q.finalize();
/// assert_eq!(cond.sql, "code = ? AND price > ? OR deleted_at IS NULL");
/// assert_eq!(cond.values.len(), 2);
/// ```
pub struct Query<T> {
    predicate: Condition,
    connector: Connector,
    and_brackets: Vec<Condition>,
    or_brackets: Vec<Condition>,
    order: Vec<OrderItem>,
    group: Vec<String>,
    having: Condition,
    select_columns: Vec<String>,
    distinct_columns: Vec<String>,
    updates: Vec<(String, Value)>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            connector: self.connector,
            and_brackets: self.and_brackets.clone(),
            or_brackets: self.or_brackets.clone(),
            order: self.order.clone(),
            group: self.group.clone(),
            having: self.having.clone(),
            select_columns: self.select_columns.clone(),
            distinct_columns: self.distinct_columns.clone(),
            updates: self.updates.clone(),
            _record: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("predicate", &self.predicate)
            .field("and_brackets", &self.and_brackets)
            .field("or_brackets", &self.or_brackets)
            .field("order", &self.order)
            .field("group", &self.group)
            .field("having", &self.having)
            .field("select_columns", &self.select_columns)
            .field("distinct_columns", &self.distinct_columns)
            .field("updates", &self.updates)
            .finish()
    }
}

impl<T> Query<T> {
    pub fn new() -> Self {
        Self {
            predicate: Condition::default(),
            connector: Connector::And,
            and_brackets: Vec::new(),
            or_brackets: Vec::new(),
            order: Vec::new(),
            group: Vec::new(),
            having: Condition::default(),
            select_columns: Vec::new(),
            distinct_columns: Vec::new(),
            updates: Vec::new(),
            _record: PhantomData,
        }
    }

    fn push_predicate(mut self, fragment: String, values: Vec<Value>) -> Self {
        let connector = std::mem::take(&mut self.connector);
        self.predicate
            .push(connector.as_str(), &Condition::new(fragment, values));
        self
    }

    fn compare<C: IntoColumn<T>>(self, column: C, op: &str, value: Value) -> Self {
        let fragment = format!("{} {op} ?", column.into_column());
        self.push_predicate(fragment, vec![value])
    }

    fn membership<C, V, I>(self, column: C, op: &str, values: I) -> Self
    where
        C: IntoColumn<T>,
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let list = if values.is_empty() {
            "NULL".to_string()
        } else {
            vec!["?"; values.len()].join(", ")
        };
        let fragment = format!("{} {op} ({list})", column.into_column());
        self.push_predicate(fragment, values)
    }

    fn range<C, V>(self, column: C, op: &str, start: V, end: V) -> Self
    where
        C: IntoColumn<T>,
        V: Into<Value>,
    {
        let fragment = format!("{} {op} ? AND ?", column.into_column());
        self.push_predicate(fragment, vec![start.into(), end.into()])
    }

    /// `column = ?`
    pub fn eq<C: IntoColumn<T>, V: Into<Value>>(self, column: C, value: V) -> Self {
        self.compare(column, "=", value.into())
    }

    /// `column <> ?`
    pub fn ne<C: IntoColumn<T>, V: Into<Value>>(self, column: C, value: V) -> Self {
        self.compare(column, "<>", value.into())
    }

    /// `column > ?`
    pub fn gt<C: IntoColumn<T>, V: Into<Value>>(self, column: C, value: V) -> Self {
        self.compare(column, ">", value.into())
    }

    /// `column >= ?`
    pub fn ge<C: IntoColumn<T>, V: Into<Value>>(self, column: C, value: V) -> Self {
        self.compare(column, ">=", value.into())
    }

    /// `column < ?`
    pub fn lt<C: IntoColumn<T>, V: Into<Value>>(self, column: C, value: V) -> Self {
        self.compare(column, "<", value.into())
    }

    /// `column <= ?`
    pub fn le<C: IntoColumn<T>, V: Into<Value>>(self, column: C, value: V) -> Self {
        self.compare(column, "<=", value.into())
    }

    /// `column LIKE ?` bound to `%pattern%`
    pub fn like<C: IntoColumn<T>>(self, column: C, pattern: &str) -> Self {
        self.compare(column, "LIKE", format!("%{pattern}%").into())
    }

    /// `column NOT LIKE ?` bound to `%pattern%`
    pub fn not_like<C: IntoColumn<T>>(self, column: C, pattern: &str) -> Self {
        self.compare(column, "NOT LIKE", format!("%{pattern}%").into())
    }

    /// `column LIKE ?` bound to `%pattern` (ends with)
    pub fn like_left<C: IntoColumn<T>>(self, column: C, pattern: &str) -> Self {
        self.compare(column, "LIKE", format!("%{pattern}").into())
    }

    /// `column LIKE ?` bound to `pattern%` (starts with)
    pub fn like_right<C: IntoColumn<T>>(self, column: C, pattern: &str) -> Self {
        self.compare(column, "LIKE", format!("{pattern}%").into())
    }

    /// `column IN (?, ?, ..)`, one placeholder per value; an empty list matches nothing
    pub fn is_in<C, V, I>(self, column: C, values: I) -> Self
    where
        C: IntoColumn<T>,
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        self.membership(column, "IN", values)
    }

    /// `column NOT IN (?, ?, ..)`
    pub fn not_in<C, V, I>(self, column: C, values: I) -> Self
    where
        C: IntoColumn<T>,
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        self.membership(column, "NOT IN", values)
    }

    pub fn is_null<C: IntoColumn<T>>(self, column: C) -> Self {
        let fragment = format!("{} IS NULL", column.into_column());
        self.push_predicate(fragment, Vec::new())
    }

    pub fn is_not_null<C: IntoColumn<T>>(self, column: C) -> Self {
        let fragment = format!("{} IS NOT NULL", column.into_column());
        self.push_predicate(fragment, Vec::new())
    }

    /// `column BETWEEN ? AND ?`
    pub fn between<C: IntoColumn<T>, V: Into<Value>>(self, column: C, start: V, end: V) -> Self {
        self.range(column, "BETWEEN", start, end)
    }

    /// `column NOT BETWEEN ? AND ?`
    pub fn not_between<C: IntoColumn<T>, V: Into<Value>>(self, column: C, start: V, end: V) -> Self {
        self.range(column, "NOT BETWEEN", start, end)
    }

    /// Join the next predicate with `OR` instead of `AND`
    pub fn or(mut self) -> Self {
        self.connector = Connector::Or;
        self
    }

    /// Add `AND (<sub-query>)`, merged after the plain predicates
    pub fn and_bracket<F>(mut self, build: F) -> Self
    where
        F: FnOnce(Query<T>) -> Query<T>,
    {
        if let Some(group) = Self::bracket(build) {
            self.and_brackets.push(group);
        }
        self
    }

    /// Add `OR (<sub-query>)`, merged after every AND-bracket
    pub fn or_bracket<F>(mut self, build: F) -> Self
    where
        F: FnOnce(Query<T>) -> Query<T>,
    {
        if let Some(group) = Self::bracket(build) {
            self.or_brackets.push(group);
        }
        self
    }

    fn bracket<F>(build: F) -> Option<Condition>
    where
        F: FnOnce(Query<T>) -> Query<T>,
    {
        let inner = build(Query::new()).finalize();
        if inner.is_empty() {
            None
        } else {
            Some(Condition::new(format!("({})", inner.sql), inner.values))
        }
    }

    /// Restrict the projection to `columns` (default is every column)
    pub fn select<C, I>(mut self, columns: I) -> Self
    where
        C: IntoColumn<T>,
        I: IntoIterator<Item = C>,
    {
        self.select_columns
            .extend(columns.into_iter().map(IntoColumn::into_column));
        self
    }

    /// `SELECT DISTINCT columns`
    pub fn distinct<C, I>(mut self, columns: I) -> Self
    where
        C: IntoColumn<T>,
        I: IntoIterator<Item = C>,
    {
        self.distinct_columns
            .extend(columns.into_iter().map(IntoColumn::into_column));
        self
    }

    pub fn order_by<C: IntoColumn<T>>(mut self, column: C, ascending: bool) -> Self {
        self.order.push(OrderItem {
            column: column.into_column(),
            ascending,
        });
        self
    }

    pub fn order_by_asc<C: IntoColumn<T>>(self, column: C) -> Self {
        self.order_by(column, true)
    }

    pub fn order_by_desc<C: IntoColumn<T>>(self, column: C) -> Self {
        self.order_by(column, false)
    }

    pub fn group_by<C, I>(mut self, columns: I) -> Self
    where
        C: IntoColumn<T>,
        I: IntoIterator<Item = C>,
    {
        self.group
            .extend(columns.into_iter().map(IntoColumn::into_column));
        self
    }

    /// Raw HAVING fragment with its own `?` arguments; repeated calls are ANDed
    pub fn having<V, I>(mut self, fragment: &str, args: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let values = args.into_iter().map(Into::into).collect();
        self.having.push("AND", &Condition::new(fragment, values));
        self
    }

    /// Assignment for `BaseDao::update`; setting a column twice keeps the last value
    pub fn set<C: IntoColumn<T>, V: Into<Value>>(mut self, column: C, value: V) -> Self {
        let column = column.into_column();
        let value = value.into();
        match self.updates.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.updates.push((column, value)),
        }
        self
    }

    /// Snapshot of the WHERE condition: predicates, then AND-brackets, then OR-brackets
    ///
    /// Never mutates the builder; finalizing twice yields identical output.
    pub fn finalize(&self) -> Condition {
        let mut condition = self.predicate.clone();
        for group in &self.and_brackets {
            condition.push(Connector::And.as_str(), group);
        }
        for group in &self.or_brackets {
            condition.push(Connector::Or.as_str(), group);
        }
        condition
    }

    /// True when the finalized condition would restrict nothing
    pub fn is_empty(&self) -> bool {
        self.predicate.is_empty() && self.and_brackets.is_empty() && self.or_brackets.is_empty()
    }

    pub fn select_columns(&self) -> &[String] {
        &self.select_columns
    }

    pub fn distinct_columns(&self) -> &[String] {
        &self.distinct_columns
    }

    pub fn order(&self) -> &[OrderItem] {
        &self.order
    }

    /// `a ASC, b DESC`
    pub fn order_clause(&self) -> String {
        self.order
            .iter()
            .map(|item| {
                format!(
                    "{} {}",
                    item.column,
                    if item.ascending { "ASC" } else { "DESC" }
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn group_columns(&self) -> &[String] {
        &self.group
    }

    pub fn having_condition(&self) -> &Condition {
        &self.having
    }

    pub fn updates(&self) -> &[(String, Value)] {
        &self.updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::condition::count_placeholders;
    use crate::schema::{Field, FieldDef, FromRow, Record};

    struct Product;

    impl FromRow for Product {
        fn from_row(_row: &may_postgres::Row) -> Result<Self, may_postgres::Error> {
            Ok(Product)
        }
    }

    impl Record for Product {
        const TABLE: &'static str = "products";

        fn fields() -> &'static [FieldDef] {
            const FIELDS: &[FieldDef] = &[
                FieldDef::new("id").primary_key(),
                FieldDef::new("code"),
                FieldDef::new("unitPrice").column("price"),
            ];
            FIELDS
        }

        fn values(&self) -> Vec<Value> {
            vec![]
        }
    }

    const CODE: Field<Product> = Field::new("code");
    const PRICE: Field<Product> = Field::new("unitPrice");

    fn q() -> Query<Product> {
        Query::new()
    }

    #[test]
    fn test_eq_chain_joins_with_and() {
        let cond = q().eq("a", 1).eq("b", 2).finalize();
        assert_eq!(cond.sql, "a = ? AND b = ?");
        assert_eq!(cond.values, vec![Value::from(1), Value::from(2)]);
    }

    #[test]
    fn test_or_changes_only_next_connector() {
        let cond = q().eq("a", 1).eq("b", 2).or().eq("c", 3).eq("d", 4).finalize();
        assert_eq!(cond.sql, "a = ? AND b = ? OR c = ? AND d = ?");
        assert_eq!(cond.values.len(), 4);
    }

    #[test]
    fn test_leading_or_is_ignored() {
        let cond = q().or().eq("a", 1).finalize();
        assert_eq!(cond.sql, "a = ?");
    }

    #[test]
    fn test_comparison_family() {
        let cond = q()
            .ne("a", 1)
            .gt("b", 2)
            .ge("c", 3)
            .lt("d", 4)
            .le("e", 5)
            .finalize();
        assert_eq!(cond.sql, "a <> ? AND b > ? AND c >= ? AND d < ? AND e <= ?");
        assert_eq!(cond.values.len(), 5);
    }

    #[test]
    fn test_like_family_wraps_pattern() {
        let cond = q()
            .like("name", "ann")
            .not_like("name", "bob")
            .like_left("mail", "@x.io")
            .like_right("code", "D4")
            .finalize();
        assert_eq!(
            cond.sql,
            "name LIKE ? AND name NOT LIKE ? AND mail LIKE ? AND code LIKE ?"
        );
        assert_eq!(
            cond.values,
            vec![
                Value::from("%ann%"),
                Value::from("%bob%"),
                Value::from("%@x.io"),
                Value::from("D4%"),
            ]
        );
    }

    #[test]
    fn test_in_expands_one_placeholder_per_value() {
        let cond = q().is_in("id", vec![4, 5, 6]).not_in("code", ["x", "y"]).finalize();
        assert_eq!(cond.sql, "id IN (?, ?, ?) AND code NOT IN (?, ?)");
        assert_eq!(cond.values.len(), 5);
    }

    #[test]
    fn test_empty_in_binds_nothing() {
        let cond = q().is_in("id", Vec::<i64>::new()).finalize();
        assert_eq!(cond.sql, "id IN (NULL)");
        assert!(cond.values.is_empty());
    }

    #[test]
    fn test_null_checks_bind_nothing() {
        let cond = q().is_null("deleted_at").is_not_null("code").finalize();
        assert_eq!(cond.sql, "deleted_at IS NULL AND code IS NOT NULL");
        assert!(cond.values.is_empty());
    }

    #[test]
    fn test_between() {
        let cond = q().between("price", 10, 20).not_between("id", 1, 2).finalize();
        assert_eq!(cond.sql, "price BETWEEN ? AND ? AND id NOT BETWEEN ? AND ?");
        assert_eq!(cond.values.len(), 4);
    }

    #[test]
    fn test_field_reference_matches_string_column() {
        let by_field = q().eq(CODE, "D42").gt(PRICE, 100).finalize();
        let by_name = q().eq("code", "D42").gt("price", 100).finalize();
        assert_eq!(by_field, by_name);
        assert_eq!(by_field.sql, "code = ? AND price > ?");
    }

    #[test]
    fn test_and_bracket_precedes_or_bracket_regardless_of_call_order() {
        let cond = q()
            .eq("a", 1)
            .or_bracket(|b| b.eq("c", 3).eq("d", 4))
            .and_bracket(|b| b.eq("e", 5).or().eq("f", 6))
            .finalize();
        assert_eq!(cond.sql, "a = ? AND (e = ? OR f = ?) OR (c = ? AND d = ?)");
        assert_eq!(
            cond.values,
            vec![
                Value::from(1),
                Value::from(5),
                Value::from(6),
                Value::from(3),
                Value::from(4),
            ]
        );
    }

    #[test]
    fn test_bracket_only_query() {
        let cond = q().and_bracket(|b| b.eq("a", 1).or().eq("b", 2)).finalize();
        assert_eq!(cond.sql, "(a = ? OR b = ?)");
    }

    #[test]
    fn test_empty_bracket_is_ignored() {
        let query = q().eq("a", 1).and_bracket(|b| b).or_bracket(|b| b.order_by_asc("x"));
        assert_eq!(query.finalize().sql, "a = ?");
    }

    #[test]
    fn test_nested_brackets() {
        let cond = q()
            .eq("a", 1)
            .and_bracket(|b| b.eq("b", 2).or_bracket(|c| c.eq("c", 3)))
            .finalize();
        assert_eq!(cond.sql, "a = ? AND (b = ? OR (c = ?))");
        assert_eq!(cond.values.len(), 3);
    }

    #[test]
    fn test_finalize_twice_is_identical() {
        let query = q()
            .eq("a", 1)
            .and_bracket(|b| b.eq("b", 2))
            .or_bracket(|b| b.eq("c", 3));
        let first = query.finalize();
        let second = query.finalize();
        assert_eq!(first, second);
        assert_eq!(first.values.len(), 3);
    }

    #[test]
    fn test_empty_builder_finalizes_to_empty_condition() {
        let query = q().order_by_desc("id").select(["id"]);
        assert!(query.is_empty());
        let cond = query.finalize();
        assert!(cond.is_empty());
        assert!(cond.values.is_empty());
    }

    #[test]
    fn test_placeholders_match_arguments() {
        let queries = vec![
            q().eq("a", 1),
            q().is_in("a", vec![1, 2, 3]).or().like("b", "x"),
            q().between("a", 1, 9).is_null("b").and_bracket(|b| b.ne("c", 1).or().is_in("d", [1, 2])),
            q().or_bracket(|b| b.gt("a", 1)).and_bracket(|b| b.lt("b", 2)).not_in("c", Vec::<i32>::new()),
        ];
        for query in queries {
            let cond = query.finalize();
            assert_eq!(
                count_placeholders(&cond.sql),
                cond.values.len(),
                "misaligned: {}",
                cond.sql
            );
        }
    }

    #[test]
    fn test_shaping_accessors() {
        let query = q()
            .select(["id", "code"])
            .distinct([CODE])
            .order_by_desc(PRICE)
            .order_by("id", true)
            .group_by(["code"])
            .having("COUNT(*) > ?", [1])
            .having("SUM(price) < ?", [500]);
        assert_eq!(query.select_columns(), ["id", "code"]);
        assert_eq!(query.distinct_columns(), ["code"]);
        assert_eq!(query.order_clause(), "price DESC, id ASC");
        assert_eq!(query.group_columns(), ["code"]);
        assert_eq!(query.having_condition().sql, "COUNT(*) > ? AND SUM(price) < ?");
        assert_eq!(query.having_condition().values.len(), 2);
    }

    #[test]
    fn test_set_keeps_keys_unique() {
        let query = q().set("price", 100).set("code", "x").set(PRICE, 200);
        let updates = query.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0], ("price".to_string(), Value::from(200)));
        assert_eq!(updates[1].0, "code");
    }
}
