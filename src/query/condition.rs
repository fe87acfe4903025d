//! Finalized predicate text plus its aligned arguments.

use sea_query::Value;

/// Placeholder used in builder text; rendered as `$n` for PostgreSQL
pub const PLACEHOLDER: char = '?';

/// SQL fragment with `?` placeholders and the values bound to them, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    pub sql: String,
    pub values: Vec<Value>,
}

impl Condition {
    pub fn new(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }

    /// An empty condition restricts nothing
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }

    /// `sql` with each `?` rewritten to `$1..$n` for sea-query's PostgreSQL custom expressions
    ///
    /// A bare `$` outside quotes is doubled so it stays literal.
    pub(crate) fn numbered_sql(&self) -> String {
        let mut out = String::with_capacity(self.sql.len() + 8);
        let mut quote: Option<char> = None;
        let mut index = 0;
        let mut chars = self.sql.chars().peekable();
        while let Some(c) = chars.next() {
            match (quote, c) {
                (Some(q), _) if c == q => {
                    quote = None;
                    out.push(c);
                }
                (Some(_), _) => out.push(c),
                (None, '\'' | '"') => {
                    quote = Some(c);
                    out.push(c);
                }
                (None, PLACEHOLDER) => {
                    index += 1;
                    out.push('$');
                    out.push_str(&index.to_string());
                    if chars.peek().is_some_and(|n| n.is_alphanumeric() || *n == '_') {
                        out.push(' ');
                    }
                }
                (None, '$') => out.push_str("$$"),
                (None, _) => out.push(c),
            }
        }
        out
    }

    /// Append `other` joined by `connector`, or take it as-is when `self` is empty
    pub(crate) fn push(&mut self, connector: &str, other: &Condition) {
        if other.is_empty() {
            return;
        }
        if !self.sql.is_empty() {
            self.sql.push(' ');
            self.sql.push_str(connector);
            self.sql.push(' ');
        }
        self.sql.push_str(&other.sql);
        self.values.extend(other.values.iter().cloned());
    }
}

/// Count `?` placeholders outside quoted literals and identifiers
pub fn count_placeholders(sql: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut count = 0;
    for c in sql.chars() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, PLACEHOLDER) => count += 1,
            _ => {}
        }
    }
    count
}
