//! Shared fixtures for integration tests

#![allow(dead_code)]

use daoguard::{DaoError, DaoExecutor, Record, Row};
use may_postgres::types::ToSql;
use std::sync::{Arc, Mutex};

#[derive(Record, Debug, Clone, PartialEq)]
#[table_name = "products"]
pub struct Product {
    #[primary_key]
    #[auto_increment]
    pub id: i64,
    pub code: String,
    pub price: i32,
    pub note: Option<String>,
}

impl Product {
    pub fn new(code: &str, price: i32) -> Self {
        Self {
            id: 0,
            code: code.to_string(),
            price,
            note: None,
        }
    }
}

/// Captures statements; never returns rows
#[derive(Default)]
pub struct RecordingExecutor {
    statements: Mutex<Vec<(String, usize)>>,
}

impl RecordingExecutor {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn statements(&self) -> Vec<(String, usize)> {
        self.statements.lock().unwrap().clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements().into_iter().map(|(sql, _)| sql).collect()
    }

    fn record(&self, query: &str, params: &[&dyn ToSql]) {
        self.statements
            .lock()
            .unwrap()
            .push((query.to_string(), params.len()));
    }
}

impl DaoExecutor for RecordingExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DaoError> {
        self.record(query, params);
        Ok(1)
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DaoError> {
        self.record(query, params);
        Err(DaoError::Query("RecordingExecutor returns no rows".to_string()))
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DaoError> {
        self.record(query, params);
        Ok(vec![])
    }
}

/// Placeholders in rendered SQL
pub fn dollar_count(sql: &str) -> usize {
    sql.matches('$').count()
}
