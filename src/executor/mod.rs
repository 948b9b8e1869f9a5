//! # Query Execution
//!
//! The seam between the engine and the database. An executor receives a
//! [`PreparedQuery`] and produces a [`QueryResult`] matching its result shape;
//! how statements run and how rows become values is up to the implementation.

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PgQueryExecutor;

use crate::engine::PreparedQuery;
use crate::error::{NativeQueryError, Result};
use crate::pagination::Page;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &PreparedQuery) -> Result<QueryResult>;
}

/// Rows produced by one execution, shaped by the operation's result shape
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Rows affected by a statement without a result
    Updated(u64),
    Single(Value),
    Optional(Option<Value>),
    List(Vec<Value>),
    Page(Page<Value>),
}

impl QueryResult {
    pub fn rows_affected(&self) -> Option<u64> {
        match self {
            QueryResult::Updated(rows) => Some(*rows),
            _ => None,
        }
    }

    pub fn into_single<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            QueryResult::Single(value) => from_row(value),
            other => Err(unexpected("a single row", &other)),
        }
    }

    pub fn into_optional<T: DeserializeOwned>(self) -> Result<Option<T>> {
        match self {
            QueryResult::Optional(value) => value.map(from_row).transpose(),
            other => Err(unexpected("an optional row", &other)),
        }
    }

    pub fn into_list<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        match self {
            QueryResult::List(rows) => rows.into_iter().map(from_row).collect(),
            other => Err(unexpected("a list of rows", &other)),
        }
    }

    pub fn into_page<T: DeserializeOwned>(self) -> Result<Page<T>> {
        match self {
            QueryResult::Page(page) => page.try_map(from_row),
            other => Err(unexpected("a page of rows", &other)),
        }
    }

    fn variant(&self) -> &'static str {
        match self {
            QueryResult::Updated(_) => "Updated",
            QueryResult::Single(_) => "Single",
            QueryResult::Optional(_) => "Optional",
            QueryResult::List(_) => "List",
            QueryResult::Page(_) => "Page",
        }
    }
}

fn from_row<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| NativeQueryError::execution(format!("failed to map row: {e}")))
}

fn unexpected(expected: &str, actual: &QueryResult) -> NativeQueryError {
    NativeQueryError::execution(format!(
        "expected {expected}, executor returned {}",
        actual.variant()
    ))
}
