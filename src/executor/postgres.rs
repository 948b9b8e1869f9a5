//! PostgreSQL executor backed by a sqlx pool.
//!
//! Rows are read as JSON through `row_to_json`, so any projection can be
//! mapped with serde on the caller side. Named markers are rewritten into
//! positional placeholders before the statement is sent.

use super::{QueryExecutor, QueryResult};
use crate::engine::PreparedQuery;
use crate::error::{NativeQueryError, Result};
use crate::pagination::{Page, PageRequest};
use crate::shape::{ElementKind, ResultShape};
use crate::sql::{to_positional, PositionalSql};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::types::Json;
use sqlx::{Arguments, PgPool, Postgres};
use tracing::{debug, instrument};

/// Runs rendered queries against a Postgres pool.
///
/// Parameters bind by JSON kind: `null` as a text-typed `NULL` (write
/// `:id::bigint` where the column needs another type), booleans as `bool`,
/// integers as `BIGINT`, other numbers as `DOUBLE PRECISION`, strings as
/// `TEXT` and arrays or objects as `JSONB`. Unsigned integers beyond
/// `i64::MAX` are rejected instead of losing precision.
#[derive(Debug, Clone)]
pub struct PgQueryExecutor {
    pool: PgPool,
}

impl PgQueryExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_rows(&self, query: &PreparedQuery, sql: &str) -> Result<Vec<Value>> {
        let positional = to_positional(sql, &query.parameters)?;
        let wrapped = format!("SELECT row_to_json(nq_row) FROM ({}) nq_row", positional.sql);
        debug!(sql = %wrapped, values = positional.values.len(), "Fetching rows");

        let rows: Vec<Value> =
            sqlx::query_scalar_with::<Postgres, Value, _>(&wrapped, arguments(&positional)?)
                .fetch_all(&self.pool)
                .await?;

        Ok(match query.element_kind {
            ElementKind::Scalar => rows.into_iter().map(first_column).collect(),
            ElementKind::Structured => rows,
        })
    }

    async fn count(&self, query: &PreparedQuery) -> Result<u64> {
        let count_sql = query
            .count_sql
            .as_deref()
            .ok_or_else(|| NativeQueryError::execution("paged query without a count statement"))?;
        let positional = to_positional(count_sql, &query.parameters)?;

        let total: i64 =
            sqlx::query_scalar_with::<Postgres, i64, _>(&positional.sql, arguments(&positional)?)
                .fetch_one(&self.pool)
                .await?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn fetch_page(&self, query: &PreparedQuery) -> Result<Page<Value>> {
        let total = self.count(query).await?;
        match &query.page {
            Some(request) => {
                let sql = format!("{}{}", query.sql, request.to_sql());
                let rows = self.fetch_rows(query, &sql).await?;
                Ok(Page::new(rows, request.clone(), total))
            }
            None => {
                let rows = self.fetch_rows(query, &query.sql).await?;
                let size = u32::try_from(rows.len().max(1)).unwrap_or(u32::MAX);
                Ok(Page::new(rows, PageRequest::new(0, size), total))
            }
        }
    }
}

#[async_trait]
impl QueryExecutor for PgQueryExecutor {
    #[instrument(skip(self, query), fields(key = %query.key))]
    async fn execute(&self, query: &PreparedQuery) -> Result<QueryResult> {
        if query.execution.uses_alternate_executor() && query.result_shape == ResultShape::Page {
            return Err(NativeQueryError::execution(
                "paged results are not supported by the direct executor",
            ));
        }

        match query.result_shape {
            ResultShape::Void => {
                let positional = to_positional(&query.sql, &query.parameters)?;
                let result =
                    sqlx::query_with::<Postgres, _>(&positional.sql, arguments(&positional)?)
                        .execute(&self.pool)
                        .await?;
                Ok(QueryResult::Updated(result.rows_affected()))
            }
            ResultShape::Single => {
                let row = self.fetch_rows(query, &query.sql).await?.into_iter().next();
                row.map(QueryResult::Single).ok_or_else(|| {
                    NativeQueryError::execution(format!("{} returned no rows", query.key))
                })
            }
            ResultShape::Optional => {
                let row = self.fetch_rows(query, &query.sql).await?.into_iter().next();
                Ok(QueryResult::Optional(row))
            }
            ResultShape::List => Ok(QueryResult::List(self.fetch_rows(query, &query.sql).await?)),
            ResultShape::Page => Ok(QueryResult::Page(self.fetch_page(query).await?)),
        }
    }
}

fn arguments(positional: &PositionalSql) -> Result<PgArguments> {
    let mut args = PgArguments::default();
    for value in &positional.values {
        let added = match value {
            Value::Null => args.add(Option::<String>::None),
            Value::Bool(b) => args.add(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => args.add(i),
                None if n.is_u64() => {
                    return Err(NativeQueryError::execution(format!(
                        "integer parameter {n} exceeds the BIGINT range"
                    )));
                }
                None => args.add(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => args.add(s.clone()),
            other => args.add(Json(other.clone())),
        };
        added.map_err(|e| NativeQueryError::execution(format!("failed to bind parameter: {e}")))?;
    }
    Ok(args)
}

fn first_column(row: Value) -> Value {
    match row {
        Value::Object(map) => map.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null),
        other => other,
    }
}
