//! Shared fixtures for integration tests: filter types, an instrumented
//! resource loader and a recording executor.

#![allow(dead_code)]

pub mod strategies;

use async_trait::async_trait;
use native_query::config::NativeQueryConfig;
use native_query::declaration::ParamDecl;
use native_query::engine::{PreparedQuery, QueryEngine};
use native_query::executor::{QueryExecutor, QueryResult};
use native_query::filter::{AccessError, FieldValue, Filter, FilterSchema, MemberDecl};
use native_query::locator::{FsResourceLoader, ResourceLoader};
use native_query::pagination::{Page, PageRequest};
use native_query::shape::ResultShape;
use native_query::transform::Operator;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct Address {
    pub city: Option<String>,
    pub zip: Option<String>,
}

impl Filter for Address {
    fn schema() -> FilterSchema {
        FilterSchema::of::<Self>()
            .field(MemberDecl::new("city").param(ParamDecl::new("city").operator(Operator::StartsWith)))
            .field(MemberDecl::new("zip"))
    }

    fn read(&self, accessor: &str) -> Result<FieldValue<'_>, AccessError> {
        match accessor {
            "city" => Ok(json!(self.city).into()),
            "zip" => Ok(json!(self.zip).into()),
            other => Err(AccessError::unknown::<Self>(other)),
        }
    }
}

pub struct UserFilter {
    pub name: Option<String>,
    pub active: Option<bool>,
    pub address: Option<Address>,
}

impl Filter for UserFilter {
    fn schema() -> FilterSchema {
        FilterSchema::of::<Self>()
            .field(MemberDecl::new("name").param(ParamDecl::new("name").operator(Operator::Containing)))
            .field(MemberDecl::new("active"))
            .field(
                MemberDecl::new("address")
                    .param(ParamDecl::new("address").flatten())
                    .nested::<Address>(),
            )
    }

    fn read(&self, accessor: &str) -> Result<FieldValue<'_>, AccessError> {
        match accessor {
            "name" => Ok(json!(self.name).into()),
            "active" => Ok(json!(self.active).into()),
            "address" => Ok(FieldValue::nested_opt(self.address.as_ref())),
            other => Err(AccessError::unknown::<Self>(other)),
        }
    }
}

/// Filesystem loader counting every existence check and read
#[derive(Debug)]
pub struct CountingLoader {
    inner: FsResourceLoader,
    pub lookups: AtomicUsize,
    pub loads: AtomicUsize,
}

impl CountingLoader {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            inner: FsResourceLoader::new(base_dir),
            lookups: AtomicUsize::new(0),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ResourceLoader for CountingLoader {
    fn exists(&self, path: &str) -> bool {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(path)
    }

    fn load(&self, path: &str) -> io::Result<String> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(path)
    }
}

/// Write a template under `<base>/nativeQuery/<relative>`
pub fn write_template(base: &Path, relative: &str, sql: &str) {
    let path = base.join("nativeQuery").join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, sql).unwrap();
}

pub fn engine_with_loader(loader: Arc<dyn ResourceLoader>) -> QueryEngine {
    QueryEngine::builder(NativeQueryConfig::default())
        .resource_loader(loader)
        .build()
        .unwrap()
}

/// Executor that records prepared queries and answers with canned rows
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub rows: Vec<Value>,
    pub total: u64,
    pub executed: Mutex<Vec<PreparedQuery>>,
}

impl RecordingExecutor {
    pub fn with_rows(rows: Vec<Value>, total: u64) -> Self {
        Self {
            rows,
            total,
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn last(&self) -> Option<PreparedQuery> {
        self.executed.lock().last().cloned()
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    async fn execute(&self, query: &PreparedQuery) -> native_query::Result<QueryResult> {
        self.executed.lock().push(query.clone());

        Ok(match query.result_shape {
            ResultShape::Void => QueryResult::Updated(self.rows.len() as u64),
            ResultShape::Single => QueryResult::Single(self.rows.first().cloned().unwrap_or(Value::Null)),
            ResultShape::Optional => QueryResult::Optional(self.rows.first().cloned()),
            ResultShape::List => QueryResult::List(self.rows.clone()),
            ResultShape::Page => {
                let request = query
                    .page
                    .clone()
                    .unwrap_or_else(|| PageRequest::new(0, self.rows.len().max(1) as u32));
                QueryResult::Page(Page::new(self.rows.clone(), request, self.total))
            }
        })
    }
}
