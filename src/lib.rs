#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Native Query
//!
//! Declarative native SQL operations rendered from external templates.
//!
//! ## Overview
//!
//! A query operation is declared once (template location, argument
//! declarations, return type) and invoked many times. Each invocation is
//! resolved into final SQL text plus the named parameters it references, and
//! handed to an executor together with the expected result shape.
//!
//! ## Architecture
//!
//! - **Descriptor cache**: static facts per operation signature, derived once
//!   and shared immutably across threads
//! - **Parameter binder**: fresh per call; flattens filter objects, expands
//!   maps and applies operator transforms
//! - **Rendering pipeline**: template, custom processors, `${key}`
//!   replacements, `ORDER BY`, tenant schema placeholder
//! - **Result shape classifier**: void, single, optional, list or page, with
//!   scalar or structured elements
//!
//! ## Module Organization
//!
//! - [`declaration`] - Operation and argument declarations
//! - [`filter`] - Filter objects and their cached accessor metadata
//! - [`descriptor`] - Immutable query descriptors and their cache
//! - [`binding`] - Per-invocation parameter binding
//! - [`render`] - Template engine, processors and tenant substitution
//! - [`engine`] - The engine façade tying everything together
//! - [`executor`] - Execution seam and the PostgreSQL executor
//! - [`config`] - Configuration loading
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use native_query::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! let config = NativeQueryConfig::load(None)?;
//! let engine = QueryEngine::builder(config)
//!     .resource_loader(Arc::new(FsResourceLoader::new("resources")))
//!     .build()?;
//! let executor = PgQueryExecutor::new(pool);
//!
//! let find_by_name = QueryOperation::new("UserRepository", "findByNameContaining")
//!     .folder("user")
//!     .argument(
//!         ArgumentDecl::plain::<String>("name")
//!             .with_param(ParamDecl::new("name").operator(Operator::Containing)),
//!     )
//!     .argument(ArgumentDecl::page("pageable"))
//!     .returns(ReturnType::of::<Page<String>>());
//!
//! let page: Page<String> = engine
//!     .execute(
//!         &executor,
//!         &find_by_name,
//!         &[json!("al").into(), PageRequest::new(0, 10).into()],
//!     )
//!     .await?
//!     .into_page()?;
//! println!("{} users", page.total_elements);
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod config;
pub mod constants;
pub mod declaration;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod executor;
pub mod filter;
pub mod locator;
pub mod logging;
pub mod pagination;
pub mod render;
pub mod shape;
pub mod sql;
pub mod transform;
pub mod utils;

pub use binding::{Argument, Parameter, ParameterBinding};
pub use config::NativeQueryConfig;
pub use descriptor::{QueryDescriptor, QueryKey};
pub use engine::{PreparedQuery, QueryEngine};
pub use error::{NativeQueryError, Result};
pub use executor::{QueryExecutor, QueryResult};
pub use shape::{ElementKind, ResultShape};

/// Common imports for declaring and running operations
pub mod prelude {
    pub use crate::binding::Argument;
    pub use crate::config::NativeQueryConfig;
    pub use crate::declaration::{ArgumentDecl, ParamDecl, QueryOperation};
    pub use crate::engine::{PreparedQuery, QueryEngine};
    #[cfg(feature = "postgres")]
    pub use crate::executor::PgQueryExecutor;
    pub use crate::executor::{QueryExecutor, QueryResult};
    pub use crate::filter::{AccessError, FieldValue, Filter, FilterSchema, MemberDecl};
    pub use crate::locator::FsResourceLoader;
    pub use crate::pagination::{Order, Page, PageRequest, Sort};
    pub use crate::shape::{Projection, ProjectionColumn, ReturnType};
    pub use crate::transform::Operator;
}
