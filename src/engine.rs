//! # Query Engine
//!
//! Entry point used by the host that wires declared operations to the engine.
//! Owns the process-wide caches and the rendering collaborators, and turns one
//! invocation into a [`PreparedQuery`] for an executor.
//!
//! ## Example
//!
//! ```rust
//! use native_query::config::NativeQueryConfig;
//! use native_query::declaration::{ArgumentDecl, ParamDecl, QueryOperation};
//! use native_query::binding::Argument;
//! use native_query::engine::QueryEngine;
//! use native_query::shape::ReturnType;
//! use native_query::transform::Operator;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = QueryEngine::builder(NativeQueryConfig::default()).build()?;
//!
//! let operation = QueryOperation::new("UserRepository", "findNames")
//!     .inline_sql("SELECT name FROM users WHERE name LIKE :name")
//!     .argument(
//!         ArgumentDecl::plain::<String>("name")
//!             .with_param(ParamDecl::new("name").operator(Operator::StartsWith)),
//!     )
//!     .returns(ReturnType::of::<Vec<String>>());
//!
//! let prepared = engine.prepare(&operation, &[Argument::from(json!("al"))])?;
//! assert_eq!(prepared.parameters[0].value, json!("al%"));
//! # Ok(())
//! # }
//! ```

use crate::binding::{Argument, Parameter, ParameterBinder, ParameterBinding};
use crate::config::NativeQueryConfig;
use crate::declaration::QueryOperation;
use crate::descriptor::{
    DescriptorCache, DescriptorCacheStats, ExecutionStrategy, QueryDescriptor, QueryKey,
};
use crate::error::Result;
use crate::executor::{QueryExecutor, QueryResult};
use crate::filter::AccessorInfoCache;
use crate::locator::{FsResourceLoader, ResourceLoader, TemplateLocator};
use crate::logging::log_query_operation;
use crate::pagination::PageRequest;
use crate::render::{
    JinjaTemplateEngine, ProcessorRegistry, RenderedSql, SqlProcessor, SqlRenderer,
    TemplateEngine, TenantResolver,
};
use crate::shape::{ColumnHint, ElementKind, ResultShape};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything an executor needs to run one invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedQuery {
    pub key: QueryKey,
    pub sql: String,
    pub parameters: Vec<Parameter>,
    pub result_shape: ResultShape,
    pub element_kind: ElementKind,
    pub element_type: String,
    pub column_hints: Vec<ColumnHint>,
    /// Present only for paged results
    pub count_sql: Option<String>,
    pub page: Option<PageRequest>,
    pub execution: ExecutionStrategy,
}

impl PreparedQuery {
    fn new(descriptor: &QueryDescriptor, binding: &ParameterBinding, rendered: RenderedSql) -> Self {
        let count_sql = descriptor
            .result_shape()
            .requires_count()
            .then(|| rendered.count_sql());

        Self {
            key: descriptor.key().clone(),
            sql: rendered.sql,
            parameters: rendered.parameters,
            result_shape: descriptor.result_shape(),
            element_kind: descriptor.element_kind(),
            element_type: descriptor.element_type().to_string(),
            column_hints: descriptor.column_hints().to_vec(),
            count_sql,
            page: binding.page().cloned(),
            execution: descriptor.execution(),
        }
    }
}

/// Sizes and counters of the engine caches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineCacheStats {
    pub descriptors: DescriptorCacheStats,
    pub filter_types: usize,
    pub accessor_resolutions: u64,
}

#[derive(Debug)]
pub struct QueryEngine {
    config: NativeQueryConfig,
    descriptors: DescriptorCache,
    accessors: AccessorInfoCache,
    locator: TemplateLocator,
    processors: Arc<ProcessorRegistry>,
    renderer: SqlRenderer,
}

impl QueryEngine {
    pub fn builder(config: NativeQueryConfig) -> QueryEngineBuilder {
        QueryEngineBuilder::new(config)
    }

    pub fn config(&self) -> &NativeQueryConfig {
        &self.config
    }

    /// Registry of custom processors, open to registration at runtime
    pub fn processors(&self) -> &ProcessorRegistry {
        &self.processors
    }

    /// Cached descriptor of an operation, derived on first use
    pub fn resolve(&self, operation: &QueryOperation) -> Result<Arc<QueryDescriptor>> {
        let key = QueryKey::of(operation);
        self.descriptors.get_or_derive(&key, || {
            QueryDescriptor::derive(operation, &self.config, &self.locator, &self.accessors)
        })
    }

    pub fn bind(
        &self,
        descriptor: &QueryDescriptor,
        arguments: &[Argument<'_>],
    ) -> Result<ParameterBinding> {
        ParameterBinder::new(&self.accessors).bind(descriptor, arguments)
    }

    pub fn render(
        &self,
        descriptor: &QueryDescriptor,
        binding: &ParameterBinding,
    ) -> Result<RenderedSql> {
        let template = self.load_template(descriptor)?;
        self.renderer.render(descriptor, &template, binding)
    }

    /// Resolve, bind and render one invocation.
    ///
    /// The template is loaded before binding, so a missing template fails the
    /// call before any argument is read.
    pub fn prepare(
        &self,
        operation: &QueryOperation,
        arguments: &[Argument<'_>],
    ) -> Result<PreparedQuery> {
        let descriptor = self.resolve(operation)?;
        let template = self.load_template(&descriptor)?;
        let binding = self.bind(&descriptor, arguments)?;
        let rendered = self.renderer.render(&descriptor, &template, &binding)?;

        debug!(
            key = %descriptor.key(),
            result_shape = ?descriptor.result_shape(),
            parameters = rendered.parameters.len(),
            "Prepared native query"
        );

        Ok(PreparedQuery::new(&descriptor, &binding, rendered))
    }

    /// Prepare one invocation and run it on `executor`
    pub async fn execute<E>(
        &self,
        executor: &E,
        operation: &QueryOperation,
        arguments: &[Argument<'_>],
    ) -> Result<QueryResult>
    where
        E: QueryExecutor + ?Sized,
    {
        let prepared = self.prepare(operation, arguments)?;
        match executor.execute(&prepared).await {
            Ok(result) => {
                log_query_operation("execute", &prepared, "completed", None);
                Ok(result)
            }
            Err(e) => {
                log_query_operation("execute", &prepared, "failed", Some(&e.to_string()));
                Err(e)
            }
        }
    }

    pub fn cache_stats(&self) -> EngineCacheStats {
        EngineCacheStats {
            descriptors: self.descriptors.stats(),
            filter_types: self.accessors.len(),
            accessor_resolutions: self.accessors.resolutions(),
        }
    }

    fn load_template(&self, descriptor: &QueryDescriptor) -> Result<String> {
        self.locator
            .load(&descriptor.key().label(), descriptor.template_source())
    }
}

/// Builder for [`QueryEngine`]
pub struct QueryEngineBuilder {
    config: NativeQueryConfig,
    loader: Option<Arc<dyn ResourceLoader>>,
    template_engine: Option<Arc<dyn TemplateEngine>>,
    processors: Vec<Arc<dyn SqlProcessor>>,
    tenant: Option<Arc<dyn TenantResolver>>,
}

impl QueryEngineBuilder {
    fn new(config: NativeQueryConfig) -> Self {
        Self {
            config,
            loader: None,
            template_engine: None,
            processors: Vec::new(),
            tenant: None,
        }
    }

    /// Template resource loader; defaults to the filesystem under the working directory
    pub fn resource_loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn template_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.template_engine = Some(engine);
        self
    }

    pub fn processor(mut self, processor: Arc<dyn SqlProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    pub fn tenant_resolver(mut self, tenant: Arc<dyn TenantResolver>) -> Self {
        self.tenant = Some(tenant);
        self
    }

    pub fn build(self) -> Result<QueryEngine> {
        self.config.validate()?;

        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(FsResourceLoader::current_dir()));
        let template_engine = self
            .template_engine
            .unwrap_or_else(|| Arc::new(JinjaTemplateEngine::new()));

        let processors = Arc::new(ProcessorRegistry::with_defaults());
        for processor in self.processors {
            processors.register(processor);
        }

        let locator = TemplateLocator::new(&self.config, loader);
        let renderer = SqlRenderer::new(template_engine, processors.clone(), self.tenant);

        info!(
            template_root = %self.config.template_root_directory,
            template_suffix = %self.config.template_file_suffix,
            processors = ?processors.names(),
            "Native query engine initialized"
        );

        Ok(QueryEngine {
            config: self.config,
            descriptors: DescriptorCache::new(),
            accessors: AccessorInfoCache::new(),
            locator,
            processors,
            renderer,
        })
    }
}
