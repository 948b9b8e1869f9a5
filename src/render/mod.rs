//! # SQL Rendering Pipeline
//!
//! Turns a descriptor, the template text and one invocation's binding into
//! final SQL. Steps run in a fixed order:
//!
//! 1. template rendering against the bound parameters
//! 2. declared custom processors, in declaration order
//! 3. `${key}` literal replacements (static pairs plus processor contributions)
//! 4. `ORDER BY` from the binding's sort, appended once
//! 5. tenant placeholder substitution for tenant-aware operations
//!
//! Only parameters referenced by a bind marker in the final text are kept.

pub mod engine;
pub mod processor;
pub mod tenant;

pub use engine::{JinjaTemplateEngine, TemplateEngine};
pub use processor::{CommentStripProcessor, ProcessorRegistry, Replacements, SqlProcessor};
pub use tenant::{StaticTenant, TenantResolver};

use crate::binding::{Parameter, ParameterBinding};
use crate::constants::{TENANT_SCHEMA_PLACEHOLDER, TOTAL_RECORDS_ALIAS};
use crate::descriptor::QueryDescriptor;
use crate::error::{NativeQueryError, Result};
use crate::sql::references;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Final SQL of one invocation and the parameters it references
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSql {
    pub sql: String,
    pub parameters: Vec<Parameter>,
}

impl RenderedSql {
    /// Companion query counting the rows of the rendered statement
    pub fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) AS {} FROM ({}) x",
            TOTAL_RECORDS_ALIAS, self.sql
        )
    }
}

#[derive(Debug, Clone)]
pub struct SqlRenderer {
    engine: Arc<dyn TemplateEngine>,
    processors: Arc<ProcessorRegistry>,
    tenant: Option<Arc<dyn TenantResolver>>,
}

impl SqlRenderer {
    pub fn new(
        engine: Arc<dyn TemplateEngine>,
        processors: Arc<ProcessorRegistry>,
        tenant: Option<Arc<dyn TenantResolver>>,
    ) -> Self {
        Self {
            engine,
            processors,
            tenant,
        }
    }

    pub fn render(
        &self,
        descriptor: &QueryDescriptor,
        template: &str,
        binding: &ParameterBinding,
    ) -> Result<RenderedSql> {
        let mut sql = self.engine.render(
            descriptor.template_source().name(),
            template,
            &binding.to_context(),
        )?;

        let mut replacements: Replacements = descriptor.replacements().iter().cloned().collect();
        for name in descriptor.processors() {
            let processor = self
                .processors
                .get(name)
                .ok_or_else(|| NativeQueryError::UnknownProcessor {
                    processor: name.clone(),
                })?;
            sql = processor
                .process(sql, &mut replacements)
                .map_err(|e| NativeQueryError::Processor {
                    processor: name.clone(),
                    message: format!("{e:#}"),
                })?;
        }

        sql = replacements.apply(&sql);

        if let Some(sort) = binding.sort() {
            sql.push_str(&sort.to_sql());
        }

        if descriptor.uses_tenant_placeholder() {
            let schema = self.tenant_schema()?;
            sql = sql.replace(TENANT_SCHEMA_PLACEHOLDER, &schema);
        }

        let parameters = referenced_parameters(&sql, binding.parameters());
        debug!(
            key = %descriptor.key(),
            sql = %sql,
            parameters = parameters.len(),
            dropped = binding.parameters().len() - parameters.len(),
            "SQL to be executed"
        );

        Ok(RenderedSql { sql, parameters })
    }

    fn tenant_schema(&self) -> Result<String> {
        let resolver = self
            .tenant
            .as_ref()
            .ok_or_else(|| NativeQueryError::TenantUnavailable {
                message: "no tenant resolver configured".to_string(),
            })?;
        resolver
            .tenant_schema()
            .map_err(|e| NativeQueryError::TenantUnavailable {
                message: format!("{e:#}"),
            })
    }
}

/// Parameters named by a marker in `sql`, one per name with the last bound value
fn referenced_parameters(sql: &str, bound: &[Parameter]) -> Vec<Parameter> {
    let referenced = references(sql);
    let mut parameters: Vec<Parameter> = Vec::with_capacity(referenced.len());

    for parameter in bound.iter().filter(|p| referenced.contains(&p.name)) {
        match parameters.iter_mut().find(|p| p.name == parameter.name) {
            Some(existing) => existing.value = parameter.value.clone(),
            None => parameters.push(parameter.clone()),
        }
    }

    parameters
}
