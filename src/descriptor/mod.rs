//! # Query Descriptors
//!
//! A [`QueryDescriptor`] holds the static facts about one query operation:
//! template source, result shape, post-processing rules, execution strategy
//! and how each argument position becomes parameters. It is derived once per
//! [`QueryKey`] and never mutated afterwards; everything that varies per call
//! lives in [`ParameterBinding`](crate::binding::ParameterBinding) and
//! [`RenderedSql`](crate::render::RenderedSql).

pub mod cache;

pub use cache::{DescriptorCache, DescriptorCacheStats};

use crate::config::NativeQueryConfig;
use crate::declaration::{ArgumentKind, QueryOperation};
use crate::error::{NativeQueryError, Result};
use crate::filter::{AccessorInfoCache, FilterTypeRef};
use crate::locator::{TemplateLocator, TemplateSource};
use crate::shape::{self, ColumnHint, ElementKind, ResultShape};
use crate::transform::Operator;
use crate::utils::naming::capitalize;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Cache key: declaring type, method and ordered argument type identities
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueryKey {
    pub declaring_type: String,
    pub method: String,
    pub argument_types: Vec<String>,
}

impl QueryKey {
    pub fn of(operation: &QueryOperation) -> Self {
        Self {
            declaring_type: operation.declaring_type().to_string(),
            method: operation.method().to_string(),
            argument_types: operation
                .arguments()
                .iter()
                .map(|a| a.type_name.to_string())
                .collect(),
        }
    }

    pub fn label(&self) -> String {
        format!("{}.{}", self.declaring_type, self.method)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.declaring_type,
            self.method,
            self.argument_types.join(", ")
        )
    }
}

/// How one argument position produces parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterSpec {
    Direct { name: String },
    Annotated { name: String, operator: Operator },
    Flatten { prefix: String, filter: FilterTypeRef },
    Pagination,
    Sort,
}

impl ParameterSpec {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ParameterSpec::Direct { .. } => "a plain value",
            ParameterSpec::Annotated { .. } => "an annotated value",
            ParameterSpec::Flatten { .. } => "a flattened filter",
            ParameterSpec::Pagination => "a page request",
            ParameterSpec::Sort => "a sort",
        }
    }
}

/// Execution strategy handed to the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExecutionStrategy {
    /// Default session-backed execution with projection mapping
    Session,
    /// Alternate direct statement execution, optionally tenant-aware
    Direct { tenant_aware: bool },
}

impl ExecutionStrategy {
    pub fn uses_alternate_executor(self) -> bool {
        matches!(self, ExecutionStrategy::Direct { .. })
    }

    pub fn uses_tenant_placeholder(self) -> bool {
        matches!(self, ExecutionStrategy::Direct { tenant_aware: true })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    key: QueryKey,
    template_source: TemplateSource,
    result_shape: ResultShape,
    element_kind: ElementKind,
    element_type: String,
    column_hints: Vec<ColumnHint>,
    replacements: Vec<(String, String)>,
    processors: Vec<String>,
    execution: ExecutionStrategy,
    parameter_specs: Vec<ParameterSpec>,
}

impl QueryDescriptor {
    /// Derive the descriptor of an operation.
    ///
    /// Locates the template, classifies the return type and resolves accessor
    /// metadata for every filter type reachable from the signature.
    pub fn derive(
        operation: &QueryOperation,
        config: &NativeQueryConfig,
        locator: &TemplateLocator,
        accessors: &AccessorInfoCache,
    ) -> Result<Self> {
        let key = QueryKey::of(operation);
        let template_source = locator.locate(operation);
        let classification = shape::classify(operation.return_type());

        let structured_mapping = operation
            .structured_type_mapping_override()
            .unwrap_or(config.enable_structured_type_mapping);
        let column_hints =
            if structured_mapping && classification.element_kind == ElementKind::Structured {
                shape::column_hints(operation.return_type())
            } else {
                Vec::new()
            };

        let mut parameter_specs = Vec::with_capacity(operation.arguments().len());
        for argument in operation.arguments() {
            let spec = match &argument.kind {
                ArgumentKind::Plain => ParameterSpec::Direct {
                    name: argument.name.clone(),
                },
                ArgumentKind::Param(param) if param.flatten => {
                    return Err(NativeQueryError::invalid_declaration(
                        format!("{}({})", key.label(), argument.name),
                        "flatten requires a filter argument declaration",
                    ));
                }
                ArgumentKind::Param(param) => ParameterSpec::Annotated {
                    name: param.name.clone(),
                    operator: param.operator,
                },
                ArgumentKind::Filter { param, filter } => {
                    accessors.warm(filter)?;
                    ParameterSpec::Flatten {
                        prefix: capitalize(&param.name),
                        filter: *filter,
                    }
                }
                ArgumentKind::Page => ParameterSpec::Pagination,
                ArgumentKind::Sort => ParameterSpec::Sort,
            };
            parameter_specs.push(spec);
        }

        let executor = operation.executor();
        let execution = if executor.alternate {
            ExecutionStrategy::Direct {
                tenant_aware: executor.tenant_aware,
            }
        } else {
            ExecutionStrategy::Session
        };

        debug!(
            key = %key,
            template = %template_source.name(),
            result_shape = ?classification.shape,
            element_type = %classification.element_type,
            element_kind = ?classification.element_kind,
            execution = ?execution,
            "Derived query descriptor"
        );

        Ok(Self {
            key,
            template_source,
            result_shape: classification.shape,
            element_kind: classification.element_kind,
            element_type: classification.element_type,
            column_hints,
            replacements: operation.replacements().to_vec(),
            processors: operation.processors().to_vec(),
            execution,
            parameter_specs,
        })
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn template_source(&self) -> &TemplateSource {
        &self.template_source
    }

    pub fn result_shape(&self) -> ResultShape {
        self.result_shape
    }

    pub fn element_kind(&self) -> ElementKind {
        self.element_kind
    }

    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    pub fn column_hints(&self) -> &[ColumnHint] {
        &self.column_hints
    }

    pub fn replacements(&self) -> &[(String, String)] {
        &self.replacements
    }

    pub fn processors(&self) -> &[String] {
        &self.processors
    }

    pub fn execution(&self) -> ExecutionStrategy {
        self.execution
    }

    pub fn uses_tenant_placeholder(&self) -> bool {
        self.execution.uses_tenant_placeholder()
    }

    pub fn parameter_specs(&self) -> &[ParameterSpec] {
        &self.parameter_specs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{ArgumentDecl, ParamDecl};
    use crate::filter::{AccessError, FieldValue, Filter, FilterSchema, MemberDecl};
    use crate::locator::FsResourceLoader;
    use crate::pagination::Page;
    use crate::shape::{NativeType, Projection, ProjectionColumn, ReturnType};
    use std::sync::Arc;

    struct UserTo;

    impl Projection for UserTo {
        fn columns() -> Vec<ProjectionColumn> {
            vec![ProjectionColumn::of::<i64>("id")]
        }
    }

    struct UserFilter;

    impl Filter for UserFilter {
        fn schema() -> FilterSchema {
            FilterSchema::of::<Self>().field(MemberDecl::new("name"))
        }

        fn read(&self, accessor: &str) -> std::result::Result<FieldValue<'_>, AccessError> {
            Err(AccessError::unknown::<Self>(accessor))
        }
    }

    fn derive(operation: &QueryOperation, config: &NativeQueryConfig) -> Result<QueryDescriptor> {
        let locator = TemplateLocator::new(config, Arc::new(FsResourceLoader::new("does-not-exist")));
        QueryDescriptor::derive(operation, config, &locator, &AccessorInfoCache::new())
    }

    #[test]
    fn test_parameter_specs_follow_argument_declarations() {
        let op = QueryOperation::new("UserRepository", "search")
            .argument(ArgumentDecl::plain::<i64>("id"))
            .argument(
                ArgumentDecl::plain::<String>("name")
                    .with_param(ParamDecl::new("name").operator(Operator::Containing)),
            )
            .argument(ArgumentDecl::filter::<UserFilter>("filter", ParamDecl::new("filter")))
            .argument(ArgumentDecl::page("pageable"))
            .returns(ReturnType::projecting::<Page<UserTo>, UserTo>());

        let descriptor = derive(&op, &NativeQueryConfig::default()).unwrap();

        assert_eq!(
            descriptor.parameter_specs(),
            &[
                ParameterSpec::Direct { name: "id".to_string() },
                ParameterSpec::Annotated {
                    name: "name".to_string(),
                    operator: Operator::Containing
                },
                ParameterSpec::Flatten {
                    prefix: "Filter".to_string(),
                    filter: FilterTypeRef::of::<UserFilter>()
                },
                ParameterSpec::Pagination,
            ]
        );
        assert_eq!(descriptor.result_shape(), ResultShape::Page);
        assert_eq!(descriptor.column_hints()[0].native_type, NativeType::Long);
        assert_eq!(descriptor.execution(), ExecutionStrategy::Session);
    }

    #[test]
    fn test_structured_mapping_can_be_disabled_per_operation() {
        let op = QueryOperation::new("UserRepository", "findAll")
            .returns(ReturnType::projecting::<Vec<UserTo>, UserTo>())
            .structured_type_mapping(false);

        let descriptor = derive(&op, &NativeQueryConfig::default()).unwrap();
        assert!(descriptor.column_hints().is_empty());
    }

    #[test]
    fn test_flatten_on_plain_argument_is_rejected() {
        let op = QueryOperation::new("UserRepository", "search")
            .argument(ArgumentDecl::plain::<String>("name").with_param(ParamDecl::new("name").flatten()));

        assert!(matches!(
            derive(&op, &NativeQueryConfig::default()),
            Err(NativeQueryError::InvalidDeclaration { .. })
        ));
    }

    #[test]
    fn test_alternate_executor_with_tenant() {
        let op = QueryOperation::new("UserRepository", "deleteAll").alternate_executor(true);
        let descriptor = derive(&op, &NativeQueryConfig::default()).unwrap();

        assert!(descriptor.uses_tenant_placeholder());
        assert_eq!(descriptor.result_shape(), ResultShape::Void);
    }

    #[test]
    fn test_overloads_have_distinct_keys() {
        let a = QueryOperation::new("UserRepository", "find").argument(ArgumentDecl::plain::<i64>("id"));
        let b = QueryOperation::new("UserRepository", "find").argument(ArgumentDecl::plain::<String>("id"));
        assert_ne!(QueryKey::of(&a), QueryKey::of(&b));
    }
}
