//! # Operation Declarations
//!
//! The per-operation declarative surface, populated once when a query
//! interface is registered: where the SQL comes from, how each argument becomes
//! parameters, which post-processing applies, and the declared return type.
//!
//! ## Example
//!
//! ```rust
//! use native_query::declaration::{ArgumentDecl, ParamDecl, QueryOperation};
//! use native_query::shape::ReturnType;
//! use native_query::transform::Operator;
//! use native_query::pagination::{Page, PageRequest};
//!
//! let operation = QueryOperation::new("UserRepository", "findByNameContaining")
//!     .argument(
//!         ArgumentDecl::plain::<String>("name")
//!             .with_param(ParamDecl::new("name").operator(Operator::Containing)),
//!     )
//!     .argument(ArgumentDecl::page("pageable"))
//!     .returns(ReturnType::of::<Page<String>>());
//!
//! assert_eq!(operation.method(), "findByNameContaining");
//! ```

pub mod param;

pub use param::ParamDecl;

use crate::filter::{Filter, FilterTypeRef};
use crate::pagination::{PageRequest, Sort};
use crate::shape::ReturnType;
use std::borrow::Cow;

/// How an argument position turns into parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentKind {
    /// No declaration: bound under the argument's own name
    Plain,
    /// Declared name and operator
    Param(ParamDecl),
    /// Declared nested filter, flattened into prefixed parameters
    Filter { param: ParamDecl, filter: FilterTypeRef },
    /// Page request carrier
    Page,
    /// Sort carrier
    Sort,
}

/// One formal argument of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentDecl {
    pub name: String,
    pub type_name: Cow<'static, str>,
    pub kind: ArgumentKind,
}

impl ArgumentDecl {
    /// Argument of type `T` bound under its own name
    pub fn plain<T: ?Sized>(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: Cow::Borrowed(std::any::type_name::<T>()),
            kind: ArgumentKind::Plain,
        }
    }

    /// Argument with an explicit type identity
    pub fn named_type(name: &str, type_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.into(),
            kind: ArgumentKind::Plain,
        }
    }

    /// Attach a parameter declaration; a flatten declaration needs [`ArgumentDecl::filter`]
    pub fn with_param(mut self, param: ParamDecl) -> Self {
        self.kind = ArgumentKind::Param(param);
        self
    }

    /// Nested filter argument of type `F`
    pub fn filter<F: Filter + 'static>(name: &str, param: ParamDecl) -> Self {
        Self {
            name: name.to_string(),
            type_name: Cow::Borrowed(std::any::type_name::<F>()),
            kind: ArgumentKind::Filter {
                param: param.flatten(),
                filter: FilterTypeRef::of::<F>(),
            },
        }
    }

    pub fn page(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: Cow::Borrowed(std::any::type_name::<PageRequest>()),
            kind: ArgumentKind::Page,
        }
    }

    pub fn sort(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: Cow::Borrowed(std::any::type_name::<Sort>()),
            kind: ArgumentKind::Sort,
        }
    }
}

/// Execution strategy selection declared on the operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExecutorDecl {
    pub alternate: bool,
    pub tenant_aware: bool,
}

/// A declared query operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOperation {
    declaring_type: String,
    method: String,
    folder: Option<String>,
    file_name: Option<String>,
    inline_sql: Option<String>,
    arguments: Vec<ArgumentDecl>,
    return_type: ReturnType,
    replacements: Vec<(String, String)>,
    processors: Vec<String>,
    executor: ExecutorDecl,
    structured_type_mapping: Option<bool>,
}

impl QueryOperation {
    pub fn new(declaring_type: &str, method: &str) -> Self {
        Self {
            declaring_type: declaring_type.to_string(),
            method: method.to_string(),
            folder: None,
            file_name: None,
            inline_sql: None,
            arguments: Vec::new(),
            return_type: ReturnType::of::<()>(),
            replacements: Vec::new(),
            processors: Vec::new(),
            executor: ExecutorDecl::default(),
            structured_type_mapping: None,
        }
    }

    /// Subfolder under the template root, usually declared once per query interface
    pub fn folder(mut self, folder: &str) -> Self {
        self.folder = Some(folder.to_string());
        self
    }

    /// Template file name used instead of the method name
    pub fn file_name(mut self, file_name: &str) -> Self {
        self.file_name = Some(file_name.to_string());
        self
    }

    pub fn inline_sql(mut self, sql: &str) -> Self {
        self.inline_sql = Some(sql.to_string());
        self
    }

    pub fn argument(mut self, argument: ArgumentDecl) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn returns(mut self, return_type: ReturnType) -> Self {
        self.return_type = return_type;
        self
    }

    /// Literal substitution of `${key}` in the rendered SQL
    pub fn replace(mut self, key: &str, value: &str) -> Self {
        match self.replacements.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self
                .replacements
                .push((key.to_string(), value.to_string())),
        }
        self
    }

    /// Registered processor to run on the rendered SQL
    pub fn processor(mut self, name: &str) -> Self {
        self.processors.push(name.to_string());
        self
    }

    pub fn alternate_executor(mut self, tenant_aware: bool) -> Self {
        self.executor = ExecutorDecl {
            alternate: true,
            tenant_aware,
        };
        self
    }

    /// Override the global structured type mapping option for this operation
    pub fn structured_type_mapping(mut self, enabled: bool) -> Self {
        self.structured_type_mapping = Some(enabled);
        self
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn folder_name(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    pub fn template_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or(&self.method)
    }

    pub fn inline(&self) -> Option<&str> {
        self.inline_sql.as_deref()
    }

    pub fn arguments(&self) -> &[ArgumentDecl] {
        &self.arguments
    }

    pub fn return_type(&self) -> &ReturnType {
        &self.return_type
    }

    pub fn replacements(&self) -> &[(String, String)] {
        &self.replacements
    }

    pub fn processors(&self) -> &[String] {
        &self.processors
    }

    pub fn executor(&self) -> ExecutorDecl {
        self.executor
    }

    pub fn structured_type_mapping_override(&self) -> Option<bool> {
        self.structured_type_mapping
    }

    /// `Type.method` label used in logs and errors
    pub fn label(&self) -> String {
        format!("{}.{}", self.declaring_type, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_name_defaults_to_method() {
        let op = QueryOperation::new("UserRepository", "findUsers");
        assert_eq!(op.template_name(), "findUsers");

        let op = op.file_name("users");
        assert_eq!(op.template_name(), "users");
    }

    #[test]
    fn test_replace_keeps_declaration_order_and_overrides() {
        let op = QueryOperation::new("T", "m")
            .replace("columns", "id")
            .replace("table", "users")
            .replace("columns", "id, name");

        assert_eq!(
            op.replacements(),
            &[
                ("columns".to_string(), "id, name".to_string()),
                ("table".to_string(), "users".to_string()),
            ]
        );
    }

    #[test]
    fn test_argument_type_identity() {
        let arg = ArgumentDecl::plain::<i64>("id");
        assert_eq!(arg.type_name, "i64");
        assert_eq!(arg.kind, ArgumentKind::Plain);

        let page = ArgumentDecl::page("pageable");
        assert!(page.type_name.ends_with("PageRequest"));
    }
}
