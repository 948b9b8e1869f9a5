//! # Filter Objects
//!
//! A filter object is a structured argument whose members are flattened into
//! many named parameters. Rust has no runtime reflection, so a filter type
//! describes itself through [`Filter::schema`] and exposes member values
//! through [`Filter::read`].
//!
//! The schema lists field-level and accessor-level declarations separately;
//! [`FlattenAccessorInfo`] reconciles them once per type (accessor
//! declarations win) and [`AccessorInfoCache`] keeps the result for the life of
//! the engine.
//!
//! ## Example
//!
//! ```rust
//! use native_query::declaration::ParamDecl;
//! use native_query::filter::{AccessError, FieldValue, Filter, FilterSchema, MemberDecl};
//! use native_query::transform::Operator;
//! use serde_json::json;
//!
//! struct UserFilter {
//!     name: Option<String>,
//!     active: bool,
//! }
//!
//! impl Filter for UserFilter {
//!     fn schema() -> FilterSchema {
//!         FilterSchema::of::<Self>()
//!             .field(MemberDecl::new("name").param(ParamDecl::new("name").operator(Operator::Containing)))
//!             .field(MemberDecl::new("active"))
//!     }
//!
//!     fn read(&self, accessor: &str) -> Result<FieldValue<'_>, AccessError> {
//!         match accessor {
//!             "name" => Ok(json!(self.name).into()),
//!             "active" => Ok(json!(self.active).into()),
//!             other => Err(AccessError::unknown::<Self>(other)),
//!         }
//!     }
//! }
//! ```

pub mod accessor_info;

pub use accessor_info::{AccessorInfoCache, FlattenAccessorInfo, ResolvedAccessor};

use crate::declaration::ParamDecl;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Failure to read a filter member; the binder treats it as "no value"
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("{type_name} has no accessor named '{accessor}'")]
    UnknownAccessor {
        type_name: &'static str,
        accessor: String,
    },

    #[error("accessor '{accessor}' failed: {message}")]
    Failed { accessor: String, message: String },
}

impl AccessError {
    pub fn unknown<F: ?Sized>(accessor: &str) -> Self {
        Self::UnknownAccessor {
            type_name: std::any::type_name::<F>(),
            accessor: accessor.to_string(),
        }
    }

    pub fn failed(accessor: &str, message: impl fmt::Display) -> Self {
        Self::Failed {
            accessor: accessor.to_string(),
            message: message.to_string(),
        }
    }
}

/// Value produced by one accessor
pub enum FieldValue<'a> {
    Value(Value),
    Nested(&'a dyn Filter),
    Absent,
}

impl<'a> FieldValue<'a> {
    /// Serialize any value into a member value
    pub fn json<T: Serialize + ?Sized>(accessor: &str, value: &T) -> Result<Self, AccessError> {
        serde_json::to_value(value)
            .map(FieldValue::Value)
            .map_err(|e| AccessError::failed(accessor, e))
    }

    pub fn nested(filter: &'a dyn Filter) -> Self {
        FieldValue::Nested(filter)
    }

    /// Nested filter when present, `Absent` otherwise
    pub fn nested_opt<F: Filter>(filter: Option<&'a F>) -> Self {
        match filter {
            Some(f) => FieldValue::Nested(f),
            None => FieldValue::Absent,
        }
    }
}

impl From<Value> for FieldValue<'_> {
    fn from(value: Value) -> Self {
        FieldValue::Value(value)
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            FieldValue::Nested(_) => f.write_str("Nested(..)"),
            FieldValue::Absent => f.write_str("Absent"),
        }
    }
}

/// A structured argument that can be flattened into parameters
pub trait Filter: Send + Sync {
    /// Static member declarations of the type
    fn schema() -> FilterSchema
    where
        Self: Sized;

    /// Read one member by accessor name
    fn read(&self, accessor: &str) -> Result<FieldValue<'_>, AccessError>;
}

/// Type-level handle on a filter type, comparable by type identity
#[derive(Clone, Copy)]
pub struct FilterTypeRef {
    type_name: &'static str,
    schema: fn() -> FilterSchema,
}

impl FilterTypeRef {
    pub fn of<F: Filter + 'static>() -> Self {
        Self {
            type_name: std::any::type_name::<F>(),
            schema: F::schema,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn schema(&self) -> FilterSchema {
        (self.schema)()
    }
}

impl PartialEq for FilterTypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
    }
}

impl Eq for FilterTypeRef {}

impl Hash for FilterTypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
    }
}

impl fmt::Debug for FilterTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FilterTypeRef").field(&self.type_name).finish()
    }
}

/// A field or accessor with its optional parameter declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDecl {
    pub name: String,
    pub param: Option<ParamDecl>,
    pub nested: Option<FilterTypeRef>,
}

impl MemberDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            param: None,
            nested: None,
        }
    }

    pub fn param(mut self, param: ParamDecl) -> Self {
        self.param = Some(param);
        self
    }

    /// Member holding a nested filter of type `F`
    pub fn nested<F: Filter + 'static>(mut self) -> Self {
        self.nested = Some(FilterTypeRef::of::<F>());
        self
    }
}

/// Member declarations of a filter type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSchema {
    pub type_name: &'static str,
    pub fields: Vec<MemberDecl>,
    pub accessors: Vec<MemberDecl>,
}

impl FilterSchema {
    pub fn of<F: ?Sized>() -> Self {
        Self {
            type_name: std::any::type_name::<F>(),
            fields: Vec::new(),
            accessors: Vec::new(),
        }
    }

    pub fn field(mut self, member: MemberDecl) -> Self {
        self.fields.push(member);
        self
    }

    pub fn accessor(mut self, member: MemberDecl) -> Self {
        self.accessors.push(member);
        self
    }
}
