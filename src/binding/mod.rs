//! # Parameter Binding
//!
//! Per-invocation state: the flat list of named parameters derived from one
//! call's arguments, plus the sort and page request the call carried. A
//! binding is built fresh by [`ParameterBinder`] on every invocation and is
//! never shared between calls.

pub mod binder;

pub use binder::ParameterBinder;

use crate::filter::Filter;
use crate::pagination::{PageRequest, Sort};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// One actual argument of an invocation
pub enum Argument<'a> {
    Value(Value),
    Filter(&'a dyn Filter),
    Page(PageRequest),
    Sort(Sort),
}

impl<'a> Argument<'a> {
    /// Serialize any value into an argument
    pub fn json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(Argument::Value)
    }

    pub fn filter<F: Filter>(filter: &'a F) -> Self {
        Argument::Filter(filter)
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Argument::Value(_) => "value",
            Argument::Filter(_) => "filter",
            Argument::Page(_) => "page request",
            Argument::Sort(_) => "sort",
        }
    }
}

impl From<Value> for Argument<'_> {
    fn from(value: Value) -> Self {
        Argument::Value(value)
    }
}

impl From<PageRequest> for Argument<'_> {
    fn from(page: PageRequest) -> Self {
        Argument::Page(page)
    }
}

impl From<Sort> for Argument<'_> {
    fn from(sort: Sort) -> Self {
        Argument::Sort(sort)
    }
}

impl fmt::Debug for Argument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Argument::Filter(_) => f.write_str("Filter(..)"),
            Argument::Page(p) => f.debug_tuple("Page").field(p).finish(),
            Argument::Sort(s) => f.debug_tuple("Sort").field(s).finish(),
        }
    }
}

/// A named parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Parameters, sort and page request of one invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBinding {
    parameters: Vec<Parameter>,
    sort: Option<Sort>,
    page: Option<PageRequest>,
}

impl ParameterBinding {
    pub fn new(parameters: Vec<Parameter>, sort: Option<Sort>, page: Option<PageRequest>) -> Self {
        Self {
            parameters,
            sort,
            page,
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    pub fn page(&self) -> Option<&PageRequest> {
        self.page.as_ref()
    }

    /// Value bound under `name`; the last binding wins when a name repeats
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .rev()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Name to value map handed to the template engine
    pub fn to_context(&self) -> Map<String, Value> {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect()
    }
}
