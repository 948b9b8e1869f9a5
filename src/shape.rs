//! # Result Shape Classification
//!
//! Derives, once per descriptor, how many results an operation returns and
//! whether its element type is a built-in scalar or a structured projection.
//! Classification reads the declared Rust return type through
//! [`std::any::type_name`], so `Vec<UserTo>` is a list of a structured
//! projection and `Option<i64>` an optional scalar.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// How many results an operation produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultShape {
    Void,
    Single,
    Optional,
    List,
    /// A list plus the total from the companion count query
    Page,
}

impl ResultShape {
    pub fn requires_count(self) -> bool {
        matches!(self, ResultShape::Page)
    }
}

/// Whether the element maps to a single column or to a projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementKind {
    Scalar,
    Structured,
}

/// Native column types an executor can be told about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeType {
    Integer,
    Long,
    Double,
    Float,
    Short,
    BigDecimal,
    BigInteger,
    String,
    Boolean,
    Character,
    Date,
}

impl NativeType {
    /// Native type of a Rust type name; `Option<T>` maps like `T`
    pub fn for_type_name(type_name: &str) -> Option<Self> {
        let (outer, args) = split_generic(type_name.trim());
        if last_segment(outer) == "Option" {
            return args.first().and_then(|inner| Self::for_type_name(inner));
        }

        match last_segment(outer) {
            "i32" | "u16" => Some(NativeType::Integer),
            "i64" | "u32" | "isize" => Some(NativeType::Long),
            "f64" => Some(NativeType::Double),
            "f32" => Some(NativeType::Float),
            "i16" | "i8" | "u8" => Some(NativeType::Short),
            "Decimal" | "BigDecimal" => Some(NativeType::BigDecimal),
            "i128" | "u64" | "u128" | "usize" | "BigInt" => Some(NativeType::BigInteger),
            "String" | "str" => Some(NativeType::String),
            "bool" => Some(NativeType::Boolean),
            "char" => Some(NativeType::Character),
            "NaiveDate" | "NaiveDateTime" | "DateTime" => Some(NativeType::Date),
            _ => None,
        }
    }
}

/// One projection column
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectionColumn {
    pub name: Cow<'static, str>,
    pub type_name: Cow<'static, str>,
}

impl ProjectionColumn {
    pub fn of<T: ?Sized>(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            type_name: Cow::Borrowed(std::any::type_name::<T>()),
        }
    }
}

/// Structured row type whose columns can carry native type hints
pub trait Projection {
    fn columns() -> Vec<ProjectionColumn>;
}

/// Column name with its native type, forwarded to the executor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnHint {
    pub column: String,
    pub native_type: NativeType,
}

/// Declared return type of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnType {
    type_name: Cow<'static, str>,
    columns: Vec<ProjectionColumn>,
}

impl ReturnType {
    pub fn of<T: ?Sized>() -> Self {
        Self {
            type_name: Cow::Borrowed(std::any::type_name::<T>()),
            columns: Vec::new(),
        }
    }

    /// Return type `R` whose element is the projection `P`
    pub fn projecting<R: ?Sized, P: Projection>() -> Self {
        Self::of::<R>().with_columns(P::columns())
    }

    pub fn named(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_name: type_name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: Vec<ProjectionColumn>) -> Self {
        self.columns = columns;
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn columns(&self) -> &[ProjectionColumn] {
        &self.columns
    }
}

/// Verdict of the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub shape: ResultShape,
    pub element_type: String,
    pub element_kind: ElementKind,
}

const LIST_TYPES: &[&str] = &[
    "Vec",
    "VecDeque",
    "LinkedList",
    "HashSet",
    "BTreeSet",
    "BinaryHeap",
    "IndexSet",
];

const SCALAR_TYPES: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
    "f32", "f64", "bool", "char", "str", "String", "NaiveDate", "NaiveDateTime", "NaiveTime",
    "DateTime", "Decimal", "BigDecimal", "Uuid",
];

pub fn classify(return_type: &ReturnType) -> Classification {
    let name = strip_reference(return_type.type_name());

    if name == "()" {
        return Classification {
            shape: ResultShape::Void,
            element_type: name.to_string(),
            element_kind: ElementKind::Scalar,
        };
    }

    let (shape, element) = if let Some(inner) = slice_element(name) {
        (ResultShape::List, inner)
    } else {
        let (outer, args) = split_generic(name);
        match (last_segment(outer), args.first()) {
            (segment, Some(inner)) if LIST_TYPES.contains(&segment) => (ResultShape::List, *inner),
            ("Option", Some(inner)) => (ResultShape::Optional, *inner),
            ("Page", Some(inner)) => (ResultShape::Page, *inner),
            _ => (ResultShape::Single, name),
        }
    };

    let element = strip_reference(element);
    Classification {
        shape,
        element_type: element.to_string(),
        element_kind: element_kind(element),
    }
}

/// Native type hints for the projection columns of a structured element
pub fn column_hints(return_type: &ReturnType) -> Vec<ColumnHint> {
    return_type
        .columns()
        .iter()
        .filter_map(|column| {
            NativeType::for_type_name(&column.type_name).map(|native_type| ColumnHint {
                column: column.name.to_string(),
                native_type,
            })
        })
        .collect()
}

fn element_kind(type_name: &str) -> ElementKind {
    let (outer, _) = split_generic(type_name);
    if SCALAR_TYPES.contains(&last_segment(outer)) {
        ElementKind::Scalar
    } else {
        ElementKind::Structured
    }
}

fn strip_reference(type_name: &str) -> &str {
    let mut name = type_name.trim();
    while let Some(rest) = name.strip_prefix('&') {
        name = rest.trim_start();
        if let Some(rest) = name.strip_prefix("mut ") {
            name = rest.trim_start();
        }
    }
    name
}

/// Element of `[T]` or `[T; N]`
fn slice_element(type_name: &str) -> Option<&str> {
    let inner = type_name.strip_prefix('[')?.strip_suffix(']')?;
    let element = match top_level_split(inner, ';').first() {
        Some(first) => *first,
        None => inner,
    };
    Some(element.trim())
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path).trim()
}

/// Split `a::B<C, D<E>>` into `a::B` and `[C, D<E>]`
fn split_generic(type_name: &str) -> (&str, Vec<&str>) {
    match type_name.find('<') {
        Some(open) if type_name.ends_with('>') => {
            let outer = &type_name[..open];
            let inner = &type_name[open + 1..type_name.len() - 1];
            (outer, top_level_split(inner, ','))
        }
        _ => (type_name, Vec::new()),
    }
}

fn top_level_split(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, ch) in text.char_indices() {
        match ch {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(text[start..index].trim());
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }

    let last = text[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}
