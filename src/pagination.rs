//! # Pagination and Sorting
//!
//! Page requests, sort specifications and the paged result type. A page
//! request is applied by the executor as `LIMIT/OFFSET`; a sort is appended to
//! the rendered SQL as an `ORDER BY` clause in the caller's key order.

use serde::{Deserialize, Serialize};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Null ordering; `Native` leaves it to the database
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NullHandling {
    #[default]
    Native,
    NullsFirst,
    NullsLast,
}

impl NullHandling {
    fn as_sql(self) -> Option<&'static str> {
        match self {
            NullHandling::Native => None,
            NullHandling::NullsFirst => Some("NULLS FIRST"),
            NullHandling::NullsLast => Some("NULLS LAST"),
        }
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    pub property: String,
    pub direction: Direction,
    #[serde(default)]
    pub null_handling: NullHandling,
}

impl Order {
    pub fn new(property: &str, direction: Direction) -> Self {
        Self {
            property: property.to_string(),
            direction,
            null_handling: NullHandling::Native,
        }
    }

    pub fn asc(property: &str) -> Self {
        Self::new(property, Direction::Asc)
    }

    pub fn desc(property: &str) -> Self {
        Self::new(property, Direction::Desc)
    }

    pub fn nulls_first(mut self) -> Self {
        self.null_handling = NullHandling::NullsFirst;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.null_handling = NullHandling::NullsLast;
        self
    }

    fn to_sql(&self) -> String {
        match self.null_handling.as_sql() {
            Some(nulls) => format!("{} {} {}", self.property, self.direction.as_sql(), nulls),
            None => format!("{} {}", self.property, self.direction.as_sql()),
        }
    }
}

/// Ordered list of sort keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(order: Order) -> Self {
        Self {
            orders: vec![order],
        }
    }

    pub fn and(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// ` ORDER BY ...` clause, or an empty string when unsorted
    pub fn to_sql(&self) -> String {
        if self.orders.is_empty() {
            return String::new();
        }

        let keys: Vec<String> = self.orders.iter().map(Order::to_sql).collect();
        format!(" ORDER BY {}", keys.join(", "))
    }
}

impl FromIterator<Order> for Sort {
    fn from_iter<I: IntoIterator<Item = Order>>(iter: I) -> Self {
        Self {
            orders: iter.into_iter().collect(),
        }
    }
}

/// Zero-based page request, optionally carrying a sort
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_index: u32,
    pub page_size: u32,
    #[serde(default)]
    pub sort: Option<Sort>,
}

impl PageRequest {
    pub fn new(page_index: u32, page_size: u32) -> Self {
        Self {
            page_index,
            page_size,
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sort carried by this request, if it has any keys
    pub fn effective_sort(&self) -> Option<&Sort> {
        self.sort.as_ref().filter(|sort| !sort.is_empty())
    }

    /// Index of the first row of this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page_index) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }

    /// Convert to SQL string
    pub fn to_sql(&self) -> String {
        format!(" LIMIT {} OFFSET {}", self.limit(), self.offset())
    }

    /// Calculate total pages given a total count
    pub fn total_pages(&self, total_count: u64) -> u64 {
        if self.page_size == 0 {
            return 1;
        }
        total_count.div_ceil(u64::from(self.page_size))
    }

    /// Check if there's a next page
    pub fn has_next_page(&self, total_count: u64) -> bool {
        self.offset() + u64::from(self.page_size) < total_count
    }

    /// Check if there's a previous page
    pub fn has_previous_page(&self) -> bool {
        self.page_index > 0
    }
}

/// One page of results plus the total across all pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub request: PageRequest,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            request,
            total_elements,
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.request.total_pages(self.total_elements)
    }

    pub fn has_next(&self) -> bool {
        self.request.has_next_page(self.total_elements)
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            request: self.request,
            total_elements: self.total_elements,
        }
    }

    pub fn try_map<U, E, F: FnMut(T) -> Result<U, E>>(self, f: F) -> Result<Page<U>, E> {
        Ok(Page {
            content: self.content.into_iter().map(f).collect::<Result<_, _>>()?,
            request: self.request,
            total_elements: self.total_elements,
        })
    }
}
