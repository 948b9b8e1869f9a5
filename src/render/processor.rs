//! Custom SQL processors and their registry.
//!
//! Processors run in declaration order against the rendered SQL, before the
//! `${key}` replacements. Each one receives the replacement map and may add
//! entries to it.

use crate::constants::STRIP_COMMENTS_PROCESSOR;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Ordered `${key}` replacement pairs; inserting an existing key overrides it in place
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replacements {
    entries: Vec<(String, String)>,
}

impl Replacements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every `${key}` in `sql`
    pub fn apply(&self, sql: &str) -> String {
        self.entries.iter().fold(sql.to_string(), |sql, (key, value)| {
            sql.replace(&format!("${{{key}}}"), value)
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Replacements {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut replacements = Replacements::new();
        for (key, value) in iter {
            replacements.insert(key, value);
        }
        replacements
    }
}

/// A named rewrite step over rendered SQL
pub trait SqlProcessor: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn process(&self, sql: String, replacements: &mut Replacements) -> anyhow::Result<String>;
}

/// Removes `--` line comments, including the line break that ends them
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentStripProcessor;

impl SqlProcessor for CommentStripProcessor {
    fn name(&self) -> &str {
        STRIP_COMMENTS_PROCESSOR
    }

    fn process(&self, sql: String, _replacements: &mut Replacements) -> anyhow::Result<String> {
        let mut out = String::with_capacity(sql.len());
        let mut rest = sql.as_str();

        while let Some(start) = rest.find("--") {
            out.push_str(&rest[..start]);
            rest = match rest[start..].find('\n') {
                Some(newline) => &rest[start + newline + 1..],
                None => "",
            };
        }
        out.push_str(rest);

        Ok(out)
    }
}

/// Processors available to operations, by name
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: RwLock<HashMap<String, Arc<dyn SqlProcessor>>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in processors
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(CommentStripProcessor));
        registry
    }

    /// Register a processor, replacing any previous one with the same name
    pub fn register(&self, processor: Arc<dyn SqlProcessor>) {
        self.processors
            .write()
            .insert(processor.name().to_string(), processor);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SqlProcessor>> {
        self.processors.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.processors.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("processors", &self.names())
            .finish()
    }
}
