//! Per-type accessor metadata for filter flattening.
//!
//! Resolved once per filter type and shared across all invocations. Holds no
//! per-call state.

use super::{FilterSchema, FilterTypeRef};
use crate::declaration::ParamDecl;
use crate::error::{NativeQueryError, Result};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// One readable member with its effective declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAccessor {
    pub name: String,
    pub param: Option<ParamDecl>,
    pub nested: Option<FilterTypeRef>,
}

/// Reconciled accessor list of one filter type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenAccessorInfo {
    pub type_name: &'static str,
    pub accessors: Vec<ResolvedAccessor>,
}

impl FlattenAccessorInfo {
    /// Reconcile field and accessor declarations.
    ///
    /// Accessors come first in declaration order, taking their own declaration
    /// when present and the same-named field's otherwise. Fields without an
    /// accessor follow, readable under their own name.
    pub fn resolve(schema: FilterSchema) -> Result<Self> {
        let FilterSchema {
            type_name,
            fields,
            accessors,
        } = schema;

        let mut resolved: Vec<ResolvedAccessor> = Vec::with_capacity(fields.len() + accessors.len());
        let mut seen = HashSet::new();

        for accessor in accessors {
            if !seen.insert(accessor.name.clone()) {
                continue;
            }
            let field = fields.iter().find(|f| f.name == accessor.name);
            resolved.push(ResolvedAccessor {
                param: accessor
                    .param
                    .or_else(|| field.and_then(|f| f.param.clone())),
                nested: accessor.nested.or_else(|| field.and_then(|f| f.nested)),
                name: accessor.name,
            });
        }

        for field in fields {
            if seen.insert(field.name.clone()) {
                resolved.push(ResolvedAccessor {
                    name: field.name,
                    param: field.param,
                    nested: field.nested,
                });
            }
        }

        for accessor in &resolved {
            let flatten = accessor.param.as_ref().is_some_and(|p| p.flatten);
            if flatten && accessor.nested.is_none() {
                return Err(NativeQueryError::invalid_declaration(
                    format!("{}.{}", type_name, accessor.name),
                    "flatten requested on a member without a nested filter type",
                ));
            }
        }

        Ok(Self {
            type_name,
            accessors: resolved,
        })
    }
}

/// Concurrent cache of [`FlattenAccessorInfo`] keyed by filter type identity
#[derive(Debug, Default)]
pub struct AccessorInfoCache {
    entries: DashMap<&'static str, Arc<FlattenAccessorInfo>>,
    resolutions: AtomicU64,
}

impl AccessorInfoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_resolve(&self, filter: &FilterTypeRef) -> Result<Arc<FlattenAccessorInfo>> {
        if let Some(info) = self.entries.get(filter.type_name()) {
            return Ok(info.clone());
        }

        // Resolved outside the map lock; a racing resolution produces an equal value
        let info = Arc::new(FlattenAccessorInfo::resolve(filter.schema())?);
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        debug!(
            filter_type = filter.type_name(),
            accessors = info.accessors.len(),
            "Resolved filter accessor metadata"
        );

        Ok(self
            .entries
            .entry(filter.type_name())
            .or_insert(info)
            .clone())
    }

    /// Resolve a filter type and every nested filter type reachable from it
    pub fn warm(&self, filter: &FilterTypeRef) -> Result<()> {
        let mut visited = HashSet::new();
        let mut pending = vec![*filter];

        while let Some(current) = pending.pop() {
            if !visited.insert(current.type_name()) {
                continue;
            }
            let info = self.get_or_resolve(&current)?;
            pending.extend(info.accessors.iter().filter_map(|a| a.nested));
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of schema resolutions performed, including redundant racing ones
    pub fn resolutions(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }
}
