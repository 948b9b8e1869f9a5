//! # Template Source Locator
//!
//! Resolves where an operation's SQL comes from: inline text declared on the
//! operation, or a file under the configured template root. File candidates
//! are tried in order: the configured suffix, `sql`, then the legacy `twig`
//! suffix. When none exists the legacy path is returned anyway so the
//! not-found failure surfaces at load time with the full path in context.

use crate::config::NativeQueryConfig;
use crate::constants::{LEGACY_TEMPLATE_SUFFIX, SQL_TEMPLATE_SUFFIX};
use crate::declaration::QueryOperation;
use crate::error::{NativeQueryError, Result};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Where the SQL text of an operation comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateSource {
    Inline(String),
    File(String),
}

impl TemplateSource {
    /// Name used for error reporting and by the template engine
    pub fn name(&self) -> &str {
        match self {
            TemplateSource::Inline(_) => "inline",
            TemplateSource::File(path) => path,
        }
    }
}

/// Read access to template resources
pub trait ResourceLoader: Send + Sync + fmt::Debug {
    fn exists(&self, path: &str) -> bool;

    fn load(&self, path: &str) -> io::Result<String>;
}

/// Loads templates from the filesystem, relative to a base directory
#[derive(Debug, Clone)]
pub struct FsResourceLoader {
    base_dir: PathBuf,
}

impl FsResourceLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Loader rooted at the process working directory
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }
}

impl ResourceLoader for FsResourceLoader {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn load(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(self.resolve(path))
    }
}

#[derive(Debug, Clone)]
pub struct TemplateLocator {
    root: String,
    suffix: String,
    loader: Arc<dyn ResourceLoader>,
}

impl TemplateLocator {
    pub fn new(config: &NativeQueryConfig, loader: Arc<dyn ResourceLoader>) -> Self {
        Self {
            root: config.template_root_directory.trim_end_matches('/').to_string(),
            suffix: config.template_file_suffix.clone(),
            loader,
        }
    }

    pub fn loader(&self) -> &Arc<dyn ResourceLoader> {
        &self.loader
    }

    pub fn locate(&self, operation: &QueryOperation) -> TemplateSource {
        if let Some(sql) = operation.inline() {
            debug!(operation = %operation.label(), "SQL obtained from inline declaration");
            return TemplateSource::Inline(sql.to_string());
        }

        let stem = self.stem(operation);
        for suffix in self.candidate_suffixes() {
            let path = format!("{stem}.{suffix}");
            if self.loader.exists(&path) {
                debug!(operation = %operation.label(), path = %path, "SQL obtained from template file");
                return TemplateSource::File(path);
            }
        }

        let path = format!("{stem}.{LEGACY_TEMPLATE_SUFFIX}");
        debug!(
            operation = %operation.label(),
            path = %path,
            "No template candidate exists, falling back to legacy suffix"
        );
        TemplateSource::File(path)
    }

    /// Text of a located template
    pub fn load(&self, operation: &str, source: &TemplateSource) -> Result<String> {
        match source {
            TemplateSource::Inline(sql) => Ok(sql.clone()),
            TemplateSource::File(path) => {
                self.loader
                    .load(path)
                    .map_err(|e| NativeQueryError::TemplateNotFound {
                        operation: operation.to_string(),
                        path: format!("{path} ({e})"),
                    })
            }
        }
    }

    fn stem(&self, operation: &QueryOperation) -> String {
        let mut stem = String::new();
        if !self.root.is_empty() {
            stem.push_str(&self.root);
            stem.push('/');
        }
        if let Some(folder) = operation.folder_name() {
            stem.push_str(folder.trim_matches('/'));
            stem.push('/');
        }
        stem.push_str(operation.template_name());
        stem
    }

    fn candidate_suffixes(&self) -> Vec<&str> {
        let mut suffixes: Vec<&str> = Vec::with_capacity(3);
        for suffix in [self.suffix.as_str(), SQL_TEMPLATE_SUFFIX, LEGACY_TEMPLATE_SUFFIX] {
            if !suffixes.contains(&suffix) {
                suffixes.push(suffix);
            }
        }
        suffixes
    }
}
