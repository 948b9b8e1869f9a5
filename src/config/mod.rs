//! # Native Query Configuration
//!
//! Options consumed by the engine: where SQL templates live, which file
//! extension is preferred, and whether structured projections get per-column
//! native type hints.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use native_query::config::NativeQueryConfig;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Defaults, then file values, then environment overrides
//! let config = NativeQueryConfig::load(Some(Path::new("config/native-query.yaml")))?;
//! assert!(!config.template_root_directory.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::{env, DEFAULT_TEMPLATE_ROOT, LEGACY_TEMPLATE_SUFFIX};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Engine options, read from the `native-query` section of a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NativeQueryConfig {
    /// Directory holding SQL templates, relative to the resource base
    #[serde(alias = "template_root_directory")]
    pub template_root_directory: String,

    /// Preferred template extension, tried before `sql` and the legacy default
    #[serde(alias = "template_file_suffix")]
    pub template_file_suffix: String,

    /// Forward per-column native type hints for structured projections
    #[serde(alias = "enable_structured_type_mapping")]
    pub enable_structured_type_mapping: bool,
}

impl Default for NativeQueryConfig {
    fn default() -> Self {
        Self {
            template_root_directory: DEFAULT_TEMPLATE_ROOT.to_string(),
            template_file_suffix: LEGACY_TEMPLATE_SUFFIX.to_string(),
            enable_structured_type_mapping: true,
        }
    }
}

impl NativeQueryConfig {
    /// Load from an optional file, apply environment overrides and validate
    pub fn load(path: Option<&std::path::Path>) -> ConfigResult<Self> {
        ConfigLoader::new(path.map(|p| p.to_path_buf())).load()
    }

    /// Defaults with environment overrides only
    pub fn from_environment() -> ConfigResult<Self> {
        let config = Self::default().with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration.
    ///
    /// A structured type mapping override that is not `true` or `false` is an
    /// error rather than a silent fallback to the current value.
    pub fn with_env_overrides(mut self) -> ConfigResult<Self> {
        if let Ok(root) = std::env::var(env::TEMPLATE_ROOT_DIRECTORY) {
            info!("Template root directory override: {}", root);
            self.template_root_directory = root;
        }

        if let Ok(suffix) = std::env::var(env::TEMPLATE_FILE_SUFFIX) {
            info!("Template file suffix override: {}", suffix);
            self.template_file_suffix = suffix;
        }

        if let Ok(enabled) = std::env::var(env::ENABLE_STRUCTURED_TYPE_MAPPING) {
            self.enable_structured_type_mapping = parse_bool_override(&enabled).ok_or_else(|| {
                ConfigurationError::invalid_value(
                    env::ENABLE_STRUCTURED_TYPE_MAPPING,
                    enabled.clone(),
                    "expected true or false",
                )
            })?;
            info!(
                "Structured type mapping override: {}",
                self.enable_structured_type_mapping
            );
        }

        Ok(self)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.template_root_directory.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "template-root-directory",
                self.template_root_directory.clone(),
                "template root directory must not be empty",
            ));
        }

        if self.template_file_suffix.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "template-file-suffix",
                self.template_file_suffix.clone(),
                "template file suffix must not be empty",
            ));
        }

        if self.template_file_suffix.starts_with('.') {
            return Err(ConfigurationError::invalid_value(
                "template-file-suffix",
                self.template_file_suffix.clone(),
                "template file suffix is an extension without the leading dot",
            ));
        }

        if self.template_root_directory.starts_with('/') {
            warn!(
                "Template root '{}' is absolute; it is still resolved against the resource base",
                self.template_root_directory
            );
        }

        Ok(())
    }

    /// Log current configuration for debugging
    pub fn log_configuration(&self) {
        info!("Native Query Configuration:");
        info!("  Template Root Directory: {}", self.template_root_directory);
        info!("  Template File Suffix: {}", self.template_file_suffix);
        info!(
            "  Structured Type Mapping: {}",
            self.enable_structured_type_mapping
        );
    }
}

/// `true`/`false` in any case, surrounding whitespace ignored
fn parse_bool_override(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
