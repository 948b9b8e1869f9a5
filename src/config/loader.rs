//! Configuration Loader
//!
//! Layers configuration the same way every time: built-in defaults, then the
//! `native-query` section of an optional config file (YAML, TOML or JSON,
//! detected from the extension), then environment variable overrides.

use super::error::{ConfigResult, ConfigurationError};
use super::NativeQueryConfig;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

/// Shape of a configuration file: engine options live under one section
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigDocument {
    #[serde(rename = "native-query", alias = "native_query")]
    native_query: NativeQueryConfig,
}

/// Loads [`NativeQueryConfig`] from file and environment
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    env_overrides: bool,
}

impl ConfigLoader {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            env_overrides: true,
        }
    }

    /// Skip environment overrides; useful for tests that must not observe the process env
    pub fn without_env_overrides(mut self) -> Self {
        self.env_overrides = false;
        self
    }

    pub fn load(&self) -> ConfigResult<NativeQueryConfig> {
        let mut config = match &self.path {
            Some(path) => Self::load_file(path)?,
            None => NativeQueryConfig::default(),
        };

        if self.env_overrides {
            config = config.with_env_overrides()?;
        }

        config.validate()?;
        config.log_configuration();
        Ok(config)
    }

    fn load_file(path: &PathBuf) -> ConfigResult<NativeQueryConfig> {
        let display = path.display().to_string();

        if !path.is_file() {
            return Err(ConfigurationError::file_read_error(
                display,
                "file does not exist or is not a regular file",
            ));
        }

        debug!("Loading native query configuration from: {}", path.display());

        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_path()))
            .build()
            .map_err(|e| ConfigurationError::parse_error(display.clone(), e))?;

        let document: ConfigDocument = settings
            .try_deserialize()
            .map_err(|e| ConfigurationError::parse_error(display, e))?;

        Ok(document.native_query)
    }
}
