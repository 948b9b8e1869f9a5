//! # Native Query Error Types
//!
//! Structured error handling for descriptor resolution, parameter binding,
//! SQL rendering and execution, using thiserror instead of `Box<dyn Error>`.

use crate::config::ConfigurationError;
use thiserror::Error;

/// Errors surfaced by the query engine and its execution adapters
#[derive(Debug, Error)]
pub enum NativeQueryError {
    /// No template file exists and no inline SQL was declared
    #[error("Template not found for {operation}: {path}")]
    TemplateNotFound { operation: String, path: String },

    /// The template engine failed to render
    #[error("Failed to render template '{template}': {message}")]
    TemplateRender { template: String, message: String },

    /// A custom SQL processor failed
    #[error("SQL processor '{processor}' failed: {message}")]
    Processor { processor: String, message: String },

    /// A declared processor is not registered
    #[error("SQL processor '{processor}' is not registered")]
    UnknownProcessor { processor: String },

    /// Tenant placeholder requested but no schema could be resolved
    #[error("Tenant schema unavailable: {message}")]
    TenantUnavailable { message: String },

    /// Invocation arguments do not match the declared signature
    #[error("Argument mismatch for {operation}: {message}")]
    ArgumentMismatch { operation: String, message: String },

    /// An operation or filter declaration is inconsistent
    #[error("Invalid declaration for {target}: {message}")]
    InvalidDeclaration { target: String, message: String },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The execution collaborator failed to run or map a statement
    #[error("Query execution failed: {message}")]
    Execution { message: String },

    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl NativeQueryError {
    pub fn argument_mismatch(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ArgumentMismatch {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn invalid_declaration(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn execution(message: impl std::fmt::Display) -> Self {
        Self::Execution {
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NativeQueryError>;
