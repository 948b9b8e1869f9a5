//! # Constants
//!
//! Defaults and fixed tokens shared by the locator, renderer and executors.

/// Default directory, relative to the resource base, holding SQL templates
pub const DEFAULT_TEMPLATE_ROOT: &str = "nativeQuery";

/// Legacy template extension, tried last and used when nothing resolves
pub const LEGACY_TEMPLATE_SUFFIX: &str = "twig";

/// Plain SQL template extension
pub const SQL_TEMPLATE_SUFFIX: &str = "sql";

/// Token replaced with the tenant schema for tenant-aware operations
pub const TENANT_SCHEMA_PLACEHOLDER: &str = ":SCHEMA";

/// Column alias of the companion count query
pub const TOTAL_RECORDS_ALIAS: &str = "totalRecords";

/// Name of the built-in comment stripping processor
pub const STRIP_COMMENTS_PROCESSOR: &str = "strip-comments";

/// Environment variable names
pub mod env {
    pub const TEMPLATE_ROOT_DIRECTORY: &str = "NATIVE_QUERY_TEMPLATE_ROOT_DIRECTORY";
    pub const TEMPLATE_FILE_SUFFIX: &str = "NATIVE_QUERY_TEMPLATE_FILE_SUFFIX";
    pub const ENABLE_STRUCTURED_TYPE_MAPPING: &str = "NATIVE_QUERY_ENABLE_STRUCTURED_TYPE_MAPPING";
    pub const ENVIRONMENT: &str = "NATIVE_QUERY_ENV";
    pub const LOG_FORMAT: &str = "NATIVE_QUERY_LOG_FORMAT";
}
