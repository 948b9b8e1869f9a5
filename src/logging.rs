//! # Structured Logging Module
//!
//! Environment-aware structured logging for hosts embedding the engine. The
//! engine itself only emits `tracing` events; installing a subscriber is left
//! to the host, which may call [`init_structured_logging`] once at startup.

use crate::constants::env;
use crate::engine::PreparedQuery;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = std::env::var(env::LOG_FORMAT).is_ok_and(|format| format.eq_ignore_ascii_case("json"));

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // A global subscriber may already be installed by the host
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
            return;
        }

        tracing::info!(
            environment = %environment,
            json = json,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var(env::ENVIRONMENT)
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for a prepared query
pub fn log_query_operation(operation: &str, query: &PreparedQuery, status: &str, details: Option<&str>) {
    tracing::info!(
        operation = %operation,
        key = %query.key,
        result_shape = ?query.result_shape,
        execution = ?query.execution,
        parameters = query.parameters.len(),
        paged = query.page.is_some(),
        status = %status,
        details = details,
        timestamp = %chrono::Utc::now().to_rfc3339(),
        "QUERY_OPERATION"
    );
}
