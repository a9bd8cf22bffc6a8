//! Telemetry - structured logging setup
//!
//! Thin wrapper over `tracing-subscriber`. Call [`init_tracing`] once at
//! startup; the `RUST_LOG` environment variable overrides the configured
//! filter.

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

/// Errors from telemetry initialization.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log filter directive was invalid
    #[error("invalid log filter: {message}")]
    InvalidFilter {
        /// Parser error detail
        message: String,
    },

    /// A global subscriber was already installed
    #[error("tracing subscriber already initialized")]
    AlreadyInitialized,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name included in log output
    pub service_name: String,
    /// Default filter directive when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "strata".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Override the service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Override the default log filter.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
/// Returns [`TelemetryError`] if the filter is invalid or a subscriber is
/// already installed (tests install their own).
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| TelemetryError::InvalidFilter {
            message: e.to_string(),
        })?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|_| TelemetryError::AlreadyInitialized)?;

    tracing::info!(service = %config.service_name, "telemetry initialized");
    Ok(())
}
