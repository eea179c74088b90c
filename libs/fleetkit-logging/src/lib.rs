//! Logging bootstrap shared by every FleetKit service.
//!
//! Installs a global `tracing` subscriber with:
//! - an `EnvFilter` taken from `RUST_LOG`, falling back to the configured level
//! - a text or JSON formatter with source file and line numbers
//!
//! Call [`init_logging`] once at process start, before any client is built.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Name reported in the startup event.
    pub service_name: String,
    /// Default filter directive when `RUST_LOG` is unset, e.g. `info` or `fleetkit_registry=debug`.
    pub level: String,
    pub format: LogFormat,
    /// Record source file and line for each event.
    pub with_source: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            service_name: "fleetkit".to_owned(),
            level: "info".to_owned(),
            format: LogFormat::Text,
            with_source: true,
        }
    }
}

impl LoggingConfig {
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    #[must_use]
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter '{directive}': {source}")]
    InvalidFilter {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Build the filter: `RUST_LOG` wins, otherwise the configured level.
///
/// # Errors
/// Returns [`LoggingError::InvalidFilter`] when the configured level does not parse.
pub fn build_filter(cfg: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&cfg.level).map_err(|source| LoggingError::InvalidFilter {
        directive: cfg.level.clone(),
        source,
    })
}

/// Install the global subscriber.
///
/// # Errors
/// Returns an error if the filter is invalid or a global subscriber is already set.
pub fn init_logging(cfg: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(cfg)?;

    let result = match cfg.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_file(cfg.with_source)
                    .with_line_number(cfg.with_source),
            )
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(cfg.with_source)
                    .with_line_number(cfg.with_source),
            )
            .try_init(),
    };
    result.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        service = %cfg.service_name,
        format = ?cfg.format,
        "logging initialized"
    );
    Ok(())
}
