//! # Structured Logging
//!
//! Installs a `tracing` subscriber for applications embedding the session
//! layer, and maps the mapper log categories onto tracing targets.

use crate::config::MapperSettings;
use crate::errors::CoreError;
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tracing targets for the mapper log categories
pub mod targets {
    pub const BOOTSTRAP: &str = "mapforge::bootstrap";
    pub const SCAN: &str = "mapforge::scan";
    pub const RUNTIME: &str = "mapforge::runtime";
    pub const COMPILATION: &str = "mapforge::compilation";
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// Enable JSON structured logging (vs plain text)
    pub json_format: bool,
    /// Include file and line number information
    pub include_location: bool,
    /// Extra filter directives, e.g. "mapforge::scan=off"
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
            directives: Vec::new(),
        }
    }
}

impl LoggingConfig {
    /// Production logging: JSON, info level
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            json_format: true,
            ..Self::default()
        }
    }

    /// Development logging: text, debug level, with locations
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            include_location: true,
            ..Self::default()
        }
    }

    /// Silence every mapper log category the settings switch off
    pub fn from_settings(settings: &MapperSettings) -> Self {
        let mut config = Self::default();
        let categories = [
            (targets::BOOTSTRAP, settings.bootstrap_log_enabled()),
            (targets::SCAN, settings.scan_log_enabled()),
            (targets::RUNTIME, settings.runtime_log_enabled()),
            (targets::COMPILATION, settings.compilation_log_enabled()),
        ];
        for (target, enabled) in categories {
            if !enabled {
                config.directives.push(format!("{}=off", target));
            }
        }
        config
    }

    /// Add a filter directive
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// The full `EnvFilter` expression for this configuration
    pub fn filter_expression(&self) -> String {
        std::iter::once(self.level.as_str())
            .chain(self.directives.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Initialize structured logging. `RUST_LOG` takes precedence when set.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), CoreError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.filter_expression()))
        .map_err(|e| CoreError::logging(e.to_string()))?;

    let result = if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stdout)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .json(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stdout)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location),
            )
            .try_init()
    };
    result.map_err(|e| CoreError::logging(e.to_string()))?;

    tracing::info!(
        target: targets::BOOTSTRAP,
        "Structured logging initialized (level: {}, format: {})",
        config.level,
        if config.json_format { "JSON" } else { "text" }
    );
    Ok(())
}
