//! # mapforge-core
//!
//! Foundation for the mapforge session layer: property overrides and typed
//! mapper settings, the build/finalize lifecycle state machine, and logging
//! bootstrap.

pub mod config;
pub mod errors;
pub mod foundation;
pub mod logging;

pub use config::{
    keys, ColumnStyle, ConfigError, ConfigResult, ConfigSource, MapperSettings, Properties,
    SettingsTrait,
};
pub use errors::CoreError;
pub use foundation::{LifecycleManager, LifecycleState};
pub use logging::{init_logging, targets, LoggingConfig};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get framework version
pub fn version() -> &'static str {
    VERSION
}
