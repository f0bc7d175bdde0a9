use crate::config::ConfigError;
use crate::foundation::LifecycleState;
use thiserror::Error;

/// Core error type for the mapforge foundation
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Invalid lifecycle transition for '{component}': {from:?} -> {to:?}")]
    InvalidTransition {
        component: String,
        from: LifecycleState,
        to: LifecycleState,
    },

    #[error("Logging initialization failed: {message}")]
    Logging { message: String },
}

impl CoreError {
    /// Create a new logging error
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }

    /// Check if the error is a lifecycle transition error
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}
