use thiserror::Error;

/// Result type for settings and property loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired { field: String, hint: String },

    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Parsing error in {source_name}: {message}")]
    ParsingError { source_name: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Create a missing required field error
    pub fn missing_required(field: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingRequired {
            field: field.into(),
            hint: hint.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Create a parsing error for a named property source
    pub fn parsing(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParsingError {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Field name this error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingRequired { field, .. } | Self::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}
