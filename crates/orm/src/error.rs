//! Error types for session factory assembly
//!
//! Every fatal condition aborts the build and surfaces once to the caller of
//! `build`. Per-candidate scan failures are carried as [`ScanError`] values
//! inside the scan result and never abort anything.

use mapforge_core::{ConfigError, CoreError};
use std::fmt;
use thiserror::Error;

/// Boxed collaborator error
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for assembly operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Which kind of resource a parse failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Descriptor,
    Mapper,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Descriptor => f.write_str("config"),
            ResourceKind::Mapper => f.write_str("mapping"),
        }
    }
}

/// Fatal errors raised while assembling a session factory
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("An explicit configuration and a descriptor location can not be specified together")]
    ConfigConflict,

    #[error("Property '{field}' is required")]
    MissingRequired { field: String },

    #[error("Failed to open resource '{resource}': {source}")]
    ResourceUnreadable {
        resource: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {kind} resource '{resource}': {source}")]
    ParseFailure {
        kind: ResourceKind,
        resource: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed getting a database id: {source}")]
    DatabaseIdLookupFailure {
        #[source]
        source: BoxError,
    },

    #[error("Registration failed: {message}")]
    Registration { message: String },

    #[error("Failed to scan '{pattern}': {source}")]
    Scan {
        pattern: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid mapper settings: {0}")]
    Settings(#[from] ConfigError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] CoreError),
}

impl SessionError {
    /// Create a missing required input error
    pub fn missing_required(field: impl Into<String>) -> Self {
        Self::MissingRequired {
            field: field.into(),
        }
    }

    /// Create a registration error
    pub fn registration(message: impl Into<String>) -> Self {
        Self::Registration {
            message: message.into(),
        }
    }

    /// Wrap a parser failure with the identity of the resource
    pub fn parse_failure(kind: ResourceKind, resource: impl Into<String>, source: BoxError) -> Self {
        Self::ParseFailure {
            kind,
            resource: resource.into(),
            source,
        }
    }

    pub fn is_config_conflict(&self) -> bool {
        matches!(self, Self::ConfigConflict)
    }

    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::ParseFailure { .. })
    }

    /// Identity of the resource involved, for parse and I/O failures
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::ResourceUnreadable { resource, .. } | Self::ParseFailure { resource, .. } => {
                Some(resource)
            }
            _ => None,
        }
    }
}

/// Non-fatal failure for a single scan candidate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("Cannot read metadata of '{resource}'. Caused by {reason}")]
    MetadataUnreadable { resource: String, reason: String },

    #[error("Cannot load the '{type_name}'. Caused by {reason}")]
    LoadFailure { type_name: String, reason: String },
}

impl ScanError {
    /// The resource or type name the failure refers to
    pub fn subject(&self) -> &str {
        match self {
            ScanError::MetadataUnreadable { resource, .. } => resource,
            ScanError::LoadFailure { type_name, .. } => type_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_carries_identity_and_cause() {
        let err = SessionError::parse_failure(
            ResourceKind::Mapper,
            "mappers/user.xml",
            "unexpected token".into(),
        );

        assert!(err.is_parse_failure());
        assert_eq!(err.resource(), Some("mappers/user.xml"));
        assert_eq!(
            err.to_string(),
            "Failed to parse mapping resource 'mappers/user.xml': unexpected token"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_scan_error_subject() {
        let err = ScanError::LoadFailure {
            type_name: "a.b.Broken".to_string(),
            reason: "initializer failed".to_string(),
        };
        assert_eq!(err.subject(), "a.b.Broken");
    }
}
