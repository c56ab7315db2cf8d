//! Error types for the API Gateway synchronization engine.
//!
//! The hierarchy follows the lifecycle of a run: configuration problems abort
//! before any remote call, validation problems are collected and reported
//! together, integration problems abort the affected resource, and remote
//! failures abort the run (except permission conflicts, which are swallowed
//! by the caller).

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the synchronization engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The definition failed schema or referential checks.
    #[error("Invalid definition:\n{}", .messages.join("\n"))]
    Validation {
        /// Every validation message, in the order they were found.
        messages: Vec<String>,
    },

    /// A referenced backend (function, VPC link, alias) is unusable.
    #[error("Integration error: {0}")]
    Integration(#[from] IntegrationError),

    /// A remote call failed.
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// The run deadline elapsed while a call was in flight.
    #[error("Deadline exceeded while waiting for {operation}; its outcome is unknown")]
    DeadlineExceeded {
        /// The operation that was in flight.
        operation: String,
    },

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The definition file was not found.
    #[error("Definition file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The definition could not be parsed.
    #[error("Failed to parse definition: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// A required option is missing or invalid.
    #[error("{option} must be specified")]
    MissingOption {
        /// Name of the option.
        option: String,
    },

    /// Environment variables are missing.
    #[error("Missing environment variables: {}", .names.join(", "))]
    MissingEnvVar {
        /// Names of the missing variables.
        names: Vec<String>,
    },

    /// A `${NAME}` placeholder had neither a binding nor an environment value.
    #[error("Binding name {name} is not defined")]
    UnboundVariable {
        /// The placeholder name.
        name: String,
    },

    /// A method declared an integration type this engine does not know.
    #[error("unknown integration type: {value}")]
    UnknownIntegrationType {
        /// The declared value.
        value: String,
    },

    /// A `KEY=VALUE` argument was malformed.
    #[error("Invalid key/value pair '{input}': expected KEY=VALUE")]
    InvalidKeyValue {
        /// The raw argument.
        input: String,
    },
}

/// Backend lookup failures for integrations.
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// The Lambda function does not exist.
    #[error("function {function} is not found")]
    FunctionNotFound {
        /// Function name.
        function: String,
    },

    /// A configured alias does not exist on the function.
    #[error("function {function} is missing aliases: {}", .aliases.join(", "))]
    AliasNotFound {
        /// Function name.
        function: String,
        /// Missing alias names.
        aliases: Vec<String>,
    },

    /// The VPC link does not exist.
    #[error("vpc link {vpc_link_id} is not found")]
    VpcLinkNotFound {
        /// VPC link id.
        vpc_link_id: String,
    },
}

/// Remote service failures.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The object already exists (e.g. a duplicate permission statement).
    #[error("{operation}: conflict: {message}")]
    Conflict {
        /// Remote operation name.
        operation: String,
        /// Message from the service.
        message: String,
    },

    /// The object does not exist.
    #[error("{operation}: not found: {message}")]
    NotFound {
        /// Remote operation name.
        operation: String,
        /// Message from the service.
        message: String,
    },

    /// The service throttled the call.
    #[error("{operation}: throttled: {message}")]
    Throttled {
        /// Remote operation name.
        operation: String,
        /// Message from the service.
        message: String,
    },

    /// Any other service failure.
    #[error("{operation} failed: {message}")]
    Service {
        /// Remote operation name.
        operation: String,
        /// Message from the service.
        message: String,
    },
}

/// Result type alias for synchronization operations.
pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this is a permission/creation conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Remote(RemoteError::Conflict { .. }))
    }

    /// Returns true if the remote object does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote(RemoteError::NotFound { .. }))
    }
}

impl ConfigError {
    /// Creates a missing-option error.
    #[must_use]
    pub fn missing(option: impl Into<String>) -> Self {
        Self::MissingOption {
            option: option.into(),
        }
    }
}

impl RemoteError {
    /// Creates a generic service error.
    #[must_use]
    pub fn service(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_every_problem() {
        let err = SyncError::Validation {
            messages: vec![String::from("first"), String::from("second")],
        };
        assert_eq!(err.to_string(), "Invalid definition:\nfirst\nsecond");
    }

    #[test]
    fn test_conflict_classification() {
        let err = SyncError::from(RemoteError::conflict("AddPermission", "exists"));
        assert!(err.is_conflict());
        assert!(!err.is_not_found());

        let err = SyncError::from(RemoteError::service("PutMethod", "boom"));
        assert!(!err.is_conflict());
    }
}
