//! Error types for Quarry

use thiserror::Error;

/// Boxed cause carried by wrapping error variants
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for Quarry operations
#[derive(Error, Debug)]
pub enum QuarryError {
    /// Required connection parameters are absent
    #[error("Missing parameters for '{system}': {}", .missing.join(", "))]
    MissingParameter { system: String, missing: Vec<String> },

    /// Establishing a connection failed
    #[error("Connection to '{system}' failed: {source}")]
    Connection {
        system: String,
        #[source]
        source: BoxError,
    },

    /// Tearing down a connection failed
    #[error("Disconnection from '{system}' failed: {source}")]
    Disconnection {
        system: String,
        #[source]
        source: BoxError,
    },

    /// Query execution failed
    #[error("Invalid query against '{system}': {source}")]
    InvalidQuery {
        system: String,
        #[source]
        source: BoxError,
    },

    /// No driver is registered under this identifier
    #[error("System '{0}' is not supported")]
    UnsupportedSystem(String),

    /// Parameters were supplied for an identifier the registry does not know
    #[error("System '{0}' is not recognized")]
    UnknownSystem(String),

    /// The driver implementation could not be constructed
    #[error("Failed to load driver for '{system}': {reason}")]
    DriverLoad { system: String, reason: String },

    /// A live connector already occupies this identifier
    #[error("Connector '{0}' is already connected")]
    AlreadyConnected(String),

    /// One or more connectors failed during shutdown
    #[error("Errors closing connectors: {}", join_errors(.0))]
    Teardown(Vec<QuarryError>),

    /// Configuration file parsing error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Environment variable not found
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_errors(errors: &[QuarryError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl QuarryError {
    /// Wrap a failure as a connection error, keeping an existing one as-is
    pub fn connection(system: impl Into<String>, err: impl Into<BoxError>) -> Self {
        let system = system.into();
        let err: BoxError = err.into();
        match err.downcast::<QuarryError>() {
            Ok(inner) => {
                if matches!(&*inner, QuarryError::Connection { system: s, .. } if *s == system) {
                    *inner
                } else {
                    QuarryError::Connection {
                        system,
                        source: inner,
                    }
                }
            }
            Err(source) => QuarryError::Connection { system, source },
        }
    }

    /// Wrap a failure as an invalid query error
    pub fn invalid_query(system: impl Into<String>, err: impl Into<BoxError>) -> Self {
        QuarryError::InvalidQuery {
            system: system.into(),
            source: err.into(),
        }
    }

    /// Wrap a failure as a disconnection error
    pub fn disconnection(system: impl Into<String>, err: impl Into<BoxError>) -> Self {
        QuarryError::Disconnection {
            system: system.into(),
            source: err.into(),
        }
    }

    /// The system identifier this error refers to, if any
    pub fn system(&self) -> Option<&str> {
        match self {
            QuarryError::MissingParameter { system, .. }
            | QuarryError::Connection { system, .. }
            | QuarryError::Disconnection { system, .. }
            | QuarryError::InvalidQuery { system, .. }
            | QuarryError::DriverLoad { system, .. } => Some(system),
            QuarryError::UnsupportedSystem(system)
            | QuarryError::UnknownSystem(system)
            | QuarryError::AlreadyConnected(system) => Some(system),
            _ => None,
        }
    }

    /// Returns true for failures raised while establishing a connection
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            QuarryError::Connection { .. }
                | QuarryError::MissingParameter { .. }
                | QuarryError::DriverLoad { .. }
                | QuarryError::AlreadyConnected(_)
        )
    }

    /// Returns true if this error stems from configuration rather than a live system
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            QuarryError::Config(_)
                | QuarryError::Validation(_)
                | QuarryError::EnvVarNotFound(_)
                | QuarryError::UnknownSystem(_)
                | QuarryError::UnsupportedSystem(_)
        )
    }
}

/// Result type alias using QuarryError
pub type Result<T> = std::result::Result<T, QuarryError>;

/// Error returned by driver implementations
///
/// Drivers map their native errors into this type so vendor error types
/// never cross the connector boundary.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct DriverError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl DriverError {
    /// Create a driver error from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a driver error that keeps the native error as its source
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
