//! Error types for Mock API

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Mock API operations
#[derive(Error, Debug)]
pub enum MockApiError {
    /// Endpoint the HTTP router cannot serve (`:` or `*` in a segment)
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Data directory could not be walked
    #[error("Discovery failed at '{path}': {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two data files map to the same endpoint
    #[error("Duplicate endpoint '{endpoint}': '{first}' and '{second}'")]
    DuplicateEndpoint {
        endpoint: String,
        first: String,
        second: String,
    },

    /// Schema or data file of a route is missing
    #[error("Missing file: {}", .0.display())]
    MissingFile(PathBuf),

    /// Schema parse or compile error
    #[error("Schema error: {0}")]
    Schema(String),

    /// Data file could not be loaded
    #[error("Data module error: {0}")]
    DataModule(String),

    /// Resolver lookup or evaluation error
    #[error("Resolver error: {0}")]
    Resolver(String),

    /// File watcher error
    #[error("Watch error: {0}")]
    Watch(String),

    /// Worker process management error
    #[error("Supervisor error: {0}")]
    Supervisor(String),

    /// HTTP server error
    #[error("Server error: {0}")]
    Server(String),

    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MockApiError {
    /// Returns true if this error only affects a single route
    ///
    /// Route errors are logged and the route is skipped; every other error is
    /// fatal for the process that raised it.
    pub fn is_route_error(&self) -> bool {
        matches!(
            self,
            MockApiError::MissingFile(_)
                | MockApiError::InvalidEndpoint { .. }
                | MockApiError::Schema(_)
                | MockApiError::DataModule(_)
                | MockApiError::Resolver(_)
                | MockApiError::Json(_)
                | MockApiError::Yaml(_)
        )
    }
}

/// Result type alias using MockApiError
pub type Result<T> = std::result::Result<T, MockApiError>;
