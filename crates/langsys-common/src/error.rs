//! Error types and utilities for the Langsys client

use thiserror::Error;

/// Result type alias for Langsys operations
pub type Result<T> = std::result::Result<T, LangsysError>;

/// Main error type for Langsys operations
#[derive(Error, Debug)]
pub enum LangsysError {
    /// Configuration related errors (missing project id, API key, ...)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network transport errors (unreachable host, timeout, ...)
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Langsys API returned an unexpected status or malformed envelope
    #[error("Langsys API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Authorization failure (401): bad project id or API key
    #[error("Authorization error: {message}")]
    Auth { message: String },

    /// Validation failure (422): the server rejected the submitted data
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: Vec<String>,
    },

    /// A remote payload did not have the expected shape
    #[error("Data shape error: {message}")]
    DataShape { message: String },

    /// Local persistence errors
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with custom message
    #[error("{message}")]
    Generic {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl LangsysError {
    /// Create a new generic error with a custom message
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Generic {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new generic error with a custom message and source
    pub fn with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Generic {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new network error with source
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new API error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api {
            message: msg.into(),
            status_code: None,
            source: None,
        }
    }

    /// Create a new API error with HTTP status code
    pub fn api_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::Api {
            message: msg.into(),
            status_code: Some(status),
            source: None,
        }
    }

    /// Create a new authorization error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth {
            message: msg.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            errors: Vec::new(),
        }
    }

    /// Create a new validation error carrying the server's error list
    pub fn validation_with_errors(msg: impl Into<String>, errors: Vec<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            errors,
        }
    }

    /// Create a new data shape error
    pub fn data_shape(msg: impl Into<String>) -> Self {
        Self::DataShape {
            message: msg.into(),
        }
    }

    /// Create a new storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new storage error with source
    pub fn storage_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether retrying the failed operation later can reasonably succeed.
    /// Authorization and validation failures are terminal for the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Api { .. } | Self::Io(_)
        )
    }
}

// Error conversion implementations for external types

/// Classify a reqwest error into the Langsys taxonomy
impl From<reqwest::Error> for LangsysError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("Request timeout", err)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err)
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                401 => Self::auth("Project id or API key rejected"),
                422 => Self::validation("Server rejected request data"),
                code => Self::Api {
                    message: format!("HTTP error: {}", code),
                    status_code: Some(code),
                    source: Some(Box::new(err)),
                },
            }
        } else {
            Self::network_with_source("Network request failed", err)
        }
    }
}

/// Convert from sled::Error to LangsysError
impl From<sled::Error> for LangsysError {
    fn from(err: sled::Error) -> Self {
        Self::storage_with_source("Persistence operation failed", err)
    }
}
