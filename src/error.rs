//! Error types for biolookup.
//!
//! Errors here are infrastructure failures: a database that cannot be
//! reached, a remote service answering with a non-success status, a
//! bootstrap file that does not parse. CURIE-resolution failures (unknown
//! prefix, unknown identifier) are never errors; they come back as a
//! [`LookupResult`](crate::model::LookupResult) with `success == false`.

use std::path::PathBuf;

use thiserror::Error;

use crate::backend::BackendKind;

/// Configuration errors raised while reading settings or building a registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset.
    #[error("Required environment variable '{name}' is not set")]
    MissingVar {
        /// Variable name.
        name: String,
    },

    /// A setting has a value that does not parse or is out of range.
    #[error("Invalid value '{value}' for '{name}': {reason}")]
    InvalidValue {
        /// Setting or variable name.
        name: String,
        /// The rejected value.
        value: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A table name that is not a plain SQL identifier.
    #[error("Invalid SQL table name '{name}'")]
    InvalidTableName {
        /// The rejected name.
        name: String,
    },

    /// A registry file or resource that cannot be used.
    #[error("Invalid registry: {reason}")]
    Registry {
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid-value error.
    #[must_use]
    pub fn invalid(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by backends.
///
/// None of these are recovered inside the crate. Callers decide whether to
/// retry; [`BackendError::is_retryable`] gives a hint.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Query or connection failure.
    #[cfg(feature = "sql")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Transport, timeout or decode failure talking to a remote service.
    #[cfg(feature = "remote")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A remote service answered with a non-success status.
    #[error("Remote lookup at {url} failed with status {status}")]
    RemoteStatus {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// Reading a bootstrap file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A bootstrap file row does not have the expected shape.
    #[error("Malformed data in {path} at line {line}: {reason}")]
    MalformedData {
        /// File being read.
        path: String,
        /// One-based line number.
        line: usize,
        /// What is wrong with the row.
        reason: String,
    },

    /// The backend does not implement this operation.
    #[error("Operation '{operation}' is not supported by the {backend} backend")]
    Unsupported {
        /// Backend that was asked.
        backend: BackendKind,
        /// Operation name.
        operation: &'static str,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BackendError {
    /// Wraps an I/O error with the path it happened on.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an unsupported-operation error.
    #[must_use]
    pub const fn unsupported(backend: BackendKind, operation: &'static str) -> Self {
        Self::Unsupported { backend, operation }
    }

    /// Returns true if this is an unsupported-operation error.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Returns true if repeating the same call might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            #[cfg(feature = "sql")]
            Self::Database(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
            #[cfg(feature = "remote")]
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::RemoteStatus { status, .. } => *status >= 500,
            Self::Io { .. }
            | Self::MalformedData { .. }
            | Self::Unsupported { .. }
            | Self::Config(_) => false,
        }
    }
}

/// Result type alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
