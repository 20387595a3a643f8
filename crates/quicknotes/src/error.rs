//! Error types for quicknotes.
//!
//! This module defines all error types used throughout the quicknotes crate,
//! including the failure classes the flashcard store folds into its `error`
//! field.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for quicknotes operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Input Errors ===
    /// Malformed input to a store operation, rejected before any mutation.
    #[error("invalid input: {message}")]
    Validation {
        /// Description of the violated precondition.
        message: String,
    },

    // === Collection Errors ===
    /// The collection could not be reached or is misconfigured.
    #[error("{collection} unavailable: {message}")]
    RemoteUnavailable {
        /// Name of the collection.
        collection: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// The collection answered with a failure status.
    #[error("{collection} rejected the request ({status}): {message}")]
    RemoteRejected {
        /// Name of the collection.
        collection: &'static str,
        /// Status code reported by the collection.
        status: u16,
        /// Body or reason returned with the status.
        message: String,
    },

    /// The collection answered with a body that could not be decoded.
    #[error("{collection} returned a malformed response: {message}")]
    MalformedResponse {
        /// Name of the collection.
        collection: &'static str,
        /// Description of the decoding failure.
        message: String,
    },

    // === Summarizer Errors ===
    /// Summarizing text into a note failed.
    #[error("summarizer failed: {0}")]
    Summarizer(String),

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Generic Errors ===
    /// An operation timed out.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
    },

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for quicknotes operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a collection-unavailable error.
    #[must_use]
    pub fn unavailable(collection: &'static str, message: impl Into<String>) -> Self {
        Self::RemoteUnavailable {
            collection,
            message: message.into(),
        }
    }

    /// Create a collection-rejected error.
    #[must_use]
    pub fn rejected(collection: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::RemoteRejected {
            collection,
            status,
            message: message.into(),
        }
    }

    /// Create a malformed-response error.
    #[must_use]
    pub fn malformed(collection: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            collection,
            message: message.into(),
        }
    }

    /// Create a new summarizer error.
    #[must_use]
    pub fn summarizer(message: impl Into<String>) -> Self {
        Self::Summarizer(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a rejected precondition.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error came from a collection call.
    ///
    /// The store logs these as warnings when it settles them. Any other
    /// error reaching a settlement is logged as an error.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnavailable { .. }
                | Self::RemoteRejected { .. }
                | Self::MalformedResponse { .. }
                | Self::Timeout { .. }
                | Self::DatabaseOpen { .. }
                | Self::DatabaseQuery(_)
                | Self::DatabaseMigration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::validation("user id must not be empty");
        assert_eq!(err.to_string(), "invalid input: user id must not be empty");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_unavailable_display_names_collection() {
        let err = Error::unavailable("remote collection", "network error");
        let msg = err.to_string();
        assert!(msg.contains("remote collection"));
        assert!(msg.contains("network error"));
    }

    #[test]
    fn test_rejected_display_includes_status() {
        let err = Error::rejected("remote collection", 503, "service unavailable");
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("service unavailable"));
    }

    #[test]
    fn test_malformed_display() {
        let err = Error::malformed("remote collection", "expected array");
        assert!(err.to_string().contains("malformed"));
    }

    #[test]
    fn test_is_validation() {
        assert!(Error::validation("empty").is_validation());
        assert!(!Error::internal("bug").is_validation());
    }

    #[test]
    fn test_is_remote() {
        assert!(Error::unavailable("remote collection", "down").is_remote());
        assert!(Error::rejected("remote collection", 500, "boom").is_remote());
        assert!(Error::malformed("remote collection", "bad").is_remote());
        assert!(Error::Timeout {
            operation: "upsert".to_string()
        }
        .is_remote());
        assert!(!Error::validation("empty").is_remote());
        assert!(!Error::summarizer("quota").is_remote());
        assert!(!Error::internal("held call dropped").is_remote());
    }

    #[test]
    fn test_summarizer_error() {
        let err = Error::summarizer("quota exceeded");
        assert_eq!(err.to_string(), "summarizer failed: quota exceeded");
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
            assert!(err.is_remote());
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "timeout_ms must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("timeout_ms"));
    }

    #[test]
    fn test_timeout_error_display() {
        let err = Error::Timeout {
            operation: "list notes".to_string(),
        };
        assert!(err.to_string().contains("list notes"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
