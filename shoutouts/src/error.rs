//! Error types and HTTP response conversion
//!
//! Clients only ever see two outcomes from the resource: a 404 for an
//! addressed record that does not exist, and a generic 500 for everything
//! else. The raw cause of a 500 is logged, never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Body message of every 404 response
pub const NOT_FOUND_MESSAGE: &str = "Not Found";

/// Body message of every 500 response
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

// ============================================================================
// Structured Database Errors
// ============================================================================

/// Database operation being performed when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseOperation {
    /// Establishing a connection and selecting the database
    Connect,
    /// Running a filtered `find`
    Find,
    /// Looking up a single document by identifier
    FindOne,
    /// Running an aggregation pipeline
    Aggregate,
    /// Inserting a document
    Insert,
    /// Replacing a document
    Replace,
    /// Deleting a document
    Delete,
    /// Liveness ping
    Ping,
}

impl fmt::Display for DatabaseOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Find => write!(f, "find"),
            Self::FindOne => write!(f, "find_one"),
            Self::Aggregate => write!(f, "aggregate"),
            Self::Insert => write!(f, "insert"),
            Self::Replace => write!(f, "replace"),
            Self::Delete => write!(f, "delete"),
            Self::Ping => write!(f, "ping"),
        }
    }
}

/// Category of database error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseErrorKind {
    /// Server unreachable, DNS failure or I/O error
    ConnectionFailed,
    /// Credentials rejected
    Authentication,
    /// The server rejected or failed the command
    QueryFailed,
    /// A stored document did not have the expected shape
    TypeConversion,
    /// Invalid connection string or client option
    Configuration,
    /// Other/unknown error
    Other,
}

impl fmt::Display for DatabaseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Authentication => write!(f, "authentication"),
            Self::QueryFailed => write!(f, "query_failed"),
            Self::TypeConversion => write!(f, "type_conversion"),
            Self::Configuration => write!(f, "configuration"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured database error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseError {
    /// The operation being performed when the error occurred
    pub operation: DatabaseOperation,
    /// The category of error
    pub kind: DatabaseErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl DatabaseError {
    /// Create a new database error
    pub fn new(
        operation: DatabaseOperation,
        kind: DatabaseErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
        }
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(
            DatabaseOperation::Connect,
            DatabaseErrorKind::ConnectionFailed,
            message,
        )
    }

    /// Create a type conversion error for a document that could not be decoded
    pub fn type_conversion(operation: DatabaseOperation, message: impl Into<String>) -> Self {
        Self::new(operation, DatabaseErrorKind::TypeConversion, message)
    }

    /// Classify a MongoDB driver error
    pub fn from_driver(operation: DatabaseOperation, err: &mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        let kind = match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ConnectionPoolCleared { .. } => DatabaseErrorKind::ConnectionFailed,
            ErrorKind::Authentication { .. } => DatabaseErrorKind::Authentication,
            ErrorKind::InvalidArgument { .. } => DatabaseErrorKind::Configuration,
            ErrorKind::BsonDeserialization(_) | ErrorKind::BsonSerialization(_) => {
                DatabaseErrorKind::TypeConversion
            }
            ErrorKind::Command(_) | ErrorKind::Write(_) => DatabaseErrorKind::QueryFailed,
            _ => DatabaseErrorKind::Other,
        };

        Self::new(operation, kind, err.to_string())
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Database {} error during {}: {}",
            self.kind, self.operation, self.message
        )
    }
}

impl std::error::Error for DatabaseError {}

/// Result type alias using the service error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the service
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Structured database error with operation context
    #[error("{0}")]
    Database(DatabaseError),

    /// Path identifier is not a valid ObjectId
    #[error("Invalid identifier '{id}': {reason}")]
    InvalidId {
        /// The raw path segment
        id: String,
        /// Parser message
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Addressed record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status this error is answered with
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Generic, client-safe message
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            Error::NotFound(ref what) => {
                tracing::debug!("Not found: {}", what);
                ErrorResponse::new(NOT_FOUND_MESSAGE)
            }

            Error::Database(ref e) => {
                tracing::error!(
                    operation = %e.operation,
                    kind = %e.kind,
                    "FAIL database error: {}", e.message
                );
                ErrorResponse::new(INTERNAL_ERROR_MESSAGE)
            }

            ref other => {
                tracing::error!("FAIL {}", other);
                ErrorResponse::new(INTERNAL_ERROR_MESSAGE)
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<DatabaseError> for Error {
    fn from(err: DatabaseError) -> Self {
        Error::Database(err)
    }
}
