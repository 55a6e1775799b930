//! Typed error handling for the request listing
//!
//! # Error Categories
//!
//! - [`QueryError`]: the listing query could not be built (unknown sort key)
//! - [`SessionError`]: session storage failures
//! - [`StorageError`]: record store failures
//! - [`RequestError`]: malformed HTTP input
//! - [`ConfigError`]: configuration parsing and validation, reported at
//!   startup rather than per request
//!
//! Every [`ListingError`] maps to an HTTP status and a stable error code,
//! and renders as a JSON body through axum's `IntoResponse`.
//!
//! # Example
//!
//! ```rust,ignore
//! match view.get_objects(Some(25), Some("bogus"), None, None, &[]).await {
//!     Err(ListingError::Query(QueryError::UnknownOrderBy { order_by })) => {
//!         eprintln!("cannot order by {}", order_by);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//!     Ok(rows) => println!("{} rows", rows.len()),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type for the request listing
#[derive(Debug)]
pub enum ListingError {
    /// Query construction errors
    Query(QueryError),

    /// Session storage errors
    Session(SessionError),

    /// Record store errors
    Storage(StorageError),

    /// HTTP/Request errors
    Request(RequestError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for ListingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingError::Query(e) => write!(f, "{}", e),
            ListingError::Session(e) => write!(f, "{}", e),
            ListingError::Storage(e) => write!(f, "{}", e),
            ListingError::Request(e) => write!(f, "{}", e),
            ListingError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ListingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListingError::Query(e) => Some(e),
            ListingError::Session(e) => Some(e),
            ListingError::Storage(e) => Some(e),
            ListingError::Request(e) => Some(e),
            ListingError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ListingError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ListingError::Query(e) => e.status_code(),
            ListingError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ListingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ListingError::Request(e) => e.status_code(),
            ListingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ListingError::Query(e) => e.error_code(),
            ListingError::Session(_) => "SESSION_ERROR",
            ListingError::Storage(_) => "STORAGE_ERROR",
            ListingError::Request(e) => e.error_code(),
            ListingError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ListingError::Query(QueryError::UnknownOrderBy { order_by }) => {
                Some(serde_json::json!({ "order_by": order_by }))
            }
            _ => None,
        }
    }

    /// Wrap a record store failure
    pub fn storage(backend: &str, err: anyhow::Error) -> Self {
        ListingError::Storage(StorageError::QueryError {
            backend: backend.to_string(),
            message: err.to_string(),
        })
    }
}

impl IntoResponse for ListingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Query Errors
// =============================================================================

/// Errors raised while building the listing query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The sort key is not one of the orderable fields
    UnknownOrderBy { order_by: String },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::UnknownOrderBy { order_by } => {
                write!(f, "Unknown order_by: \"{}\"", order_by)
            }
        }
    }
}

impl std::error::Error for QueryError {}

impl QueryError {
    /// Unknown sort keys surface as server errors
    pub fn status_code(&self) -> StatusCode {
        match self {
            QueryError::UnknownOrderBy { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::UnknownOrderBy { .. } => "UNKNOWN_ORDER_BY",
        }
    }
}

impl From<QueryError> for ListingError {
    fn from(err: QueryError) -> Self {
        ListingError::Query(err)
    }
}

// =============================================================================
// Session Errors
// =============================================================================

/// Errors related to session storage
#[derive(Debug)]
pub enum SessionError {
    /// The session backend failed
    Backend { message: String },

    /// The stored slot could not be decoded
    CorruptSlot { key: String, message: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Backend { message } => write!(f, "Session backend error: {}", message),
            SessionError::CorruptSlot { key, message } => {
                write!(f, "Session slot '{}' is corrupt: {}", key, message)
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<SessionError> for ListingError {
    fn from(err: SessionError) -> Self {
        ListingError::Session(err)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to record store backends
#[derive(Debug)]
pub enum StorageError {
    /// Query execution error
    QueryError { backend: String, message: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::QueryError { backend, message } => {
                write!(f, "{} query error: {}", backend, message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for ListingError {
    fn from(err: StorageError) -> Self {
        ListingError::Storage(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Configuration file not found
    FileNotFound { path: String },

    /// IO error while reading configuration
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
            ConfigError::FileNotFound { path } => {
                write!(f, "Configuration file not found: {}", path)
            }
            ConfigError::IoError { message } => write!(f, "IO error: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to HTTP requests
#[derive(Debug)]
pub enum RequestError {
    /// Invalid request body
    InvalidBody { message: String },

    /// Invalid query string
    InvalidQuery { message: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidBody { message } => {
                write!(f, "Invalid request body: {}", message)
            }
            RequestError::InvalidQuery { message } => {
                write!(f, "Invalid query string: {}", message)
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::InvalidBody { .. } => StatusCode::BAD_REQUEST,
            RequestError::InvalidQuery { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::InvalidBody { .. } => "INVALID_BODY",
            RequestError::InvalidQuery { .. } => "INVALID_QUERY",
        }
    }
}

impl From<RequestError> for ListingError {
    fn from(err: RequestError) -> Self {
        ListingError::Request(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<tera::Error> for ListingError {
    fn from(err: tera::Error) -> Self {
        ListingError::Internal(format!("template rendering failed: {}", err))
    }
}

/// A specialized Result type for listing operations
pub type ListingResult<T> = Result<T, ListingError>;
