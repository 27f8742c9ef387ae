//! Error types and handling for the request-security core.
//!
//! This module provides structured error responses with stable error codes and
//! automatic HTTP status code mapping. All errors implement `IntoResponse` and
//! serialize to JSON, so route handlers never leak stack traces or internal
//! error objects across the boundary.
//!
//! # Design
//!
//! This module uses an opaque `Error` struct paired with an `ErrorKind` enum,
//! following the `std::io::Error` pattern. The kind is what callers branch on;
//! the source can change without breaking consumers.
//!
//! The two crypto kinds deserve a note: [`ErrorKind::CryptoFormat`] and
//! [`ErrorKind::CryptoFailure`] stay distinguishable in-process (logging and
//! tests rely on it) but share one public error code and message, so clients
//! cannot tell a malformed payload from a wrong key.
//!
//! # Example
//!
//! ```rust
//! use replyguard::{Error, ErrorKind};
//!
//! let error = Error::invalid_input("rating must be between 1 and 5");
//!
//! match error.kind() {
//!     ErrorKind::InvalidInput => println!("bad request: {}", error),
//!     _ => println!("other error: {}", error),
//! }
//!
//! use axum::http::StatusCode;
//! assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The kind of error that occurred.
///
/// This enum categorizes errors for matching purposes. Use `Error::kind()`
/// to get the kind of an error.
///
/// # Stability
///
/// This enum is marked `#[non_exhaustive]`, so new variants may be added
/// in future versions without breaking existing code. Always include a
/// wildcard arm when matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Configuration error (invalid TOML, missing values, short passphrase).
    #[error("configuration error")]
    Configuration,

    /// Invalid input (failed validation, bad header, malformed request data).
    #[error("invalid input")]
    InvalidInput,

    /// Request rejected by a rate limiter.
    #[error("rate limit exceeded")]
    RateLimited,

    /// Encrypted payload did not have the expected shape.
    #[error("crypto error")]
    CryptoFormat,

    /// Encryption or decryption failed (wrong key, tampered ciphertext).
    #[error("crypto error")]
    CryptoFailure,

    /// The generation collaborator returned an error.
    #[error("generation error")]
    Generation,

    /// I/O error (file operations, network).
    #[error("I/O error")]
    Io,

    /// Internal/unexpected error.
    #[error("internal error")]
    Internal,
}

/// An error that can occur in the replyguard library.
///
/// This is an opaque error type that wraps an underlying error source.
/// Use [`Error::kind()`] to determine the category of error for matching,
/// and the `Display` implementation to get a human-readable message.
///
/// # Creating Errors
///
/// Use the convenience constructors for common cases:
///
/// ```rust
/// use replyguard::Error;
///
/// let err = Error::internal("unexpected state");
/// let err = Error::invalid_input("missing required field");
/// let err = Error::config("ENCRYPTION_SECRET must be at least 32 characters");
/// ```
///
/// Or use [`Error::new()`] for full control:
///
/// ```rust
/// use replyguard::{Error, ErrorKind};
///
/// let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
/// let err = Error::new(ErrorKind::Io, io_err);
/// ```
pub struct Error {
    kind: ErrorKind,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl Error {
    /// Creates a new error with the given kind and source.
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self {
            kind,
            source: error.into(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error code string for this error.
    ///
    /// This is a stable identifier suitable for client-side error handling.
    /// Note that both crypto kinds map to the same code so that the response
    /// does not reveal which failure mode occurred.
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ErrorKind::Configuration => "CONFIG_ERROR",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::CryptoFormat | ErrorKind::CryptoFailure => "CRYPTO_ERROR",
            ErrorKind::Generation => "GENERATION_ERROR",
            ErrorKind::Io => "IO_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::CryptoFormat | ErrorKind::CryptoFailure => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ErrorKind::Generation => StatusCode::BAD_GATEWAY,
            ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts the error into a structured error response.
    ///
    /// Crypto errors deliberately drop their message in favor of a fixed
    /// string; everything else keeps the Display text.
    pub fn to_error_response(&self) -> ErrorResponse {
        match self.kind {
            ErrorKind::CryptoFormat | ErrorKind::CryptoFailure => {
                ErrorResponse::new(self.error_code(), "Unable to process encrypted data")
            }
            _ => ErrorResponse::new(self.error_code(), self.to_string()),
        }
    }

    /// Consumes the error and returns the inner error source.
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.source
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, msg.into())
    }

    /// Creates an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, msg.into())
    }

    /// Creates a rate-limited error.
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, msg.into())
    }

    /// Creates a crypto format error (malformed encrypted payload).
    pub fn crypto_format(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::CryptoFormat, msg.into())
    }

    /// Creates a crypto failure error (wrong key, tampered data).
    pub fn crypto_failure(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::CryptoFailure, msg.into())
    }

    /// Creates a generation collaborator error.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Generation, msg.into())
    }

    /// Creates an I/O error from a message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, msg.into())
    }

    /// Creates an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, msg.into())
    }
}

// ============================================================================
// Trait implementations
// ============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = self.to_error_response();

        tracing::error!(
            error_code = %error_response.error_code,
            message = %self,
            status = %status.as_u16(),
            "Error occurred"
        );

        (status, Json(error_response)).into_response()
    }
}

// ============================================================================
// From implementations
// ============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Self::new(ErrorKind::Configuration, err)
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::new(ErrorKind::InvalidInput, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::InvalidInput, err)
    }
}

// ============================================================================
// ErrorResponse
// ============================================================================

/// Structured error response with error code and details.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Stable error code for client-side error handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Adds details to the error response.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
