//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A QR code status string was not recognized.
    #[error("unknown QR code status: {0}")]
    UnknownQrStatus(String),

    /// A settings value failed validation.
    #[error("invalid setting `{field}`: {message}")]
    InvalidSetting {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
