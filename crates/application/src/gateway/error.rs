//! Gateway error types

use thiserror::Error;

use crate::ports::HttpClientError;

/// Errors surfaced by the gateway.
///
/// The type is `Clone` because one refresh failure is delivered to every
/// request that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The transport failed; passed through unchanged.
    #[error(transparent)]
    Transport(#[from] HttpClientError),

    /// A public endpoint answered `401`. Carries the response body.
    #[error("authentication required: {body}")]
    AuthRequired {
        /// Response body of the rejected call.
        body: String,
    },

    /// The refresh call did not succeed; the session is over.
    #[error("session refresh failed: {message}")]
    RefreshFailed {
        /// HTTP status of the refresh call, if it got that far.
        status: Option<u16>,
        /// Response body or transport error text.
        message: String,
    },

    /// A queued request gave up waiting for the refresh.
    #[error("gave up waiting for session refresh after {waited_ms}ms")]
    RefreshTimedOut {
        /// How long the request waited.
        waited_ms: u64,
    },

    /// The request leading the refresh was cancelled before it settled.
    #[error("session refresh was abandoned")]
    RefreshAbandoned,
}

impl GatewayError {
    /// Returns true if the caller should treat the session as ended and
    /// send the user back to the login flow.
    #[must_use]
    pub const fn ends_session(&self) -> bool {
        matches!(self, Self::RefreshFailed { .. } | Self::AuthRequired { .. })
    }
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
