//! API client error types

use patchgate_domain::{ApiErrorBody, response::ResponseSpec};
use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors returned by [`super::ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The gateway failed before a usable response came back.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The server answered with a non-2xx status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server message, or the raw body when it is not an error envelope.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request body could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(String),
}

impl ApiError {
    /// Builds a status error from a non-2xx response.
    #[must_use]
    pub fn from_response(response: &ResponseSpec) -> Self {
        let message = response
            .json::<ApiErrorBody>()
            .map_or_else(|_| response.text(), |body| body.message);
        Self::Status {
            status: response.status,
            message,
        }
    }

    /// Returns true if the error means there is no valid session.
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        match self {
            Self::Gateway(error) => error.ends_session(),
            Self::Status { status, .. } => *status == 401,
            _ => false,
        }
    }
}

/// Result type alias for API calls.
pub type ApiResult<T> = Result<T, ApiError>;
