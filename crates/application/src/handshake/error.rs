//! Handshake error types

use patchgate_domain::ChannelError;
use thiserror::Error;

use crate::api::ApiError;

/// Errors raised while driving the QR login flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    /// The server did not issue a code.
    #[error("failed to generate login code: {0}")]
    Generate(ApiError),

    /// Exchanging a confirmed code failed. The code stays active.
    #[error("login with confirmed code failed: {0}")]
    Login(ApiError),

    /// The push channel failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// There is no active code to wait on.
    #[error("no login code is active")]
    NoActiveCode,

    /// A new code cannot be requested in the current state.
    #[error("cannot request a login code: {0}")]
    InvalidState(&'static str),
}
