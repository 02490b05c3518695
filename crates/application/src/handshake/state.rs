//! Handshake state machine states.

use chrono::{DateTime, Utc};

/// Where the QR login flow currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HandshakeState {
    /// No code requested yet, or the flow was abandoned.
    #[default]
    Idle,
    /// Waiting for the server to issue a code.
    CodeRequested,
    /// A code is displayed and waiting for confirmation.
    CodeActive {
        /// The active code.
        code: String,
        /// When the code stops being accepted.
        expires_at: DateTime<Utc>,
    },
    /// The second device confirmed; exchanging the code for a session.
    Confirmed {
        /// The confirmed code.
        code: String,
    },
    /// The code expired before it was confirmed.
    Expired {
        /// The expired code.
        code: String,
    },
    /// The server does not know the code.
    NotFound {
        /// The rejected code.
        code: String,
    },
    /// Session cookies are in place.
    Authenticated,
}

impl HandshakeState {
    /// Check if the flow is waiting on the server or the user.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(
            self,
            Self::CodeRequested | Self::CodeActive { .. } | Self::Confirmed { .. }
        )
    }

    /// Check if the flow reached a terminal state.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(
            self,
            Self::Expired { .. } | Self::NotFound { .. } | Self::Authenticated
        )
    }

    /// Check if a new code may be requested.
    #[must_use]
    pub const fn can_request_code(&self) -> bool {
        matches!(
            self,
            Self::Idle | Self::CodeActive { .. } | Self::Expired { .. } | Self::NotFound { .. }
        )
    }

    /// The code status events are matched against.
    #[must_use]
    pub fn active_code(&self) -> Option<&str> {
        match self {
            Self::CodeActive { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Get a user-friendly message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Idle => "Ready to sign in",
            Self::CodeRequested => "Requesting login code...",
            Self::CodeActive { .. } => "Scan the code to sign in",
            Self::Confirmed { .. } => "Code confirmed, signing in...",
            Self::Expired { .. } => "Login code expired",
            Self::NotFound { .. } => "Login code was not recognised",
            Self::Authenticated => "Signed in",
        }
    }
}
