//! Types exchanged with the native update backend.

use serde::{Deserialize, Serialize};

/// Steam account used for authenticated downloads.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SteamCredentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Steam Guard code, when the account asked for one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub two_factor_code: Option<String>,
}

impl SteamCredentials {
    /// Creates credentials without a Steam Guard code.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            two_factor_code: None,
        }
    }
}

impl std::fmt::Debug for SteamCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SteamCredentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("two_factor_code", &self.two_factor_code.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Failure reported by the native backend.
///
/// The backend only returns messages; the well-known ones are classified so
/// callers can react (for example by prompting for a Steam Guard code).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The account needs a Steam Guard code.
    #[error("Steam Guard code required")]
    GuardCodeRequired,
    /// The Steam Guard code was rejected.
    #[error("Invalid Steam Guard code")]
    InvalidGuardCode,
    /// Username or password was rejected.
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// Any other failure.
    #[error("{0}")]
    Failed(String),
}

impl BackendError {
    /// Classifies a raw backend message.
    #[must_use]
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        match message.as_str() {
            "Steam Guard code required" => Self::GuardCodeRequired,
            "Invalid Steam Guard code" => Self::InvalidGuardCode,
            "Invalid username or password" => Self::InvalidCredentials,
            _ => Self::Failed(message),
        }
    }
}
