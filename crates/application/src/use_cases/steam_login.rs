//! Steam account login use case.

use patchgate_domain::{BackendError, SteamCredentials};
use tracing::{info, warn};

use crate::ports::UpdateBackend;

/// Result of a Steam login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SteamLoginOutcome {
    /// The account is verified.
    Authenticated {
        /// Account name reported by the backend.
        account: String,
    },
    /// The account needs a Steam Guard code; retry with
    /// [`SteamLogin::execute_with_guard_code`].
    GuardCodeRequired,
}

/// Use case for verifying a Steam account on the backend.
pub struct SteamLogin<B: UpdateBackend> {
    backend: B,
}

impl<B: UpdateBackend> SteamLogin<B> {
    /// Creates a new `SteamLogin` use case.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Verifies the account.
    ///
    /// A Steam Guard challenge is reported as an outcome, not an error.
    ///
    /// # Errors
    /// Returns error if the backend rejects the account for any other reason.
    pub async fn execute(
        &self,
        credentials: &SteamCredentials,
    ) -> Result<SteamLoginOutcome, BackendError> {
        match self.backend.authenticate_steam(credentials).await {
            Ok(message) => {
                let account = account_from_message(&message).unwrap_or(&credentials.username);
                info!(account, "steam account verified");
                Ok(SteamLoginOutcome::Authenticated {
                    account: account.to_string(),
                })
            }
            Err(BackendError::GuardCodeRequired) => {
                info!("steam guard code required");
                Ok(SteamLoginOutcome::GuardCodeRequired)
            }
            Err(error) => {
                warn!(%error, "steam login failed");
                Err(error)
            }
        }
    }

    /// Retries the login with a Steam Guard code.
    ///
    /// # Errors
    /// Returns [`BackendError::InvalidGuardCode`] for an empty code, or the
    /// backend error.
    pub async fn execute_with_guard_code(
        &self,
        credentials: &SteamCredentials,
        code: &str,
    ) -> Result<SteamLoginOutcome, BackendError> {
        let credentials = SteamCredentials {
            two_factor_code: Some(normalize_guard_code(code)?),
            ..credentials.clone()
        };
        self.execute(&credentials).await
    }

    /// The Steam account the backend remembers, if any.
    ///
    /// # Errors
    /// Returns error if the backend cannot read its credential store.
    pub async fn remembered_account(&self) -> Result<Option<String>, BackendError> {
        Ok(self
            .backend
            .stored_credentials()
            .await?
            .map(|credentials| credentials.username))
    }

    /// Signs the Steam account out of the backend.
    ///
    /// # Errors
    /// Returns error if the backend cannot clear its credential store.
    pub async fn forget_account(&self) -> Result<(), BackendError> {
        self.backend.clear_stored_credentials().await?;
        info!("steam account forgotten");
        Ok(())
    }

    /// Feeds a Steam Guard code into an update that is waiting for one.
    ///
    /// # Errors
    /// Returns [`BackendError::InvalidGuardCode`] for an empty code, or the
    /// backend error.
    pub async fn submit_guard_code(&self, code: &str) -> Result<(), BackendError> {
        self.backend
            .submit_2fa_code(&normalize_guard_code(code)?)
            .await
    }
}

/// Strips everything but ASCII letters and digits and uppercases the rest.
///
/// # Errors
/// Returns [`BackendError::InvalidGuardCode`] if nothing is left.
pub fn normalize_guard_code(code: &str) -> Result<String, BackendError> {
    let normalized: String = code
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if normalized.is_empty() {
        Err(BackendError::InvalidGuardCode)
    } else {
        Ok(normalized)
    }
}

/// Extracts `name` from "... as name".
fn account_from_message(message: &str) -> Option<&str> {
    message
        .rsplit_once(" as ")
        .map(|(_, account)| account.trim())
        .filter(|account| !account.is_empty())
}
