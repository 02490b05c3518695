//! Update game use case.

use patchgate_domain::{BackendError, SteamCredentials};
use tracing::info;

use crate::ports::UpdateBackend;

/// Input for updating a game.
#[derive(Debug, Clone)]
pub struct UpdateGameInput {
    /// Steam app to update.
    pub app_id: u32,
    /// Steam account to use; `None` falls back to the account the backend
    /// remembers, and downloads anonymously if there is none.
    pub credentials: Option<SteamCredentials>,
}

/// Output from updating a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateGameOutput {
    /// Backend status message.
    pub message: String,
    /// Whether a Steam account was used.
    pub authenticated: bool,
}

/// Use case for running one game update on the backend.
pub struct UpdateGame<B: UpdateBackend> {
    backend: B,
}

impl<B: UpdateBackend> UpdateGame<B> {
    /// Creates a new `UpdateGame` use case.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Makes sure the download tool is installed, then updates the app.
    ///
    /// # Errors
    /// - Returns error if the download tool cannot be installed
    /// - Returns error if the backend fails the update
    pub async fn execute(&self, input: UpdateGameInput) -> Result<UpdateGameOutput, BackendError> {
        self.backend.ensure_steamcmd().await?;

        let credentials = match input.credentials {
            Some(credentials) => Some(credentials),
            None => self.backend.stored_credentials().await?,
        };
        let (message, authenticated) = match &credentials {
            Some(credentials) => (
                self.backend
                    .update_game_authenticated(input.app_id, credentials)
                    .await?,
                true,
            ),
            None => (self.backend.update_game(input.app_id).await?, false),
        };
        info!(app_id = input.app_id, authenticated, "game updated");

        Ok(UpdateGameOutput {
            message,
            authenticated,
        })
    }
}
