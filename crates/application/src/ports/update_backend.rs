//! Native update backend port

use async_trait::async_trait;
use patchgate_domain::{BackendError, SteamCredentials};

/// Port for the native process that downloads game updates.
///
/// Each call either returns the backend's status message or fails with one.
#[async_trait]
pub trait UpdateBackend: Send + Sync {
    /// Installs the download tool if missing.
    async fn ensure_steamcmd(&self) -> Result<String, BackendError>;

    /// Updates an app with an anonymous login.
    async fn update_game(&self, app_id: u32) -> Result<String, BackendError>;

    /// Updates an app with a Steam account.
    async fn update_game_authenticated(
        &self,
        app_id: u32,
        credentials: &SteamCredentials,
    ) -> Result<String, BackendError>;

    /// Verifies a Steam account.
    async fn authenticate_steam(
        &self,
        credentials: &SteamCredentials,
    ) -> Result<String, BackendError>;

    /// Feeds a Steam Guard code into a running login.
    async fn submit_2fa_code(&self, code: &str) -> Result<(), BackendError>;

    /// Steam account remembered by the backend after a successful login.
    async fn stored_credentials(&self) -> Result<Option<SteamCredentials>, BackendError>;

    /// Forgets the remembered Steam account.
    async fn clear_stored_credentials(&self) -> Result<(), BackendError>;
}
