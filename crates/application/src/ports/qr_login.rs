//! QR login endpoints port

use async_trait::async_trait;
use patchgate_domain::QrCodeGrant;

use crate::api::ApiError;

/// The two REST calls the QR handshake needs.
#[async_trait]
pub trait QrLoginService: Send + Sync {
    /// Requests a new login code.
    async fn generate_code(&self) -> Result<QrCodeGrant, ApiError>;

    /// Exchanges a confirmed code for session cookies.
    async fn login_with_code(&self, code: &str) -> Result<(), ApiError>;
}
