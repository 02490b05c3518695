//! Session change notifications

use async_trait::async_trait;

/// Receives notice that a new session was established.
#[async_trait]
pub trait SessionListener: Send + Sync {
    /// Called after a login completed and session cookies are in place.
    async fn session_established(&self);
}
