//! Push channel port

use async_trait::async_trait;
use patchgate_domain::{ChannelError, ChannelEvent, ConnectionState};
use tokio::sync::broadcast;

/// Port for the server push channel.
///
/// One channel instance is shared by everything in the process. `connect`
/// is idempotent; after a transport drop the implementation reconnects on
/// its own and publishes `connect`/`disconnect` events so subscribers can
/// restore server-side state.
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Starts the connection if it is not running yet.
    async fn connect(&self) -> Result<(), ChannelError>;

    /// Stops the connection and any reconnection attempts.
    async fn disconnect(&self);

    /// Sends an event. Events emitted while reconnecting are delivered once
    /// the connection is back.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotConnected`] if `connect` was never called.
    fn emit(&self, event: &str, payload: serde_json::Value) -> Result<(), ChannelError>;

    /// Subscribes to inbound events.
    fn events(&self) -> broadcast::Receiver<ChannelEvent>;

    /// Current connection state.
    fn state(&self) -> ConnectionState;
}
