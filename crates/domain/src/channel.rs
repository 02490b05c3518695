//! Push channel types.
//!
//! The push channel is a long-lived bidirectional event connection to the
//! API server. It carries named events with JSON payloads in both directions.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Synthetic event published when the channel (re)connects.
pub const EVENT_CONNECT: &str = "connect";
/// Synthetic event published when the channel drops or is closed.
pub const EVENT_DISCONNECT: &str = "disconnect";
/// Inbound status update for a subscribed login code.
pub const EVENT_QR_CODE_STATUS: &str = "qrCodeStatus";
/// Outbound subscription to status updates of a login code.
pub const EVENT_SUBSCRIBE_QR_CODE: &str = "subscribeToQrCode";

/// Disconnect reason when the client closed the channel itself.
pub const REASON_CLIENT_DISCONNECT: &str = "io client disconnect";
/// Disconnect reason when the server closed the namespace.
pub const REASON_SERVER_DISCONNECT: &str = "io server disconnect";
/// Disconnect reason when reconnect attempts ran out.
pub const REASON_RECONNECT_FAILED: &str = "reconnect failed";

/// Reconnection behaviour after a transport drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Enable automatic reconnection.
    pub enabled: bool,
    /// Maximum consecutive attempts (0 for unlimited).
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds.
    pub backoff_base_ms: u64,
    /// Upper bound for the delay in milliseconds.
    pub backoff_max_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 0,
            backoff_base_ms: 500,
            backoff_max_ms: 10_000,
        }
    }
}

impl ReconnectPolicy {
    /// Returns true if another attempt is allowed after `attempt` failures.
    #[must_use]
    pub const fn allows(&self, attempt: u32) -> bool {
        self.enabled && (self.max_attempts == 0 || attempt < self.max_attempts)
    }

    /// Exponential delay before retry number `attempt` (1-based), capped.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let millis = self
            .backoff_base_ms
            .saturating_mul(1_u64 << shift)
            .min(self.backoff_max_ms);
        Duration::from_millis(millis)
    }
}

/// Push channel connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushChannelConfig {
    /// Base server URL (http://, https://, ws:// or wss://).
    pub url: String,
    /// Mount path of the event endpoint on the server.
    pub path: String,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Reconnection behaviour.
    pub reconnect: ReconnectPolicy,
}

impl PushChannelConfig {
    /// Create a configuration with default path and policies.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: "/socket.io".to_string(),
            connect_timeout_ms: 10_000,
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Get the connect timeout as Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Builds the websocket endpoint URL for the Engine.IO v4 transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is malformed or uses an unsupported
    /// scheme.
    pub fn websocket_url(&self) -> Result<Url, ChannelError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| ChannelError::InvalidUrl(format!("{e}: {}", self.url)))?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(ChannelError::InvalidUrl(format!(
                    "unsupported scheme `{other}`"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| ChannelError::InvalidUrl(format!("cannot use scheme {scheme}")))?;

        url.set_path(&format!("{}/", self.path.trim_end_matches('/')));
        url.set_query(Some("EIO=4&transport=websocket"));
        Ok(url)
    }
}

/// Push channel connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Not connected.
    #[default]
    Disconnected,
    /// Connection in progress.
    Connecting,
    /// Connected and ready.
    Connected,
    /// Reconnecting after a drop.
    Reconnecting,
    /// Gave up reconnecting.
    Failed,
}

impl ConnectionState {
    /// Check if the connection is active.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if connection is in progress.
    #[must_use]
    pub const fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting | Self::Reconnecting)
    }

    /// True when nothing will bring the channel back without a new
    /// `connect` call.
    #[must_use]
    pub const fn needs_connect(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed)
    }

    /// Get a human-readable status string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
            Self::Reconnecting => "Reconnecting...",
            Self::Failed => "Connection Failed",
        }
    }
}

/// A named event received on the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEvent {
    /// Event name.
    pub name: String,
    /// Event payload (`null` when the event carries none).
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ChannelEvent {
    /// Create an event.
    #[must_use]
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// The synthetic connect event.
    #[must_use]
    pub fn connected() -> Self {
        Self::new(EVENT_CONNECT, serde_json::Value::Null)
    }

    /// The synthetic disconnect event with a reason.
    #[must_use]
    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self::new(EVENT_DISCONNECT, serde_json::Value::String(reason.into()))
    }
}

/// Push channel errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// The transport dropped.
    #[error("Channel disconnected: {0}")]
    Disconnected(String),
    /// Send failed.
    #[error("Failed to send event: {0}")]
    SendFailed(String),
    /// The peer sent something that does not follow the protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),
    /// Timeout.
    #[error("Connection timeout")]
    Timeout,
    /// `connect` has not been called.
    #[error("Not connected")]
    NotConnected,
}
