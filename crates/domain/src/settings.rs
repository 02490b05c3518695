//! Client Settings Domain Model
//!
//! Connection and timing settings for the dashboard client. Loading them
//! from files and the environment is an infrastructure concern.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::{PushChannelConfig, ReconnectPolicy};
use crate::error::{DomainError, DomainResult};
use crate::request::DEFAULT_TIMEOUT_MS;

/// Settings shared by the REST client and the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Base URL of the API server, without the API prefix.
    pub api_url: String,
    /// Path prefix of every REST route.
    pub api_prefix: String,
    /// Mount path of the push channel.
    pub socket_path: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// How long a request queued behind a session refresh may wait, in
    /// milliseconds. Zero disables the bound.
    pub refresh_wait_timeout_ms: u64,
    /// Push channel connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Push channel reconnection behaviour.
    pub reconnect: ReconnectPolicy,
    /// User-Agent sent with REST calls.
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            api_prefix: "/api".to_string(),
            socket_path: "/socket.io".to_string(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            refresh_wait_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            reconnect: ReconnectPolicy::default(),
            user_agent: format!("Patchgate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientSettings {
    /// Creates settings for the given server with defaults for everything else.
    #[must_use]
    pub fn for_server(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Builds an absolute REST URL for a route such as `/games`.
    #[must_use]
    pub fn endpoint(&self, route: &str) -> String {
        let base = self.api_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        let route = route.trim_start_matches('/');
        if prefix.is_empty() {
            format!("{base}/{route}")
        } else {
            format!("{base}/{prefix}/{route}")
        }
    }

    /// Bound for requests queued behind a refresh, if any.
    #[must_use]
    pub const fn refresh_wait_timeout(&self) -> Option<Duration> {
        if self.refresh_wait_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.refresh_wait_timeout_ms))
        }
    }

    /// Derives the push channel configuration.
    #[must_use]
    pub fn push_channel(&self) -> PushChannelConfig {
        PushChannelConfig {
            url: self.api_url.clone(),
            path: self.socket_path.clone(),
            connect_timeout_ms: self.connect_timeout_ms,
            reconnect: self.reconnect.clone(),
        }
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> DomainResult<()> {
        let parsed = url::Url::parse(&self.api_url).map_err(|e| DomainError::InvalidSetting {
            field: "api_url",
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DomainError::InvalidSetting {
                field: "api_url",
                message: "must start with http:// or https://".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(DomainError::InvalidSetting {
                field: "request_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.connect_timeout_ms == 0 {
            return Err(DomainError::InvalidSetting {
                field: "connect_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
