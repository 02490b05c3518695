//! Push event routing.

use std::collections::HashMap;

use patchgate_domain::{
    ChannelEvent, QrStatusUpdate,
    channel::{EVENT_CONNECT, EVENT_DISCONNECT, EVENT_QR_CODE_STATUS},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// What an inbound event means for the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeSignal {
    /// The channel (re)connected.
    Connected,
    /// The channel dropped.
    Disconnected(String),
    /// Status update for a code.
    Status(QrStatusUpdate),
}

type Decoder = fn(&Value) -> Option<HandshakeSignal>;

/// Maps event names to payload decoders.
///
/// Built once per handshake; events without an entry are ignored.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    routes: HashMap<&'static str, Decoder>,
}

impl DispatchTable {
    /// Creates the table with the events the handshake listens to.
    #[must_use]
    pub fn new() -> Self {
        let routes: [(&'static str, Decoder); 3] = [
            (EVENT_CONNECT, decode_connect),
            (EVENT_DISCONNECT, decode_disconnect),
            (EVENT_QR_CODE_STATUS, decode_status),
        ];
        Self {
            routes: routes.into_iter().collect(),
        }
    }

    /// Returns true if the event has a route.
    #[must_use]
    pub fn handles(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// Decodes an event. Unknown events and malformed payloads yield `None`.
    #[must_use]
    pub fn dispatch(&self, event: &ChannelEvent) -> Option<HandshakeSignal> {
        let decode = self.routes.get(event.name.as_str())?;
        decode(&event.payload)
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::unnecessary_wraps)]
const fn decode_connect(_: &Value) -> Option<HandshakeSignal> {
    Some(HandshakeSignal::Connected)
}

#[allow(clippy::unnecessary_wraps)]
fn decode_disconnect(payload: &Value) -> Option<HandshakeSignal> {
    let reason = payload.as_str().unwrap_or("unknown");
    Some(HandshakeSignal::Disconnected(reason.to_string()))
}

fn decode_status(payload: &Value) -> Option<HandshakeSignal> {
    match QrStatusUpdate::deserialize(payload) {
        Ok(update) => Some(HandshakeSignal::Status(update)),
        Err(error) => {
            warn!(%error, %payload, "malformed qr code status event");
            None
        }
    }
}
