//! Engine.IO and Socket.IO packet codec.
//!
//! Every websocket text frame is one Engine.IO packet: a single digit type
//! followed by its data. Engine.IO `message` packets carry Socket.IO packets,
//! which use the same digit prefix, an optional namespace, an optional ack id
//! and a JSON body.

use patchgate_domain::ChannelError;
use serde::Deserialize;
use serde_json::Value;

/// Parameters the server announces in the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    /// Engine.IO session id.
    pub sid: String,
    /// Milliseconds between server pings.
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong.
    pub ping_timeout: u64,
    /// Largest payload the server accepts.
    #[serde(default)]
    pub max_payload: Option<u64>,
}

impl OpenHandshake {
    /// Silence after which the connection counts as dead.
    #[must_use]
    pub const fn liveness_window_ms(&self) -> u64 {
        self.ping_interval.saturating_add(self.ping_timeout)
    }
}

/// Transport-level packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    /// Session parameters, sent once by the server.
    Open(OpenHandshake),
    /// The peer closes the transport.
    Close,
    /// Heartbeat from the server.
    Ping,
    /// Heartbeat answer.
    Pong,
    /// Carries one Socket.IO packet.
    Message(String),
    /// Upgrade filler.
    Noop,
}

impl EnginePacket {
    /// Decodes one websocket text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Protocol`] for empty frames, unknown types
    /// and malformed `open` payloads.
    pub fn decode(frame: &str) -> Result<Self, ChannelError> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| ChannelError::Protocol("empty frame".to_string()))?;
        let data = chars.as_str();
        match kind {
            '0' => serde_json::from_str(data)
                .map(Self::Open)
                .map_err(|e| ChannelError::Protocol(format!("bad open packet: {e}"))),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping),
            '3' => Ok(Self::Pong),
            '4' => Ok(Self::Message(data.to_string())),
            '6' => Ok(Self::Noop),
            other => Err(ChannelError::Protocol(format!(
                "unknown engine packet type `{other}`"
            ))),
        }
    }

    /// Encodes the packet as a websocket text frame. Only packets a client
    /// sends are supported; `Open` encodes as its bare type digit.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Open(_) => "0".to_string(),
            Self::Close => "1".to_string(),
            Self::Ping => "2".to_string(),
            Self::Pong => "3".to_string(),
            Self::Message(data) => format!("4{data}"),
            Self::Noop => "6".to_string(),
        }
    }
}

/// Application-level packet on the default namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// Namespace connect request or acknowledgement.
    Connect(Option<Value>),
    /// Namespace disconnect.
    Disconnect,
    /// Named event.
    Event {
        /// Event name.
        name: String,
        /// First argument, or an array of all arguments if there are several.
        payload: Value,
        /// Acknowledgement id requested by the sender.
        ack_id: Option<u64>,
    },
    /// The server refused the namespace connection.
    ConnectError(Value),
}

impl SocketPacket {
    /// Creates an event packet without acknowledgement.
    #[must_use]
    pub fn event(name: impl Into<String>, payload: Value) -> Self {
        Self::Event {
            name: name.into(),
            payload,
            ack_id: None,
        }
    }

    /// Decodes the data of an Engine.IO `message` packet.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Protocol`] for unknown or unsupported packet
    /// types and malformed bodies.
    pub fn decode(data: &str) -> Result<Self, ChannelError> {
        let mut chars = data.chars();
        let kind = chars
            .next()
            .ok_or_else(|| ChannelError::Protocol("empty socket packet".to_string()))?;
        let rest = skip_namespace(chars.as_str());
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (ack, body) = rest.split_at(digits);
        let ack_id = if ack.is_empty() {
            None
        } else {
            ack.parse().ok()
        };

        match kind {
            '0' => Ok(Self::Connect(parse_optional(body)?)),
            '1' => Ok(Self::Disconnect),
            '2' => decode_event(body, ack_id),
            '4' => Ok(Self::ConnectError(parse_optional(body)?.unwrap_or(Value::Null))),
            '3' | '5' | '6' => Err(ChannelError::Protocol(format!(
                "unsupported socket packet type `{kind}`"
            ))),
            other => Err(ChannelError::Protocol(format!(
                "unknown socket packet type `{other}`"
            ))),
        }
    }

    /// Encodes the packet for the default namespace.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Connect(None) => "0".to_string(),
            Self::Connect(Some(auth)) => format!("0{auth}"),
            Self::Disconnect => "1".to_string(),
            Self::Event {
                name,
                payload,
                ack_id,
            } => {
                let args = Value::Array(vec![Value::String(name.clone()), payload.clone()]);
                match ack_id {
                    Some(id) => format!("2{id}{args}"),
                    None => format!("2{args}"),
                }
            }
            Self::ConnectError(value) => format!("4{value}"),
        }
    }

    /// Encodes the packet wrapped in an Engine.IO `message`.
    #[must_use]
    pub fn to_frame(&self) -> String {
        EnginePacket::Message(self.encode()).encode()
    }
}

/// Drops a `/namespace,` prefix.
fn skip_namespace(rest: &str) -> &str {
    if rest.starts_with('/') {
        rest.split_once(',').map_or("", |(_, tail)| tail)
    } else {
        rest
    }
}

fn parse_optional(body: &str) -> Result<Option<Value>, ChannelError> {
    if body.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| ChannelError::Protocol(format!("bad packet body: {e}")))
}

fn decode_event(body: &str, ack_id: Option<u64>) -> Result<SocketPacket, ChannelError> {
    let Some(Value::Array(mut args)) = parse_optional(body)? else {
        return Err(ChannelError::Protocol(
            "event body is not an array".to_string(),
        ));
    };
    if args.is_empty() {
        return Err(ChannelError::Protocol("event without a name".to_string()));
    }
    let Value::String(name) = args.remove(0) else {
        return Err(ChannelError::Protocol("event name is not a string".to_string()));
    };
    let payload = match args.len() {
        0 => Value::Null,
        1 => args.remove(0),
        _ => Value::Array(args),
    };
    Ok(SocketPacket::Event {
        name,
        payload,
        ack_id,
    })
}
