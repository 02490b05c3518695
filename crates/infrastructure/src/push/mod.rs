//! Socket.IO push channel.
//!
//! Speaks Socket.IO v4 on top of Engine.IO v4 using the websocket transport
//! only. Long polling and binary attachments are not supported.

mod packet;
mod socket_io;

pub use packet::{EnginePacket, OpenHandshake, SocketPacket};
pub use socket_io::SocketIoChannel;
