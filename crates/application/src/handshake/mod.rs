//! QR-code login handshake.
//!
//! A short-lived code is generated over REST and shown to the user. A second
//! device confirms it, and the server pushes the status change over the
//! push channel. On confirmation the code is exchanged for session cookies.

mod dispatch;
mod error;
mod qr_handshake;
mod state;

pub use dispatch::{DispatchTable, HandshakeSignal};
pub use error::HandshakeError;
pub use qr_handshake::QrHandshake;
pub use state::HandshakeState;
