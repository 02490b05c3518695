//! Authentication domain types
//!
//! Sessions are cookie based: the server sets and rotates cookies on the QR
//! login and refresh endpoints, so the client never handles raw tokens.

mod endpoints;
mod qr;

pub use endpoints::{PublicEndpoints, QR_GENERATE_PATH, QR_LOGIN_PATH, REFRESH_PATH};
pub use qr::{QrCodeGrant, QrCodeStatus, QrLoginRequest, QrStatusUpdate};
