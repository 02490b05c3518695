//! Patchgate Application - Ports, session handling and use cases
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for external dependencies)
//! - The request gateway with single-flight session refresh
//! - The QR login handshake
//! - The typed REST client and the cached user session
//! - Use cases driving the native update backend

pub mod api;
pub mod gateway;
pub mod handshake;
pub mod ports;
pub mod session;
pub mod use_cases;

pub use api::{ApiClient, ApiError, ApiResult};
pub use gateway::{GatewayConfig, GatewayError, GatewayResult, RequestGateway};
pub use handshake::{HandshakeError, HandshakeState, QrHandshake};
pub use ports::{
    Clock, HttpClient, HttpClientError, PushChannel, QrLoginService, SessionListener,
    UpdateBackend,
};
pub use session::AuthSession;
pub use use_cases::{
    SteamLogin, SteamLoginOutcome, UpdateGame, UpdateGameInput, UpdateGameOutput,
};
