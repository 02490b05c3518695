//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod http_client;
mod push_channel;
mod qr_login;
mod session_listener;
mod update_backend;

pub use clock::Clock;
pub use http_client::{HttpClient, HttpClientError, HttpFuture};
pub use push_channel::PushChannel;
pub use qr_login::QrLoginService;
pub use session_listener::SessionListener;
pub use update_backend::UpdateBackend;
