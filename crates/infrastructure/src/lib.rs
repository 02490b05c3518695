//! Patchgate Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus the settings loader.

pub mod adapters;
pub mod push;
pub mod settings;

pub use adapters::{ReqwestHttpClient, SystemClock};
pub use push::SocketIoChannel;
pub use settings::{SettingsError, default_settings_path, load_settings};
