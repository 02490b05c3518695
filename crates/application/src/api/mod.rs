//! Typed REST client on top of the request gateway.

mod client;
mod error;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
