//! Authenticated request gateway.
//!
//! Every API call goes through [`RequestGateway::execute`]. A `401` on a
//! protected endpoint triggers one session refresh shared by all callers
//! that hit `401` while it runs; each of them replays its request once the
//! refresh settles.

mod error;
mod refresh_state;
mod request_gateway;

pub use error::{GatewayError, GatewayResult};
pub use refresh_state::{PendingRequest, REFRESHED, RefreshOutcome, RefreshSnapshot, RefreshState};
pub use request_gateway::{GatewayConfig, RequestGateway};
