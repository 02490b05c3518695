//! Patchgate Domain - Core business types
//!
//! This crate defines the domain model for the Patchgate dashboard client.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod channel;
pub mod error;
pub mod request;
pub mod resources;
pub mod response;
pub mod settings;
pub mod steam;

pub use auth::{PublicEndpoints, QrCodeGrant, QrCodeStatus, QrLoginRequest, QrStatusUpdate};
pub use channel::{
    ChannelError, ChannelEvent, ConnectionState, PushChannelConfig, ReconnectPolicy,
};
pub use error::{DomainError, DomainResult};
pub use resources::{
    ApiErrorBody, App, AppQuery, CreateSubscription, CreateSystemUpdateRequest,
    CreateUpdateRequest, Game, GameQuery, Page, Pagination, PatchNote, PatchNoteQuery,
    Subscription, UpdateRequest, UpdateRequestStatus, User, UserRole,
};
pub use settings::ClientSettings;
pub use steam::{BackendError, SteamCredentials};
