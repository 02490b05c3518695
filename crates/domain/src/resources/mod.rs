//! REST resources exposed by the dashboard API.

mod app;
mod game;
mod page;
mod patch_note;
mod subscription;
mod update;
mod user;

pub use app::{App, AppQuery};
pub use game::{Game, GameQuery};
pub use page::{ApiErrorBody, Page, Pagination};
pub use patch_note::{PatchNote, PatchNoteQuery};
pub use subscription::{CreateSubscription, Subscription};
pub use update::{
    CreateSystemUpdateRequest, CreateUpdateRequest, UpdateRequest, UpdateRequestStatus,
};
pub use user::{User, UserRole};
