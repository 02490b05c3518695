//! Use cases driving the native update backend.

mod steam_login;
mod update_game;

pub use steam_login::{SteamLogin, SteamLoginOutcome, normalize_guard_code};
pub use update_game::{UpdateGame, UpdateGameInput, UpdateGameOutput};
