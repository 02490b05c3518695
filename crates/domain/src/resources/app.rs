//! Steam apps (depots) attached to games.

use serde::{Deserialize, Serialize};

/// A Steam app that can be updated on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    /// Steam app id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Icon URL.
    #[serde(default)]
    pub image: Option<String>,
}

/// Filters for the app list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppQuery {
    /// 1-based page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Filter by app name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Only apps of this game.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
}
