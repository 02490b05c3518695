//! Games tracked by the dashboard.

use serde::{Deserialize, Serialize};

/// A game with one or more Steam apps behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Game id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Cover image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Latest known build version.
    #[serde(default)]
    pub version: Option<u64>,
}

/// Filters for the game list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameQuery {
    /// 1-based page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Filter by Steam app id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    /// Filter by Steam app name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    /// Filter by game name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
