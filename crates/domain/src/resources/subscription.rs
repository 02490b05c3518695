//! Per-user update notification subscriptions.

use serde::{Deserialize, Serialize};

use super::{App, Game};

/// Whether the user is notified about updates of one app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Subscription id.
    pub id: String,
    /// False once the user opted out.
    pub is_subscribed: bool,
    /// Subscribed app.
    pub app: App,
    /// Game the app belongs to.
    pub game: Game,
}

/// Body for creating or toggling a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscription {
    /// Target game.
    pub game_id: String,
    /// Target app.
    pub app_id: String,
    /// Subscribe (`true`) or opt out (`false`).
    pub is_subscribed: bool,
}
