//! Update requests queued on the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing status of an update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateRequestStatus {
    /// Queued.
    Pending,
    /// A worker picked it up.
    Processing,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

impl UpdateRequestStatus {
    /// Returns true once the request will not change anymore.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A request to update one app of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// Request id.
    pub id: String,
    /// Processing status.
    pub status: UpdateRequestStatus,
    /// Target game.
    pub game_id: String,
    /// Target Steam app.
    pub app_id: String,
    /// Requesting user.
    pub user_id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

/// Body for creating an update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUpdateRequest {
    /// Target game.
    pub game_id: String,
    /// Target Steam app.
    pub app_id: String,
}

/// Body for an update request filed on behalf of another user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSystemUpdateRequest {
    /// Target game.
    pub game_id: String,
    /// Target Steam app.
    pub app_id: String,
    /// User the request is filed for.
    pub user_id: String,
}
