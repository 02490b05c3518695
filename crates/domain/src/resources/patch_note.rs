//! Patch notes published for game updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Release notes of one app version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchNote {
    /// Patch note id.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Version label, if the publisher gave one.
    #[serde(default)]
    pub version: Option<String>,
    /// When the patch shipped.
    pub release_date: DateTime<Utc>,
    /// Game the notes belong to.
    pub game_id: String,
    /// App the notes belong to.
    pub app_id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last edit.
    pub updated_at: DateTime<Utc>,
}

/// Filters for the patch note list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchNoteQuery {
    /// 1-based page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Only notes of this game.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    /// Only notes of this app.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_patch_note_without_version() {
        let note: PatchNote = serde_json::from_str(
            r#"{"id":"p1","title":"Hotfix","content":"Crash fixes","releaseDate":"2026-03-01T00:00:00Z",
                "gameId":"g1","appId":"730","createdAt":"2026-03-01T00:00:00Z","updatedAt":"2026-03-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(note.version, None);
        assert_eq!(note.app_id, "730");
    }

    #[test]
    fn test_query_uses_camel_case() {
        let query = PatchNoteQuery {
            game_id: Some("g1".to_string()),
            ..PatchNoteQuery::default()
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            serde_json::json!({"gameId": "g1"})
        );
    }
}
