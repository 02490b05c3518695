//! Dashboard user.

use serde::{Deserialize, Serialize};

/// Access level of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    /// Full access.
    Admin,
    /// Regular member.
    User,
    /// Read-only visitor.
    Guest,
}

/// The signed-in user as returned by `/users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User id.
    pub id: String,
    /// Messenger username.
    pub username: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Preferred language.
    #[serde(default)]
    pub language_code: Option<String>,
    /// Access level.
    pub role: UserRole,
}

impl User {
    /// Display name combining first and last name.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {last}", self.first_name),
            _ => self.first_name.clone(),
        }
    }
}
