//! QR login code types

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Server-side status of a login code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QrCodeStatus {
    /// Waiting for a second device to confirm.
    Pending,
    /// Confirmed; the code may now be exchanged for a session.
    Confirmed,
    /// The server no longer accepts the code.
    Expired,
    /// The server does not know the subscribed code.
    NotFound,
}

impl QrCodeStatus {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Expired => "EXPIRED",
            Self::NotFound => "NOT_FOUND",
        }
    }
}

impl fmt::Display for QrCodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QrCodeStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "EXPIRED" => Ok(Self::Expired),
            "NOT_FOUND" => Ok(Self::NotFound),
            other => Err(DomainError::UnknownQrStatus(other.to_string())),
        }
    }
}

/// A freshly issued login code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeGrant {
    /// Opaque code rendered into the QR image.
    pub code: String,
    /// Instant after which the server rejects the code.
    pub expires_at: DateTime<Utc>,
}

impl QrCodeGrant {
    /// Time left until expiry, zero if already expired.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// Returns true if the code is expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Status update pushed by the server for a subscribed code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrStatusUpdate {
    /// The code this update refers to.
    #[serde(rename = "qrCode", alias = "code")]
    pub code: String,
    /// New status.
    pub status: QrCodeStatus,
}

/// Body of the code-for-session exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrLoginRequest {
    /// Confirmed code.
    pub code: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_grant_wire_format() {
        let grant: QrCodeGrant = serde_json::from_str(
            r#"{"code":"f3a1","expiresAt":"2026-01-01T00:00:05.000Z"}"#,
        )
        .unwrap();
        assert_eq!(grant.code, "f3a1");
        assert_eq!(
            grant.expires_at,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 5).unwrap()
        );
    }

    #[test]
    fn test_grant_remaining() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let grant = QrCodeGrant {
            code: "c".to_string(),
            expires_at: now + chrono::Duration::milliseconds(5_000),
        };
        assert_eq!(grant.remaining(now), Duration::from_millis(5_000));
        assert!(!grant.is_expired(now));

        let later = now + chrono::Duration::seconds(6);
        assert_eq!(grant.remaining(later), Duration::ZERO);
        assert!(grant.is_expired(later));
    }

    #[test]
    fn test_status_update_accepts_both_field_names() {
        let pushed: QrStatusUpdate =
            serde_json::from_str(r#"{"qrCode":"x","status":"NOT_FOUND"}"#).unwrap();
        assert_eq!(pushed.status, QrCodeStatus::NotFound);

        let aliased: QrStatusUpdate =
            serde_json::from_str(r#"{"code":"x","status":"CONFIRMED"}"#).unwrap();
        assert_eq!(aliased.code, "x");
        assert_eq!(aliased.status, QrCodeStatus::Confirmed);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("EXPIRED".parse::<QrCodeStatus>().unwrap(), QrCodeStatus::Expired);
        assert!("expired".parse::<QrCodeStatus>().is_err());
    }
}
