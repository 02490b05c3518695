//! Refresh-exempt endpoint classification.

use url::Url;

/// Generates a fresh login code.
pub const QR_GENERATE_PATH: &str = "/auth/qr-code/generate";
/// Exchanges a confirmed code for a session.
pub const QR_LOGIN_PATH: &str = "/auth/qr-code/login";
/// Rotates the session cookies.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Set of path patterns that stay reachable without a session.
///
/// A `401` from one of these endpoints is final: it is reported to the caller
/// instead of triggering a refresh. The refresh endpoint itself is always part
/// of the set, otherwise a rejected refresh would try to refresh again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicEndpoints {
    patterns: Vec<String>,
}

impl PublicEndpoints {
    /// Creates the set with the given extra patterns on top of the refresh path.
    #[must_use]
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        if !patterns.iter().any(|p| p == REFRESH_PATH) {
            patterns.push(REFRESH_PATH.to_string());
        }
        Self { patterns }
    }

    /// Returns true if the URL targets a public endpoint.
    ///
    /// Matching is substring based on the URL path, so the patterns work
    /// regardless of the API prefix (`/api/auth/refresh` matches
    /// `/auth/refresh`). Query strings are ignored.
    #[must_use]
    pub fn is_public(&self, url: &str) -> bool {
        let path = Url::parse(url).map_or_else(
            |_| url.split('?').next().unwrap_or(url).to_string(),
            |parsed| parsed.path().to_string(),
        );
        self.patterns.iter().any(|pattern| path.contains(pattern.as_str()))
    }

    /// Returns the configured patterns.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for PublicEndpoints {
    fn default() -> Self {
        Self::new([QR_GENERATE_PATH, QR_LOGIN_PATH, REFRESH_PATH])
    }
}
