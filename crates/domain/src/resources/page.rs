//! Pagination and error envelopes.

use serde::{Deserialize, Serialize};

/// Page selection for list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Pagination {
    /// Selects a page with the given size.
    #[must_use]
    pub const fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Current page number.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
    /// Total number of items.
    pub total: u64,
    /// Total number of pages.
    pub page_count: u32,
}

impl<T> Page<T> {
    /// Returns true if there are pages after this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.page_count
    }
}

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// Human-readable message.
    pub message: String,
    /// HTTP status echoed by the server.
    #[serde(default)]
    pub status_code: u16,
    /// Short error name.
    #[serde(default)]
    pub error: String,
}
