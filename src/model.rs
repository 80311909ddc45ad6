//! Data models for the shortlink service
//!
//! This module defines the persisted [`ShortLink`] record and the request/response
//! shapes of the HTTP API.

use axum::http::HeaderValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest short code the service accepts on any route
pub const MAX_CODE_LENGTH: usize = 11;

/// A short code mapped to its target URL
///
/// Records are only ever mutated by visit-count increments. Expired records stay in
/// storage so their code is never handed out again.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShortLink {
    /// Unique alphanumeric code (e.g., "aZ3k9Q")
    pub code: String,

    /// The original URL the code redirects to
    pub target_url: String,

    /// Timestamp when this record was created
    pub created_at: DateTime<Utc>,

    /// When the link stops resolving; `None` means never
    pub expires_at: Option<DateTime<Utc>>,

    /// Number of successful resolutions
    #[serde(default)]
    pub visit_count: u64,
}

impl ShortLink {
    /// A link is active until its expiry instant, or forever without one
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at > now,
            None => true,
        }
    }
}

/// Codes shadowed by static routes under `/api`
pub const RESERVED_CODES: &[&str] = &["info", "shorten"];

/// Returns true for codes the allocator must never hand out
pub fn is_reserved_code(code: &str) -> bool {
    RESERVED_CODES.contains(&code)
}

/// Returns true when `url` can be sent back in a `Location` header
pub fn is_redirectable(url: &str) -> bool {
    !url.is_empty() && HeaderValue::from_str(url).is_ok()
}

/// Returns true when `code` matches `[a-zA-Z0-9]{1,11}`
pub fn is_valid_code(code: &str) -> bool {
    (1..=MAX_CODE_LENGTH).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Request payload for creating a new short link
///
/// # Example
/// ```json
/// {
///   "url": "https://example.com/very/long/url",
///   "expiration_in_minutes": 60
/// }
/// ```
#[derive(Deserialize, Debug)]
pub struct ShortenRequest {
    /// The original URL to be shortened, must be non-empty
    pub url: String,

    /// Lifetime of the link in minutes; 0 (the default) means it never expires
    #[serde(default)]
    pub expiration_in_minutes: i64,
}

/// Response returned after successfully creating a short link
#[derive(Serialize, Deserialize, Debug)]
pub struct ShortlinkResponse {
    pub shortlink: String,
}

/// Query parameters for `GET /api/info`
#[derive(Deserialize)]
pub struct InfoParams {
    pub shortlink: Option<String>,
}

/// Metadata returned by `GET /api/info`
#[derive(Serialize, Deserialize, Debug)]
pub struct ShortlinkInfo {
    pub shortlink: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub visit_count: u64,
}

impl From<ShortLink> for ShortlinkInfo {
    fn from(link: ShortLink) -> Self {
        Self {
            shortlink: link.code,
            url: link.target_url,
            created_at: link.created_at,
            expires_at: link.expires_at,
            visit_count: link.visit_count,
        }
    }
}
