//! Caching headers module
//!
//! Cache-Control policy lookup, HTTP date formatting, `ETag` generation and
//! conditional-request matching.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;

/// Applied when neither the exact extension nor the wildcard is configured.
pub const DEFAULT_CACHE_CONTROL: &str = "max-age=86400";

/// Extension -> Cache-Control directive lookup with `"*"` wildcard fallback.
/// Keys are dotted (`".css"`); the empty extension is a valid key too.
#[derive(Debug, Clone)]
pub struct CacheHeaderPolicy {
    rules: HashMap<String, String>,
}

impl CacheHeaderPolicy {
    #[must_use]
    pub fn new(rules: HashMap<String, String>) -> Self {
        Self { rules }
    }

    /// Precedence: exact extension, then `"*"`, then [`DEFAULT_CACHE_CONTROL`].
    #[must_use]
    pub fn value_for(&self, extension: &str) -> &str {
        if let Some(value) = self.rules.get(extension) {
            return value;
        }
        if let Some(value) = self.rules.get("*") {
            return value;
        }
        DEFAULT_CACHE_CONTROL
    }
}

/// Dotted extension of a path (`".css"`), or the empty string.
#[must_use]
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}

/// RFC 7231 HTTP date (always UTC, `GMT` suffix), for `Last-Modified`.
#[must_use]
pub fn http_date(t: DateTime<Utc>) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Quoted `ETag` from a fast non-cryptographic hash of the body.
#[must_use]
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("\"{:x}\"", hasher.finish())
}

/// `If-None-Match` matching: single value, comma-separated list, or `*`.
#[must_use]
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client| {
        client.split(',').any(|e| e.trim() == etag || e.trim() == "*")
    })
}

/// `If-Modified-Since` comparison at second granularity. Unparseable headers
/// are ignored (treated as modified).
#[must_use]
pub fn not_modified_since(if_modified_since: Option<&str>, modified: DateTime<Utc>) -> bool {
    let Some(raw) = if_modified_since else {
        return false;
    };
    let Ok(since) = DateTime::parse_from_rfc2822(raw) else {
        return false;
    };
    modified.timestamp() <= since.timestamp()
}
