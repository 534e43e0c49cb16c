//! MIME type table
//!
//! An explicit, immutable extension -> Content-Type table, built once and
//! owned by the handler instead of living in a process-global registry.

use std::collections::HashMap;

const FALLBACK: &str = "application/octet-stream";

const DEFAULT_TYPES: &[(&str, &str)] = &[
    // Text
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css"),
    ("txt", "text/plain; charset=utf-8"),
    ("md", "text/plain; charset=utf-8"),
    ("xml", "application/xml"),
    // JavaScript/WASM
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("json", "application/json"),
    ("wasm", "application/wasm"),
    // Images
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("webp", "image/webp"),
    // Video
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("ogg", "video/ogg"),
    ("ogv", "video/ogg"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    // Audio
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("flac", "audio/flac"),
    ("m4a", "audio/mp4"),
    // Fonts
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    ("eot", "application/vnd.ms-fontobject"),
    // Documents
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("gzip", "application/gzip"),
    ("tar", "application/x-tar"),
];

/// Extension -> Content-Type lookup, case-insensitive on the extension.
#[derive(Debug, Clone)]
pub struct MimeTable {
    types: HashMap<&'static str, &'static str>,
}

impl Default for MimeTable {
    fn default() -> Self {
        Self {
            types: DEFAULT_TYPES.iter().copied().collect(),
        }
    }
}

impl MimeTable {
    /// Content-Type for a bare file extension (no leading dot). Unknown and
    /// absent extensions fall back to `application/octet-stream`.
    #[must_use]
    pub fn content_type_for(&self, extension: Option<&str>) -> &'static str {
        match extension {
            Some(ext) => {
                let ext = ext.to_ascii_lowercase();
                self.types.get(ext.as_str()).copied().unwrap_or(FALLBACK)
            }
            None => FALLBACK,
        }
    }
}
