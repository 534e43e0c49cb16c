//! Path resolution module
//!
//! Maps a raw request path onto a filesystem classification, confining every
//! lookup to the configured root.

use crate::vfs::{FileNode, FsError, Vfs};
use percent_encoding::percent_decode_str;
use std::path::PathBuf;

/// Classification of a request path. `Missing` is a routing outcome, not a
/// failure; only `Error` carries a detail string (never shown to clients).
#[derive(Debug)]
pub enum Resolved {
    File(FileNode),
    Directory(FileNode),
    Missing,
    PermissionDenied,
    Error(String),
}

/// Ensure a request path starts with `/`. Empty and slash-less inputs are
/// handled here, before anything indexes into the string.
#[must_use]
pub fn normalize_request_path(raw: &str) -> String {
    if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{raw}")
    }
}

/// Resolves normalized request paths against a canonical root.
#[derive(Debug)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// `root` must already be canonical and absolute (validation guarantees
    /// this).
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Classify `path` (already normalized to start with `/`).
    pub async fn resolve(&self, vfs: &dyn Vfs, path: &str) -> Resolved {
        // Decode exactly once; undecodable paths cannot name anything on disk.
        let decoded = match percent_decode_str(path).decode_utf8() {
            Ok(d) => d.into_owned(),
            Err(_) => return Resolved::Missing,
        };

        let full = self.root.join(relative_from(&decoded));

        let canonical = match vfs.canonicalize(&full).await {
            Ok(p) => p,
            Err(FsError::NotFound) => return Resolved::Missing,
            Err(FsError::PermissionDenied) => return Resolved::PermissionDenied,
            Err(FsError::Other(detail)) => return Resolved::Error(detail),
        };

        // Symlinks must not lead outside the root.
        if !canonical.starts_with(&self.root) {
            tracing::warn!(
                path = %path,
                target = %canonical.display(),
                "blocked path resolving outside the root"
            );
            return Resolved::PermissionDenied;
        }

        match vfs.stat(&canonical).await {
            Ok(node) if node.is_dir => Resolved::Directory(node),
            Ok(node) => Resolved::File(node),
            Err(FsError::NotFound) => Resolved::Missing,
            Err(FsError::PermissionDenied) => Resolved::PermissionDenied,
            Err(FsError::Other(detail)) => Resolved::Error(detail),
        }
    }
}

/// Collapse a decoded URL path into a relative filesystem path. `..` pops a
/// segment but never climbs past the first, so the result always stays under
/// whatever it is joined to.
fn relative_from(decoded: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            _ => out.push(segment),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemFs;

    #[test]
    fn normalization_is_bounds_safe() {
        assert_eq!(normalize_request_path(""), "/");
        assert_eq!(normalize_request_path("a.txt"), "/a.txt");
        assert_eq!(normalize_request_path("/a.txt"), "/a.txt");
    }

    #[test]
    fn dot_segments_never_escape() {
        assert_eq!(relative_from("/../../etc/passwd"), PathBuf::from("etc/passwd"));
        assert_eq!(relative_from("/a/./b//c"), PathBuf::from("a/b/c"));
        assert_eq!(relative_from("/a/../b"), PathBuf::from("b"));
        assert_eq!(relative_from("/"), PathBuf::new());
    }

    fn sample_fs() -> MemFs {
        let mut fs = MemFs::new();
        fs.add_file("/srv/a.txt", "a");
        fs.add_dir("/srv/sub");
        fs.add_file("/etc/shadow", "x");
        fs
    }

    #[tokio::test]
    async fn classifies_files_directories_and_missing() {
        let fs = sample_fs();
        let resolver = PathResolver::new(PathBuf::from("/srv"));

        assert!(matches!(
            resolver.resolve(&fs, "/a.txt").await,
            Resolved::File(_)
        ));
        assert!(matches!(
            resolver.resolve(&fs, "/sub").await,
            Resolved::Directory(_)
        ));
        assert!(matches!(
            resolver.resolve(&fs, "/nope").await,
            Resolved::Missing
        ));
    }

    #[tokio::test]
    async fn traversal_attempts_stay_inside_root() {
        let fs = sample_fs();
        let resolver = PathResolver::new(PathBuf::from("/srv"));

        // Lexical traversal collapses to /srv/etc/shadow, which is missing.
        assert!(matches!(
            resolver.resolve(&fs, "/../etc/shadow").await,
            Resolved::Missing
        ));
        // Percent-encoded variant gets one decode pass, same outcome.
        assert!(matches!(
            resolver.resolve(&fs, "/%2e%2e/etc/shadow").await,
            Resolved::Missing
        ));
    }

    #[tokio::test]
    async fn symlink_escaping_root_is_forbidden() {
        let mut fs = sample_fs();
        fs.add_link("/srv/evil", "/etc/shadow");
        let resolver = PathResolver::new(PathBuf::from("/srv"));

        assert!(matches!(
            resolver.resolve(&fs, "/evil").await,
            Resolved::PermissionDenied
        ));
    }

    #[tokio::test]
    async fn denied_paths_surface_as_permission_denied() {
        let mut fs = sample_fs();
        fs.add_file("/srv/locked/f.txt", "f");
        fs.deny("/srv/locked");
        let resolver = PathResolver::new(PathBuf::from("/srv"));

        assert!(matches!(
            resolver.resolve(&fs, "/locked/f.txt").await,
            Resolved::PermissionDenied
        ));
    }
}
