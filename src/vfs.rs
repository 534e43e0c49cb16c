//! Filesystem capability module
//!
//! All disk access goes through the [`Vfs`] trait so the resolver and
//! dispatcher can run against an in-memory double in tests. [`RealFs`] is the
//! production backend over `tokio::fs`.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Per-request filesystem failure, mapped onto the response taxonomy by the
/// dispatcher. `NotFound` is a normal outcome, not an error condition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FsError {
    #[error("not found")]
    NotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for FsError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Other(err.to_string()),
        }
    }
}

/// Snapshot of one filesystem node, read fresh per request and discarded
/// after the response is built. Nothing is cached across requests.
#[derive(Debug, Clone)]
pub struct FileNode {
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub mode: u32,
}

/// One row of a directory enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Read-only filesystem capability: `stat`, `read`, `read_dir` and
/// `canonicalize` are everything the resolver and dispatcher need.
#[async_trait]
pub trait Vfs: Send + Sync {
    async fn stat(&self, path: &Path) -> Result<FileNode, FsError>;
    async fn read(&self, path: &Path) -> Result<Vec<u8>, FsError>;
    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntryInfo>, FsError>;
    async fn canonicalize(&self, path: &Path) -> Result<PathBuf, FsError>;
}

/// Production backend delegating to `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

#[async_trait]
impl Vfs for RealFs {
    async fn stat(&self, path: &Path) -> Result<FileNode, FsError> {
        let meta = fs::metadata(path).await?;
        Ok(FileNode {
            path: path.to_path_buf(),
            is_dir: meta.is_dir(),
            size: meta.len(),
            modified: modified_time(&meta),
            mode: permission_bits(&meta),
        })
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        Ok(fs::read(path).await?)
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntryInfo>, FsError> {
        let mut reader = fs::read_dir(path).await?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            // Entries that vanish mid-enumeration are skipped, not fatal.
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: meta.is_dir(),
                size: meta.len(),
                modified: modified_time(&meta),
            });
        }
        Ok(entries)
    }

    async fn canonicalize(&self, path: &Path) -> Result<PathBuf, FsError> {
        Ok(fs::canonicalize(path).await?)
    }
}

fn modified_time(meta: &std::fs::Metadata) -> DateTime<Utc> {
    meta.modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(unix)]
fn permission_bits(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
fn permission_bits(_meta: &std::fs::Metadata) -> u32 {
    0
}

/// Deterministic in-memory backend for tests: register files, directories,
/// symlinks and per-path permission denials, then hand it to the handler in
/// place of [`RealFs`].
#[derive(Debug, Default)]
pub struct MemFs {
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: HashSet<PathBuf>,
    links: HashMap<PathBuf, PathBuf>,
    denied: HashSet<PathBuf>,
    mtimes: HashMap<PathBuf, DateTime<Utc>>,
}

impl MemFs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file, creating every ancestor directory.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        let path = path.into();
        self.add_ancestors(&path);
        self.files.insert(path, content.into());
    }

    /// Register an (empty) directory, creating every ancestor.
    pub fn add_dir(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.add_ancestors(&path);
        self.dirs.insert(path);
    }

    /// Register a symlink resolving to `target`.
    pub fn add_link(&mut self, path: impl Into<PathBuf>, target: impl Into<PathBuf>) {
        let path = path.into();
        self.add_ancestors(&path);
        self.links.insert(path, target.into());
    }

    /// Make every access under `path` fail with `PermissionDenied`.
    pub fn deny(&mut self, path: impl Into<PathBuf>) {
        self.denied.insert(path.into());
    }

    /// Pin the modification time reported for `path`.
    pub fn set_modified(&mut self, path: impl Into<PathBuf>, modified: DateTime<Utc>) {
        self.mtimes.insert(path.into(), modified);
    }

    fn add_ancestors(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }

    fn is_denied(&self, path: &Path) -> bool {
        path.ancestors().any(|a| self.denied.contains(a))
    }

    fn modified_for(&self, path: &Path) -> DateTime<Utc> {
        self.mtimes.get(path).copied().unwrap_or_else(default_mtime)
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.dirs.contains(path)
    }
}

fn default_mtime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
}

#[async_trait]
impl Vfs for MemFs {
    async fn stat(&self, path: &Path) -> Result<FileNode, FsError> {
        if self.is_denied(path) {
            return Err(FsError::PermissionDenied);
        }
        if let Some(content) = self.files.get(path) {
            return Ok(FileNode {
                path: path.to_path_buf(),
                is_dir: false,
                size: content.len() as u64,
                modified: self.modified_for(path),
                mode: 0o644,
            });
        }
        if self.dirs.contains(path) {
            return Ok(FileNode {
                path: path.to_path_buf(),
                is_dir: true,
                size: 0,
                modified: self.modified_for(path),
                mode: 0o755,
            });
        }
        Err(FsError::NotFound)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        if self.is_denied(path) {
            return Err(FsError::PermissionDenied);
        }
        match self.files.get(path) {
            Some(content) => Ok(content.clone()),
            None if self.dirs.contains(path) => {
                Err(FsError::Other("is a directory".to_string()))
            }
            None => Err(FsError::NotFound),
        }
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntryInfo>, FsError> {
        if self.is_denied(path) {
            return Err(FsError::PermissionDenied);
        }
        if !self.dirs.contains(path) {
            return Err(FsError::NotFound);
        }
        let mut entries = Vec::new();
        let children = self
            .files
            .keys()
            .chain(self.dirs.iter())
            .filter(|p| p.parent() == Some(path));
        for child in children {
            let node = self.stat(child).await?;
            entries.push(DirEntryInfo {
                name: child
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                is_dir: node.is_dir,
                size: node.size,
                modified: node.modified,
            });
        }
        Ok(entries)
    }

    async fn canonicalize(&self, path: &Path) -> Result<PathBuf, FsError> {
        if self.is_denied(path) {
            return Err(FsError::PermissionDenied);
        }
        if let Some(target) = self.links.get(path) {
            return Ok(target.clone());
        }
        if self.exists(path) {
            Ok(path.to_path_buf())
        } else {
            Err(FsError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mem_fs_stat_and_read() {
        let mut fs = MemFs::new();
        fs.add_file("/srv/a.txt", "hello");

        let node = fs.stat(Path::new("/srv/a.txt")).await.unwrap();
        assert!(!node.is_dir);
        assert_eq!(node.size, 5);

        let root = fs.stat(Path::new("/srv")).await.unwrap();
        assert!(root.is_dir);

        assert_eq!(fs.read(Path::new("/srv/a.txt")).await.unwrap(), b"hello");
        assert_eq!(
            fs.stat(Path::new("/srv/missing")).await.unwrap_err(),
            FsError::NotFound
        );
    }

    #[tokio::test]
    async fn mem_fs_denial_covers_subtree() {
        let mut fs = MemFs::new();
        fs.add_file("/srv/secret/key.pem", "k");
        fs.deny("/srv/secret");

        assert_eq!(
            fs.read(Path::new("/srv/secret/key.pem")).await.unwrap_err(),
            FsError::PermissionDenied
        );
        assert_eq!(
            fs.canonicalize(Path::new("/srv/secret")).await.unwrap_err(),
            FsError::PermissionDenied
        );
    }

    #[tokio::test]
    async fn mem_fs_lists_direct_children_only() {
        let mut fs = MemFs::new();
        fs.add_file("/srv/a.txt", "a");
        fs.add_file("/srv/sub/b.txt", "b");

        let entries = fs.read_dir(Path::new("/srv")).await.unwrap();
        let mut names: Vec<_> = entries.iter().map(|e| e.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "sub"]);
    }

    #[tokio::test]
    async fn real_fs_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), b"content").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let fs = RealFs;
        let node = fs.stat(&dir.path().join("f.txt")).await.unwrap();
        assert!(!node.is_dir);
        assert_eq!(node.size, 7);

        assert_eq!(fs.read(&dir.path().join("f.txt")).await.unwrap(), b"content");

        let mut names: Vec<_> = fs
            .read_dir(dir.path())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["f.txt", "sub"]);

        assert_eq!(
            fs.stat(&dir.path().join("nope")).await.unwrap_err(),
            FsError::NotFound
        );
    }
}
