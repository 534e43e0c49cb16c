//! Configuration module
//!
//! Raw settings arrive from an external loader (config file, environment, or
//! a host process handing over deserialized JSON). Validation turns them into
//! an immutable [`StaticConfig`] that the handler owns for its lifetime; no
//! handler is ever constructed from settings that fail validation.

use crate::vfs::Vfs;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fatal construction errors. Per-request failures are not represented here;
/// they map onto 403/404/500 inside the dispatcher.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configured root does not exist or is not a directory. The root is
    /// never created on the handler's behalf.
    #[error("root directory unavailable: {0}")]
    RootUnavailable(String),
    /// `errorPage404` was set but does not exist as a file under the root.
    #[error("custom 404 page missing: {0}")]
    ErrorPageMissing(String),
    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

/// Raw settings as the outside world provides them. Field names double as
/// the external camelCase surface via serde aliases.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub root: String,
    #[serde(alias = "directoryListingEnabled")]
    pub directory_listing_enabled: bool,
    /// Probe order for directory requests; first existing entry wins.
    #[serde(alias = "indexFiles")]
    pub index_files: Vec<String>,
    #[serde(alias = "spaMode")]
    pub spa_mode: bool,
    #[serde(alias = "spaIndexFile")]
    pub spa_index_file: String,
    /// Relative to the root; must exist at construction time.
    #[serde(alias = "errorPage404")]
    pub error_page_404: Option<String>,
    /// Dotted extension (`".css"`) or `"*"` -> literal Cache-Control value.
    #[serde(alias = "cacheControl")]
    pub cache_control: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            directory_listing_enabled: false,
            index_files: vec!["index.html".to_string(), "index.htm".to_string()],
            spa_mode: false,
            spa_index_file: "index.html".to_string(),
            error_page_404: None,
            cache_control: HashMap::new(),
        }
    }
}

impl Config {
    /// Load raw settings from a config file (extension optional, file may be
    /// absent) with `STATIQ_`-prefixed environment overrides.
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("STATIQ"))
            .set_default("root", ".")?
            .set_default("directory_listing_enabled", false)?
            .set_default("spa_mode", false)?
            .set_default("spa_index_file", "index.html")?
            .build()?;

        settings.try_deserialize().map_err(ConfigError::from)
    }

    /// Validate into an immutable [`StaticConfig`].
    ///
    /// Policy: a missing root is rejected with [`ConfigError::RootUnavailable`]
    /// rather than created. A configured `error_page_404` must already exist
    /// as a regular file under the root, or construction aborts with
    /// [`ConfigError::ErrorPageMissing`]. Existence checks only; nothing on
    /// disk is mutated.
    pub async fn validate(&self, vfs: &dyn Vfs) -> Result<StaticConfig, ConfigError> {
        let root = vfs
            .canonicalize(Path::new(&self.root))
            .await
            .map_err(|e| ConfigError::RootUnavailable(format!("{}: {e}", self.root)))?;
        let node = vfs
            .stat(&root)
            .await
            .map_err(|e| ConfigError::RootUnavailable(format!("{}: {e}", root.display())))?;
        if !node.is_dir {
            return Err(ConfigError::RootUnavailable(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let error_page_404 = match self.error_page_404.as_deref() {
            Some(rel) if !rel.is_empty() => {
                let page = root.join(rel.trim_start_matches('/'));
                match vfs.stat(&page).await {
                    Ok(n) if !n.is_dir => Some(page),
                    _ => {
                        return Err(ConfigError::ErrorPageMissing(page.display().to_string()));
                    }
                }
            }
            _ => None,
        };

        Ok(StaticConfig {
            root,
            directory_listing: self.directory_listing_enabled,
            index_files: self.index_files.clone(),
            spa_mode: self.spa_mode,
            spa_index_file: self.spa_index_file.clone(),
            error_page_404,
            cache_control: self.cache_control.clone(),
        })
    }
}

/// Validated settings, immutable after construction and safe to share across
/// concurrent requests without synchronization.
#[derive(Debug, Clone)]
pub struct StaticConfig {
    /// Canonical absolute base directory.
    pub root: PathBuf,
    pub directory_listing: bool,
    pub index_files: Vec<String>,
    pub spa_mode: bool,
    pub spa_index_file: String,
    /// Absolute path under root, verified to exist.
    pub error_page_404: Option<PathBuf>,
    pub cache_control: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemFs;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_surface() {
        let cfg = Config::default();
        assert_eq!(cfg.root, ".");
        assert!(!cfg.directory_listing_enabled);
        assert_eq!(cfg.index_files, vec!["index.html", "index.htm"]);
        assert!(!cfg.spa_mode);
        assert_eq!(cfg.spa_index_file, "index.html");
        assert_eq!(cfg.error_page_404, None);
        assert!(cfg.cache_control.is_empty());
    }

    #[test]
    fn deserializes_camel_case_json() {
        let cfg: Config = serde_json::from_str(
            r#"{
                "root": "/srv/www",
                "directoryListingEnabled": true,
                "indexFiles": ["default.html"],
                "spaMode": true,
                "spaIndexFile": "app.html",
                "errorPage404": "404.html",
                "cacheControl": {".css": "max-age=3600", "*": "max-age=600"}
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.root, "/srv/www");
        assert!(cfg.directory_listing_enabled);
        assert_eq!(cfg.index_files, vec!["default.html"]);
        assert!(cfg.spa_mode);
        assert_eq!(cfg.spa_index_file, "app.html");
        assert_eq!(cfg.error_page_404.as_deref(), Some("404.html"));
        assert_eq!(cfg.cache_control[".css"], "max-age=3600");
    }

    #[tokio::test]
    async fn missing_root_is_rejected() {
        let fs = MemFs::new();
        let cfg = Config {
            root: "/srv".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(&fs).await,
            Err(ConfigError::RootUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn missing_error_page_aborts_construction() {
        let mut fs = MemFs::new();
        fs.add_dir("/srv");
        let cfg = Config {
            root: "/srv".to_string(),
            error_page_404: Some("404.html".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(&fs).await,
            Err(ConfigError::ErrorPageMissing(_))
        ));
    }

    #[tokio::test]
    async fn error_page_is_resolved_under_root() {
        let mut fs = MemFs::new();
        fs.add_file("/srv/errors/404.html", "gone");
        let cfg = Config {
            root: "/srv".to_string(),
            error_page_404: Some("errors/404.html".to_string()),
            ..Config::default()
        };
        let validated = cfg.validate(&fs).await.unwrap();
        assert_eq!(
            validated.error_page_404,
            Some(PathBuf::from("/srv/errors/404.html"))
        );
        assert_eq!(validated.root, PathBuf::from("/srv"));
    }
}
