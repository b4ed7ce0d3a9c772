//! Configuration types for wikisync.
//!
//! [`SyncConfig`] names the two trees and the client-side log namespace.
//! Persisted as TOML (typically at `~/.config/wikisync/config.toml` on Unix
//! systems).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::fs::FileSystem;
use crate::id::Id;

fn default_log_namespace() -> String {
    "log:transfers".to_string()
}

/// User-configurable settings for a primary/client tree pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Root of the primary (authoritative) tree
    pub primary_root: PathBuf,

    /// Root of the client (receiving) tree
    pub client_root: PathBuf,

    /// Client-side namespace for transfer log pages.
    /// Always excluded from scans since it is client-only by design.
    #[serde(default = "default_log_namespace")]
    pub log_namespace: String,

    /// Additional namespaces to skip entirely when scanning
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_namespaces: Vec<String>,

    /// Path of the primary's global changelog, relative to its root.
    /// Defaults to the host wiki's own location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_changelog: Option<PathBuf>,
}

impl SyncConfig {
    /// Create a config for the given tree pair with default settings
    pub fn new(primary_root: PathBuf, client_root: PathBuf) -> Self {
        Self {
            primary_root,
            client_root,
            log_namespace: default_log_namespace(),
            excluded_namespaces: Vec::new(),
            global_changelog: None,
        }
    }

    /// The log namespace as a normalized identifier
    pub fn log_namespace_id(&self) -> Id {
        Id::new(&self.log_namespace)
    }

    /// All namespaces a scan must skip: the configured exclusions plus the
    /// log namespace itself.
    pub fn scan_exclusions(&self) -> Vec<Id> {
        let mut ids: Vec<Id> = self.excluded_namespaces.iter().map(|s| Id::new(s)).collect();
        let log_ns = self.log_namespace_id();
        if !ids.contains(&log_ns) {
            ids.push(log_ns);
        }
        ids
    }

    /// Absolute path of the primary's global changelog
    pub fn global_changelog_path(&self) -> PathBuf {
        match &self.global_changelog {
            Some(rel) => self.primary_root.join(rel),
            None => self.primary_root.join("meta").join("_dokuwiki.changes"),
        }
    }

    /// Check that a transfer run can work with this configuration.
    ///
    /// The client tree's `pages/` directory must exist and be writable, and
    /// the log namespace must be set. Fails before any scan happens.
    pub fn preflight<FS: FileSystem>(&self, fs: &FS) -> Result<()> {
        if self.log_namespace.trim().is_empty() {
            return Err(SyncError::NoLogNamespace);
        }

        let pages = self.client_root.join("pages");
        if !fs.is_dir(&pages) {
            return Err(SyncError::ClientRoot {
                path: self.client_root.clone(),
                reason: "pages/ directory is missing".to_string(),
            });
        }

        // Probe writability with an atomic create + delete.
        let probe = pages.join(".wikisync.probe");
        fs.create_new(&probe, "")
            .and_then(|()| fs.delete_file(&probe))
            .map_err(|e| SyncError::ClientRoot {
                path: self.client_root.clone(),
                reason: format!("pages/ is not writable: {e}"),
            })?;

        Ok(())
    }

    /// Load config from a specific path
    pub fn load_from<FS: FileSystem>(fs: &FS, path: &Path) -> Result<Self> {
        let contents = fs
            .read_to_string(path)
            .map_err(|source| SyncError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        let config: SyncConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path
    pub fn save_to<FS: FileSystem>(&self, fs: &FS, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs.create_dir_all(parent)?;
            }
        }
        let contents = toml::to_string_pretty(self)?;
        fs.write_file(path, &contents)
            .map_err(|source| SyncError::FileWrite {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SyncConfig {
    /// Get the config file path (~/.config/wikisync/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wikisync").join("config.toml"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok_or(SyncError::NoConfigDir)?;
        let contents = std::fs::read_to_string(&path).map_err(|source| SyncError::FileRead {
            path: path.clone(),
            source,
        })?;
        let config: SyncConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(SyncError::NoConfigDir)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;

    #[test]
    fn test_preflight_requires_client_pages_dir() {
        let fs = InMemoryFileSystem::new();
        let config = SyncConfig::new(PathBuf::from("/primary"), PathBuf::from("/client"));

        let err = config.preflight(&fs).unwrap_err();
        assert!(matches!(err, SyncError::ClientRoot { .. }));

        fs.create_dir_all(Path::new("/client/pages")).unwrap();
        config.preflight(&fs).unwrap();
    }

    #[test]
    fn test_preflight_requires_log_namespace() {
        let fs = InMemoryFileSystem::new();
        fs.create_dir_all(Path::new("/client/pages")).unwrap();

        let mut config = SyncConfig::new(PathBuf::from("/primary"), PathBuf::from("/client"));
        config.log_namespace = "  ".to_string();

        assert!(matches!(
            config.preflight(&fs),
            Err(SyncError::NoLogNamespace)
        ));
    }

    #[test]
    fn test_scan_exclusions_include_log_namespace() {
        let mut config = SyncConfig::new(PathBuf::from("/p"), PathBuf::from("/c"));
        config.excluded_namespaces = vec!["playground".to_string()];

        let exclusions = config.scan_exclusions();
        assert!(exclusions.contains(&Id::new("playground")));
        assert!(exclusions.contains(&Id::new("log:transfers")));
    }

    #[test]
    fn test_config_round_trip() {
        let fs = InMemoryFileSystem::new();
        let mut config = SyncConfig::new(PathBuf::from("/primary"), PathBuf::from("/client"));
        config.excluded_namespaces = vec!["sandbox".to_string()];

        config
            .save_to(&fs, Path::new("/cfg/config.toml"))
            .unwrap();
        let loaded = SyncConfig::load_from(&fs, Path::new("/cfg/config.toml")).unwrap();

        assert_eq!(loaded.primary_root, PathBuf::from("/primary"));
        assert_eq!(loaded.log_namespace, "log:transfers");
        assert_eq!(loaded.excluded_namespaces, vec!["sandbox".to_string()]);
        assert_eq!(
            loaded.global_changelog_path(),
            PathBuf::from("/primary/meta/_dokuwiki.changes")
        );
    }
}
