//! Catalog configuration

use crate::AssetError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Asset catalog settings, supplied once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Folders scanned at startup and watched afterwards, in order.
    pub watch_folders: Vec<PathBuf>,
    /// Start the background watcher after the initial scan.
    pub watch: bool,
    /// Rate at which the runtime drains pending changes.
    pub tick_hz: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            watch_folders: vec![
                PathBuf::from("assets/textures"),
                PathBuf::from("assets/meshes"),
                PathBuf::from("assets/entities"),
            ],
            watch: true,
            tick_hz: 60,
        }
    }
}

impl CatalogConfig {
    pub fn with_folders<I, P>(folders: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            watch_folders: folders.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a JSON config file. Fields missing from the file keep their
    /// defaults.
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let text = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text).map_err(|err| AssetError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }
}
