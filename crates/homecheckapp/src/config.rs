//! # Configuration
//!
//! Homecheck configuration is declared with [`confique`] and resolved in
//! layers:
//!
//! 1. **Environment variables**: `HOMECHECK_PHOTO_QUALITY`, etc.
//! 2. **Data dir config**: `<data dir>/homecheck.toml`.
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! The data dir itself is chosen before any file can be read: an explicit path
//! wins, then `HOMECHECK_DATA_DIR`, then the OS data directory from
//! [`directories`].
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `data_dir` | OS data dir | Where the store keeps its collections |
//! | `photo_max_dimension` | `1920` | Longest edge of stored photos, in pixels |
//! | `photo_quality` | `80` | JPEG quality of stored photos (1-100) |
//! | `thumbnail_dimension` | `200` | Longest edge of thumbnails |
//! | `thumbnail_quality` | `60` | JPEG quality of thumbnails |
//! | `geolocation_timeout_ms` | `10000` | How long to wait for a position fix |
//! | `seed_defaults` | `true` | Seed starter templates into an empty store |

use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{HomecheckError, Result};

pub const CONFIG_FILE: &str = "homecheck.toml";
pub const DATA_DIR_ENV: &str = "HOMECHECK_DATA_DIR";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HomecheckConfig {
    /// Directory holding the store. Resolved before the config file is read,
    /// so only the environment can set it.
    #[config(env = "HOMECHECK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[config(default = 1920, env = "HOMECHECK_PHOTO_MAX_DIMENSION")]
    pub photo_max_dimension: u32,

    #[config(default = 80, env = "HOMECHECK_PHOTO_QUALITY")]
    pub photo_quality: u8,

    #[config(default = 200, env = "HOMECHECK_THUMBNAIL_DIMENSION")]
    pub thumbnail_dimension: u32,

    #[config(default = 60, env = "HOMECHECK_THUMBNAIL_QUALITY")]
    pub thumbnail_quality: u8,

    #[config(default = 10000, env = "HOMECHECK_GEOLOCATION_TIMEOUT_MS")]
    pub geolocation_timeout_ms: u64,

    /// Seed starter templates and settings into an empty store on init.
    #[config(default = true, env = "HOMECHECK_SEED_DEFAULTS")]
    pub seed_defaults: bool,
}

impl Default for HomecheckConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            photo_max_dimension: 1920,
            photo_quality: 80,
            thumbnail_dimension: 200,
            thumbnail_quality: 60,
            geolocation_timeout_ms: 10000,
            seed_defaults: true,
        }
    }
}

impl HomecheckConfig {
    /// Load the layered config for a data dir. A missing `homecheck.toml` is
    /// not an error.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let mut config = Self::builder()
            .env()
            .file(data_dir.join(CONFIG_FILE))
            .load()
            .map_err(|e| HomecheckError::Config(e.to_string()))?;
        config.data_dir = Some(data_dir.to_path_buf());
        Ok(config)
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.geolocation_timeout_ms)
    }
}

/// Pick the data dir: `explicit`, else `HOMECHECK_DATA_DIR`, else the OS
/// application data directory.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("com", "homecheck", "homecheck")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| HomecheckError::Config("could not determine a data directory".to_string()))
}
