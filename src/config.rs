//! Application configuration management.
//!
//! Loads and saves the worker configuration: page origin, cache
//! generation naming, and the install manifest. Stored at
//! `~/.config/sitecache/config.json`; the cache buckets and the
//! deferred-sync queue live under `~/.cache/sitecache/`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "sitecache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

fn default_origin() -> String {
    // The site's preview origin.
    "http://localhost:4173".to_string()
}

fn default_app_name() -> String {
    "portfolio".to_string()
}

fn default_cache_version() -> String {
    "v2".to_string()
}

fn default_manifest() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/site.webmanifest",
        "/nklogo.webp",
        "/favicon.ico",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_cache_version")]
    pub cache_version: String,
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            app_name: default_app_name(),
            cache_version: default_cache_version(),
            manifest: default_manifest(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Root for cache buckets.
    pub fn bucket_root(&self) -> Result<PathBuf> {
        Ok(Self::cache_root()?.join("buckets"))
    }

    /// Directory for the deferred-sync queue. Lives beside the bucket
    /// root so activation cleanup never touches it.
    pub fn queue_dir(&self) -> Result<PathBuf> {
        Ok(Self::cache_root()?.join("queue"))
    }

    fn cache_root() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
