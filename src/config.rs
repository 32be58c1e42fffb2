use std::path::{Path, PathBuf};

use eyre::Result;
use log::debug;
use serde::Deserialize;

use crate::captions::Strategy;
use crate::metadata::ThumbnailQuality;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub strategy: Option<Strategy>,
    pub languages: Option<Vec<String>>,
    pub proxies: Option<Vec<String>>,
    pub extractor: Option<Vec<String>>,
    pub extractor_timeout_secs: Option<u64>,
    pub oembed_url: Option<String>,
    pub thumbnail: Option<ThumbnailQuality>,
    pub default_format: Option<String>,
}

impl Config {
    /// Load config from ~/.config/ytscribe/config.toml if it exists
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load config from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytscribe")
        .join("config.toml")
}
