//! Configuration file handling.
//!
//! Configuration is stored in ~/.melodeez/config.yaml. Every field is
//! optional; missing fields fall back to library defaults and command-line
//! flags override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use melodeez_audio::ClipBounds;
use melodeez_search::{Metric, SearchConfig};
use serde::{Deserialize, Serialize};

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".melodeez";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model checkpoint (JSON).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<PathBuf>,

    /// Catalog artifact (JSON).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,

    /// Scratch workspace; a temporary directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<Metric>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_clip_secs: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_clip_secs: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_artifacts: Option<bool>,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

impl Config {
    /// Gets the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(DEFAULT_CONFIG_FILE))
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.config_path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    pub fn search_config(&self) -> SearchConfig {
        let defaults = SearchConfig::default();
        SearchConfig {
            metric: self.metric.unwrap_or(defaults.metric),
            max_distance: self.max_distance.unwrap_or(defaults.max_distance),
            max_results: defaults.max_results,
        }
    }

    /// Query duration bounds, defaulting to 5..60 seconds.
    pub fn clip_bounds(&self) -> anyhow::Result<ClipBounds> {
        let defaults = ClipBounds::default();
        let secs = |v: Option<f64>, default: Duration| -> anyhow::Result<Duration> {
            match v {
                Some(s) => Duration::try_from_secs_f64(s)
                    .map_err(|_| anyhow::anyhow!("invalid clip length {s}")),
                None => Ok(default),
            }
        };
        let bounds = ClipBounds::new(
            secs(self.min_clip_secs, defaults.min)?,
            secs(self.max_clip_secs, defaults.max)?,
        );
        if bounds.min > bounds.max {
            anyhow::bail!(
                "min_clip_secs ({:?}) exceeds max_clip_secs ({:?})",
                bounds.min,
                bounds.max
            );
        }
        Ok(bounds)
    }
}

/// Loads the config file, or an empty config if it does not exist.
pub fn load_config(custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => Config::default_config_path()
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };

    let mut cfg: Config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content)?
        }
    } else {
        Config::default()
    };
    cfg.config_path = config_path;
    Ok(cfg)
}
