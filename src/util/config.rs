use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;
use tracing::{debug, warn};

use crate::domain::{BRECILIEN, CITIES};

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "PotionCraftCalculator";
const APP_NAME: &str = "PotionCraftCalculator";
const CONFIG_FILENAME: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "https://www.albion-online-data.com/api/v2/stats/prices/";

/// User-tunable settings. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Station return rate in percent for ordinary cities.
    pub default_return_rate: f64,
    /// Station return rate in percent for Brecilien.
    pub brecilien_return_rate: f64,
    pub cache_max_age_hours: u64,
    pub api_base_url: String,
    pub locations: Vec<String>,
    pub quality: u8,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_return_rate: 15.2,
            brecilien_return_rate: 24.8,
            cache_max_age_hours: 6,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            locations: CITIES.iter().map(|city| city.to_string()).collect(),
            quality: 1,
            batch_size: 50,
            batch_delay_ms: 500,
        }
    }
}

impl AppConfig {
    /// Return rate as a fraction (0.0 - 1.0) for crafting in `city`.
    pub fn return_rate_for(&self, city: &str) -> f64 {
        let percent = if city == BRECILIEN {
            self.brecilien_return_rate
        } else {
            self.default_return_rate
        };
        percent / 100.0
    }

    pub fn cache_max_age(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_max_age_hours * 60 * 60)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Load from `path`, or the platform config dir when `None`.
/// Missing or broken files fall back to defaults.
pub fn load_config(path: Option<&Path>) -> AppConfig {
    let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
        return AppConfig::default();
    };
    if !path.exists() {
        debug!("[config] No config at {}, using defaults", path.display());
        return AppConfig::default();
    }

    match fs::read_to_string(&path)
        .map_err(ConfigError::from)
        .and_then(|data| serde_json::from_str::<AppConfig>(&data).map_err(ConfigError::from))
    {
        Ok(config) => config,
        Err(err) => {
            warn!("[config] Ignoring {}: {err}", path.display());
            AppConfig::default()
        }
    }
}

pub fn save_config(path: Option<&Path>, config: &AppConfig) -> Result<PathBuf, ConfigError> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(default_config_path)
        .ok_or(ConfigError::StorageUnavailable)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(&path, json)?;
    Ok(path)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config directory unavailable")]
    StorageUnavailable,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] SerdeError),
}
