use crate::constants::{
    DATABASE_PATH, DEFAULT_MAX_SAMPLE_CANDIDATES, DEFAULT_PAGE_SIZE, DEFAULT_POOL_SIZE,
    DEFAULT_RADIUS_METERS, DEFAULT_SAMPLE_MULTIPLIER, MAX_PAGE_SIZE,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub debug: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file. Falls back to `$POIMAP_DATA_DIR/points.sqlite`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

impl DatabaseConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| DATABASE_PATH.clone())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: default_pool_size(),
        }
    }
}

/// Ordering applied to the direct (non-sampled) fetch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// category DESC, likes DESC, created_at DESC, id DESC
    #[default]
    Popularity,
    /// created_at DESC, id DESC
    Recent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    #[serde(default = "default_radius_meters")]
    pub default_radius_meters: f64,
    /// Sampling target is `page_size * sample_multiplier`.
    #[serde(default = "default_sample_multiplier")]
    pub sample_multiplier: u32,
    #[serde(default = "default_max_sample_candidates")]
    pub max_sample_candidates: u64,
    #[serde(default)]
    pub sort: SortOrder,
    /// Fixed seed for the sampler's overflow shuffle. Unset means entropy.
    #[serde(default)]
    pub sample_seed: Option<u64>,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_radius_meters() -> f64 {
    DEFAULT_RADIUS_METERS
}

fn default_sample_multiplier() -> u32 {
    DEFAULT_SAMPLE_MULTIPLIER
}

fn default_max_sample_candidates() -> u64 {
    DEFAULT_MAX_SAMPLE_CANDIDATES
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            default_radius_meters: default_radius_meters(),
            sample_multiplier: default_sample_multiplier(),
            max_sample_candidates: default_max_sample_candidates(),
            sort: SortOrder::default(),
            sample_seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

pub fn load_config(config_path: &Path) -> Config {
    if !config_path.exists() {
        return Config::default();
    }

    match fs::read_to_string(config_path) {
        Ok(content) => match serde_yaml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring unparseable config {:?}: {}", config_path, e);
                Config::default()
            }
        },
        Err(_) => Config::default(),
    }
}

pub fn save_default_config(config_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).map_err(|e| std::io::Error::other(e.to_string()))?;
    fs::write(config_path, yaml)
}
