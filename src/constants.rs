use once_cell::sync::Lazy;
use std::path::PathBuf;

pub static DATA_DIR: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("POIMAP_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./data"))
});

pub static CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| DATA_DIR.join("config.yaml"));
pub static DATABASE_PATH: Lazy<PathBuf> = Lazy::new(|| DATA_DIR.join("points.sqlite"));

/// Mean Earth radius used to turn a radius in meters into a central angle.
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

/// Reserved category value meaning "no filter". Never stored.
pub const CATEGORY_ALL: &str = "all";
pub const DEFAULT_CATEGORY: &str = "general";

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_RADIUS_METERS: f64 = 5000.0;
pub const DEFAULT_SAMPLE_MULTIPLIER: u32 = 5;
pub const DEFAULT_MAX_SAMPLE_CANDIDATES: u64 = 50_000;
pub const DEFAULT_POOL_SIZE: u32 = 10;
