use std::{env, path::Path};

use anyhow::{Context, Result};

pub const DEFAULT_FEED: &str = "https://nagi-p.com/vaccination/prefecture.json";
pub const DEFAULT_PREFECTURES_PATH: &str = "data/prefectures.json";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

pub struct TrackerConfig {
    /// Time-series feed, either an `http(s)://` URL or a local file path
    pub feed: String,
    /// Prefecture metadata JSON
    pub prefectures_path: String,
    pub bind_addr: String,
}

impl TrackerConfig {
    pub fn load(manifest_dir: &Path) -> Result<Self> {
        #[cfg(debug_assertions)]
        {
            let dotenv = manifest_dir.join(".env");
            if dotenv.exists() {
                dotenvy::from_path(&dotenv).context("Can't read .env file")?;
            }
        }
        #[cfg(not(debug_assertions))]
        let _ = manifest_dir;

        Ok(Self::from_lookup(|key| env::var(key).ok()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            feed: lookup("VACCINATION_FEED").unwrap_or_else(|| DEFAULT_FEED.to_owned()),
            prefectures_path: lookup("PREFECTURES_PATH")
                .unwrap_or_else(|| DEFAULT_PREFECTURES_PATH.to_owned()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned()),
        }
    }
}

/// Load tracker config using the calling crate's manifest directory.
#[macro_export]
macro_rules! load_tracker_config {
    () => {
        $crate::config::TrackerConfig::load(std::path::Path::new(env!("CARGO_MANIFEST_DIR")))
    };
}
