use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracker::{RefreshPolicy, RuntimeOptions};

use crate::config::MIN_COUNTS_POLL_MILLIS;

/// Behavioral settings read from `tracker.toml`. Every field is optional.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Frames published per second
    pub tick_hz: u32,
    /// Wake-up period of the tick loop
    pub frame_millis: u64,
    /// Frames a prefecture stays highlighted after its count rises
    pub flash_ticks: u32,
    pub refresh: RefreshPolicy,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tick_hz: 6,
            frame_millis: 16,
            flash_ticks: 7,
            refresh: RefreshPolicy::Hourly,
        }
    }
}

impl DashboardConfig {
    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            tick_hz: self.tick_hz,
            poll_every: Duration::from_millis(self.frame_millis),
            refresh: self.refresh,
        }
    }

    /// How often a browser re-polls the counts fragment.
    ///
    /// Half a flash, so every highlight is caught by at least one poll, but
    /// never faster than frames are published.
    pub fn counts_poll_period(&self) -> Duration {
        let frame_millis = match self.tick_hz {
            0 => self.frame_millis.max(1),
            hz => 1000 / u64::from(hz),
        };
        let flash_millis = frame_millis * u64::from(self.flash_ticks.max(1));
        Duration::from_millis(
            (flash_millis / 2)
                .max(frame_millis)
                .max(MIN_COUNTS_POLL_MILLIS),
        )
    }
}

/// Loads the settings file. Returns `DashboardConfig::default()` if the file
/// doesn't exist; propagates other I/O and parse errors.
pub fn load(path: &Path) -> io::Result<DashboardConfig> {
    match fs::read_to_string(path) {
        Ok(content) => parse(&content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DashboardConfig::default()),
        Err(e) => Err(e),
    }
}

fn parse(content: &str) -> io::Result<DashboardConfig> {
    toml::from_str(content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
