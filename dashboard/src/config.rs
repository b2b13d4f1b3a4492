//! Behavioral constants for polling and chart rendering.

/// Floor for the counts fragment's re-poll period
pub const MIN_COUNTS_POLL_MILLIS: u64 = 100;

/// Days shown on the per-prefecture daily chart
pub const DAILY_CHART_DAYS: usize = 60;

pub const SETTINGS_FILE: &str = "tracker.toml";
