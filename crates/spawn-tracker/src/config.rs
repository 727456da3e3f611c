//! Run configuration and path resolution.
//!
//! Everything a run needs is gathered into a [`TrackerConfig`] at startup and
//! handed to the pipeline; library code never reads process-wide state.

use std::path::PathBuf;
use std::time::Duration;

use tracing::level_filters::LevelFilter;

/// Page the metric is scraped from.
pub const DEFAULT_URL: &str = "https://paradise2.casino";

/// Tabular metric store, relative to the working directory.
pub const DEFAULT_STORE_PATH: &str = "metric_data.csv";

/// Last rendered markup, kept for manual troubleshooting.
pub const DEFAULT_SNAPSHOT_PATH: &str = "debug_render.html";

/// Append-only log file.
pub const DEFAULT_LOG_PATH: &str = "scraper.log";

/// Time given to client-side scripts after navigation before markup is read.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(3);

/// Upper bound on the navigation itself.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Class-name fragments locating the metric in the rendered DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    /// Substring of the `class` attribute on the outer `div`.
    pub container: String,
    /// Substring of the `class` attribute on the nested `span`.
    pub inner: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            container: "online-spawn".to_string(),
            inner: "ml-1".to_string(),
        }
    }
}

/// Configuration for a single fetch-extract-persist run.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub url: String,
    pub markers: Markers,
    pub store_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub settle: Duration,
    pub navigation_timeout: Duration,
    /// Explicit browser binary; discovered when `None`.
    pub chromium_path: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            markers: Markers::default(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            settle: DEFAULT_SETTLE,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            chromium_path: None,
        }
    }
}

/// Logging setup consumed by [`crate::telemetry::init`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub path: PathBuf,
    /// Maximum level recorded when `RUST_LOG` is unset.
    pub level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_LOG_PATH),
            level: LevelFilter::INFO,
        }
    }
}

/// Resolve the metric store path.
///
/// An explicit path wins, then `SPAWN_TRACKER_STORE`, then the default.
pub fn resolve_store_path(explicit: Option<PathBuf>) -> PathBuf {
    resolve_path(explicit, "SPAWN_TRACKER_STORE", DEFAULT_STORE_PATH)
}

/// Resolve the log file path.
///
/// An explicit path wins, then `SPAWN_TRACKER_LOG`, then the default.
pub fn resolve_log_path(explicit: Option<PathBuf>) -> PathBuf {
    resolve_path(explicit, "SPAWN_TRACKER_LOG", DEFAULT_LOG_PATH)
}

fn resolve_path(explicit: Option<PathBuf>, env_key: &str, default: &str) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }

    if let Ok(env_path) = std::env::var(env_key) {
        if !env_path.is_empty() {
            return PathBuf::from(env_path);
        }
    }

    PathBuf::from(default)
}
