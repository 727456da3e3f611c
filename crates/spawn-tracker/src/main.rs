// Copyright 2026 Spawn Tracker Contributors
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;

use spawn_tracker::config::{resolve_log_path, resolve_store_path, DEFAULT_SNAPSHOT_PATH};
use spawn_tracker::{
    pipeline, telemetry, ChromiumRenderer, LogConfig, RunOutcome, SnapshotRenderer,
    TrackerConfig,
};

#[derive(Parser)]
#[command(
    name = "spawn-tracker",
    about = "Record the live player count of a page, one sample per run",
    version
)]
struct Cli {
    /// Path to the CSV metric store.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Where to write the pretty-printed rendered page.
    #[arg(long, default_value = DEFAULT_SNAPSHOT_PATH)]
    snapshot: PathBuf,

    /// Append-only log file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (off, trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Debugging override for the fixed 3 s render wait, in milliseconds.
    #[arg(long, default_value = "3000", hide = true)]
    settle_ms: u64,

    /// Chromium binary to launch.
    #[arg(long)]
    chromium: Option<PathBuf>,

    /// Extract from a saved HTML file instead of launching a browser.
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig {
        path: resolve_log_path(cli.log_file),
        level: cli.log_level,
    };
    let _guard = telemetry::init(&log_config)
        .with_context(|| format!("failed to open log file {}", log_config.path.display()))?;

    let config = TrackerConfig {
        store_path: resolve_store_path(cli.store),
        snapshot_path: cli.snapshot,
        settle: Duration::from_millis(cli.settle_ms),
        chromium_path: cli.chromium,
        ..TrackerConfig::default()
    };

    println!("Fetching metric...");
    let outcome = match &cli.replay {
        Some(path) => pipeline::run(&config, &SnapshotRenderer::new(path)).await,
        None => pipeline::run(&config, &ChromiumRenderer::new(&config)).await,
    };

    let log = log_config.path.display();
    match &outcome {
        RunOutcome::Saved(record) => {
            println!("Saved metric {} at {}", record.value, record.timestamp_text());
        }
        RunOutcome::SaveFailed { value, .. } => {
            println!("Failed to save metric {value}. Check {log}.");
        }
        RunOutcome::NotFound | RunOutcome::FetchFailed(_) | RunOutcome::ConversionFailed(_) => {
            println!(
                "Failed to fetch metric. Check {log} and {}.",
                config.snapshot_path.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_uses_fixed_defaults() {
        let cli = Cli::try_parse_from(["spawn-tracker"]).unwrap();
        assert_eq!(cli.log_level, LevelFilter::INFO);
        assert_eq!(cli.settle_ms, 3000);
        assert!(cli.replay.is_none());
    }

    #[test]
    fn test_log_level_accepts_level_names() {
        let cli = Cli::try_parse_from(["spawn-tracker", "--log-level", "warn"]).unwrap();
        assert_eq!(cli.log_level, LevelFilter::WARN);
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        assert!(Cli::try_parse_from(["spawn-tracker", "--log-level", "verbose"]).is_err());
    }

    #[test]
    fn test_settle_override_is_hidden_from_help() {
        let help = <Cli as clap::CommandFactory>::command()
            .render_help()
            .to_string();
        assert!(help.contains("--log-level"));
        assert!(!help.contains("--settle-ms"));
    }
}
