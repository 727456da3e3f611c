// Copyright 2026 Spawn Tracker Contributors
// SPDX-License-Identifier: Apache-2.0

//! One fetch → extract → persist run.
//!
//! Every component failure is logged and folded into a [`RunOutcome`]; `run`
//! itself never fails.

use tracing::{error, info, warn};

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::extract::extract_metric;
use crate::recorder::{MetricRecord, Recorder};
use crate::renderer::Renderer;
use crate::snapshot::write_snapshot;

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The metric was appended to the store.
    Saved(MetricRecord),
    /// The expected element structure was absent; nothing was persisted.
    NotFound,
    /// The page could not be rendered.
    FetchFailed(TrackerError),
    /// The metric text was not an integer.
    ConversionFailed(TrackerError),
    /// The metric was extracted but the store could not be updated.
    SaveFailed { value: u64, error: TrackerError },
}

impl RunOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    /// The metric value, if one was extracted.
    pub fn value(&self) -> Option<u64> {
        match self {
            Self::Saved(record) => Some(record.value),
            Self::SaveFailed { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// Render the configured page, extract the metric, and append it to the store.
pub async fn run(config: &TrackerConfig, renderer: &dyn Renderer) -> RunOutcome {
    info!("Fetching metric from {}", config.url);

    let document = match renderer.render(&config.url).await {
        Ok(document) => document,
        Err(e) => {
            error!("Error fetching {}: {e}", config.url);
            return RunOutcome::FetchFailed(e);
        }
    };

    match write_snapshot(&config.snapshot_path, &document.html) {
        Ok(()) => info!(
            "Saved rendered HTML to {} for inspection",
            config.snapshot_path.display()
        ),
        Err(e) => warn!(
            "Could not write snapshot {}: {e}",
            config.snapshot_path.display()
        ),
    }

    let value = match extract_metric(&document.html, &config.markers) {
        Ok(Some(value)) => value,
        Ok(None) => {
            error!("Failed to fetch metric");
            return RunOutcome::NotFound;
        }
        Err(e) => {
            error!("Failed to fetch metric: {e}");
            return RunOutcome::ConversionFailed(e);
        }
    };

    match Recorder::new(&config.store_path).record(MetricRecord::now(value)) {
        Ok(record) => RunOutcome::Saved(record),
        Err(e) => {
            error!("Error saving metric {value}: {e}");
            RunOutcome::SaveFailed { value, error: e }
        }
    }
}
