// Copyright 2026 Spawn Tracker Contributors
// SPDX-License-Identifier: Apache-2.0

//! Spawn tracker: render a page in headless Chromium, read its live player
//! count, and append it to a CSV log.

pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod recorder;
pub mod renderer;
pub mod snapshot;
pub mod telemetry;

pub use config::{LogConfig, Markers, TrackerConfig};
pub use error::{TrackerError, TrackerResult};
pub use extract::{extract_metric, locate_metric_text, parse_metric, MissingElement};
pub use pipeline::{run, RunOutcome};
pub use recorder::{MetricLog, MetricRecord, Recorder};
pub use renderer::chromium::ChromiumRenderer;
pub use renderer::{RenderedDocument, Renderer, SnapshotRenderer};
