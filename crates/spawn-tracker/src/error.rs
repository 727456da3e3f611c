//! Error taxonomy for a tracker run.

use std::path::PathBuf;

/// Errors that can occur while fetching, extracting, or recording the metric.
#[derive(thiserror::Error, Debug)]
pub enum TrackerError {
    /// Browser launch, navigation, or render-wait fault.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The located text is not an unsigned integer.
    #[error("cannot convert {text:?} to an integer: {reason}")]
    Conversion { text: String, reason: String },

    /// Read, parse, or write fault against the metric store.
    #[error("store {} unavailable: {reason}", .path.display())]
    Persist { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackerError {
    pub(crate) fn persist(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::Persist {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience result type.
pub type TrackerResult<T> = Result<T, TrackerError>;
