//! Log stream setup: timestamped lines appended to a single file.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;
use crate::error::{TrackerError, TrackerResult};

/// Install the global subscriber writing to `config.path`.
///
/// The returned guard flushes buffered lines when dropped, so the caller must
/// hold it until the process exits. `RUST_LOG` overrides `config.level`.
pub fn init(config: &LogConfig) -> TrackerResult<WorkerGuard> {
    let file_name = config
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            TrackerError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("log path {} has no file name", config.path.display()),
            ))
        })?;
    let dir = match config.path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    // Never rotating, the appender opens exactly `dir/file_name` for append.
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(&dir)
        .map_err(|e| TrackerError::Io(std::io::Error::other(e)))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(config.level.into()));

    // A second init in the same process keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(writer)
        .try_init();

    Ok(guard)
}
