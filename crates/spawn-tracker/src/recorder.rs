//! Durable metric log: a two-column CSV rewritten in full on every save.
//!
//! The store is read completely, one record is appended in memory, and the
//! whole file is written back over the old one. There is no
//! write-then-rename step, so a crash mid-write can corrupt the file, and two
//! overlapping runs resolve as last-writer-wins.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult};

/// Text layout of the `Timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One observation of the metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(rename = "Timestamp", with = "timestamp_text")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Metric")]
    pub value: u64,
}

impl MetricRecord {
    /// Record `value` at `timestamp`, truncated to whole seconds.
    pub fn new(timestamp: NaiveDateTime, value: u64) -> Self {
        Self {
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            value,
        }
    }

    /// Record `value` at the current local time.
    pub fn now(value: u64) -> Self {
        Self::new(Local::now().naive_local(), value)
    }

    /// The timestamp as stored in the `Timestamp` column.
    pub fn timestamp_text(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

mod timestamp_text {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
            .map_err(serde::de::Error::custom)
    }
}

/// All records in the store, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricLog {
    records: Vec<MetricRecord>,
}

impl MetricLog {
    /// Read the store at `path`, or start empty when it does not exist.
    pub fn load(path: &Path) -> TrackerResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let mut reader =
            csv::Reader::from_path(path).map_err(|e| TrackerError::persist(path, e))?;
        let records = reader
            .deserialize::<MetricRecord>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TrackerError::persist(path, e))?;

        Ok(Self { records })
    }

    /// Append one record at the end.
    pub fn append(&mut self, record: MetricRecord) {
        self.records.push(record);
    }

    /// Overwrite `path` with every record, header first.
    pub fn save(&self, path: &Path) -> TrackerResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| TrackerError::persist(path, e))?;
            }
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|e| TrackerError::persist(path, e))?;

        // Written by hand so an empty log still carries both columns.
        writer
            .write_record(["Timestamp", "Metric"])
            .map_err(|e| TrackerError::persist(path, e))?;
        for record in &self.records {
            writer
                .serialize(record)
                .map_err(|e| TrackerError::persist(path, e))?;
        }
        writer.flush().map_err(|e| TrackerError::persist(path, e))?;

        Ok(())
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Load-append-save cycle against one store path.
pub struct Recorder {
    path: PathBuf,
}

impl Recorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `record` after every existing one and return it.
    pub fn record(&self, record: MetricRecord) -> TrackerResult<MetricRecord> {
        let mut log = MetricLog::load(&self.path)?;
        log.append(record.clone());
        log.save(&self.path)?;

        tracing::info!(
            "Saved metric {} at {} ({} records in {})",
            record.value,
            record.timestamp_text(),
            log.len(),
            self.path.display()
        );
        Ok(record)
    }
}
