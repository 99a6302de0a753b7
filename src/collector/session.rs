//! Per-session sample log on disk.
//!
//! Every collection session gets its own directory, named after the
//! session start time, containing a single `AccelerometerEvent.csv`.

use crate::collector::error::CollectorError;
use crate::core::Sample;
use chrono::{DateTime, SecondsFormat, TimeZone};
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Name of the sample log inside a session directory.
pub const LOG_FILENAME: &str = "AccelerometerEvent.csv";

/// Header line of the sample log.
pub const LOG_HEADER: [&str; 4] = ["timestamp", "x", "y", "z"];

/// Directory name for a session started at `start`.
///
/// ISO-8601 without fractional seconds, with `:` replaced by `.` so the
/// name is valid on every filesystem.
pub fn session_dir_name<Tz>(start: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    start
        .to_rfc3339_opts(SecondsFormat::Secs, false)
        .replace(':', ".")
}

/// Append-only sample log for one session.
#[derive(Debug, Clone)]
pub struct SessionLog {
    dir: PathBuf,
}

impl SessionLog {
    /// Describe the log for a session started at `start` under `data_path`.
    ///
    /// Nothing is created on disk until the first [`append`](Self::append).
    pub fn new<Tz>(data_path: &Path, start: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            dir: data_path.join(session_dir_name(start)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self) -> PathBuf {
        self.dir.join(LOG_FILENAME)
    }

    /// Append `samples` to the log, writing the header only if the file is new.
    pub fn append(&self, samples: &[Sample]) -> Result<(), CollectorError> {
        if samples.is_empty() {
            return Ok(());
        }

        std::fs::create_dir_all(&self.dir)?;

        let path = self.file_path();
        let write_header = !path.exists();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));

        if write_header {
            writer.write_record(LOG_HEADER)?;
        }
        for sample in samples {
            writer.serialize(sample)?;
        }
        writer.flush()?;

        tracing::debug!("Wrote {} samples to {}", samples.len(), path.display());
        Ok(())
    }
}
