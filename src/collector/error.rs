//! Errors raised while collecting samples.

use crate::core::PipelineError;
use std::path::PathBuf;

/// Errors that can occur during sample collection.
#[derive(Debug)]
pub enum CollectorError {
    AlreadyRunning,
    /// No accelerometer was found under the given sysfs root
    NoDevice(PathBuf),
    /// A sensor attribute could not be read or parsed
    Sensor { path: PathBuf, reason: String },
    /// A replayed sample log was malformed
    Replay(PipelineError),
    Io(std::io::Error),
    Csv(csv::Error),
    /// A collector thread panicked
    ThreadPanicked(&'static str),
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "Collector is already running"),
            CollectorError::NoDevice(root) => {
                write!(f, "No accelerometer found under {}", root.display())
            }
            CollectorError::Sensor { path, reason } => {
                write!(f, "Could not read {}: {reason}", path.display())
            }
            CollectorError::Replay(e) => write!(f, "Replay failed: {e}"),
            CollectorError::Io(e) => write!(f, "IO error: {e}"),
            CollectorError::Csv(e) => write!(f, "CSV error: {e}"),
            CollectorError::ThreadPanicked(name) => write!(f, "The {name} thread panicked"),
        }
    }
}

impl std::error::Error for CollectorError {}

impl From<std::io::Error> for CollectorError {
    fn from(e: std::io::Error) -> Self {
        CollectorError::Io(e)
    }
}

impl From<csv::Error> for CollectorError {
    fn from(e: csv::Error) -> Self {
        CollectorError::Csv(e)
    }
}

impl From<PipelineError> for CollectorError {
    fn from(e: PipelineError) -> Self {
        CollectorError::Replay(e)
    }
}
