//! Sample collection for hello-sensing.
//!
//! A collector polls a [`SampleSource`] on one thread and appends the
//! samples to a per-session CSV log on another. The log is the input
//! format of the feature extractor.

pub mod error;
pub mod report;
pub mod service;
pub mod session;
pub mod source;

// Re-export commonly used types
pub use error::CollectorError;
pub use report::{CollectionReport, CollectionStats, SharedCollectionReport};
pub use service::Collector;
pub use session::{session_dir_name, SessionLog, LOG_FILENAME, LOG_HEADER};
pub use source::{IioAccelerometer, ReplaySource, SampleSource, IIO_DEVICES_ROOT};
