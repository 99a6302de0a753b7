//! hello-sensing - accelerometer logging and offline feature extraction.
//!
//! The crate has two halves that meet at a CSV file:
//!
//! - A **collector** that polls an accelerometer and appends
//!   `timestamp,x,y,z` rows to `AccelerometerEvent.csv` in a per-session
//!   directory.
//! - A **feature extractor** that reads such a log, slides a 256-sample
//!   window over it with 50% overlap, and writes min, max, mean, sample
//!   variance and standard deviation of the gravity-subtracted magnitude
//!   for every full window.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌─────────────────────┐
//! │ Collector  │──▶│ Session    │──▶│ AccelerometerEvent  │
//! │ (sampling) │   │ log (CSV)  │   │ .csv                │
//! └────────────┘   └────────────┘   └──────────┬──────────┘
//!                                              │
//!            ┌─────────────┐   ┌───────────┐   ▼
//!  features ◀│  Features   │◀──│ Windowing │◀── SampleReader
//!    (CSV)   │ (statistics)│   │ (256/128) │
//!            └─────────────┘   └───────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use hello_sensing::{core, WindowConfig};
//!
//! let mut input = String::from("timestamp,x,y,z\n");
//! for t in 0..256 {
//!     input.push_str(&format!("{t},0,0,0\n"));
//! }
//!
//! let mut output = Vec::new();
//! let summary = core::run(input.as_bytes(), &mut output, &WindowConfig::default()).unwrap();
//! assert_eq!(summary.rows_written, 1);
//! ```

pub mod collector;
pub mod config;
pub mod core;

// Re-export key types at crate root for convenience
pub use collector::{Collector, CollectorError, SampleSource};
pub use config::{CollectorSettings, Config, ConfigError, WindowConfig};
pub use self::core::{compute_features, FeatureRow, PipelineError, Sample, SampleWindow};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
