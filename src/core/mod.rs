//! Core functionality for hello-sensing.
//!
//! This module contains:
//! - The accelerometer sample type
//! - The sliding sample window
//! - Feature computation over full windows
//! - The CSV-to-CSV extraction pipeline

pub mod features;
pub mod pipeline;
pub mod sample;
pub mod windowing;

// Re-export commonly used types
pub use features::{compute_features, magnitude, FeatureRow, GRAVITY_EARTH};
pub use pipeline::{run, FeaturePipeline, PipelineError, RunSummary, SampleReader};
pub use sample::Sample;
pub use windowing::SampleWindow;
