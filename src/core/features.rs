//! Feature computation from sample windows.
//!
//! Each full window is reduced to the time-domain statistics of its
//! gravity-subtracted magnitudes. The subtraction is a scalar
//! approximation, not a high-pass filter, so magnitudes below 1 g come
//! out negative and are kept that way.

use crate::core::sample::Sample;
use crate::core::windowing::SampleWindow;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Earth's gravity in SI units (m/s²), single precision like the axis readings.
pub const GRAVITY_EARTH: f32 = 9.80665;

/// Statistics for one emitted window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureRow {
    /// Timestamp of the oldest sample in the window.
    ///
    /// After the first window this is the former midpoint of the previous
    /// window, and it carries no meaning as a feature by itself.
    pub timestamp: i64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample variance (divisor `n - 1`)
    pub variance: f64,
    pub standard_deviation: f64,
}

impl FeatureRow {
    /// Output column names, in serialization order.
    pub const HEADER: [&'static str; 6] = [
        "timestamp",
        "min",
        "max",
        "mean",
        "variance",
        "standard_deviation",
    ];
}

/// Approximate acceleration magnitude with gravity removed.
pub fn magnitude(sample: &Sample) -> f64 {
    sample.magnitude() - f64::from(GRAVITY_EARTH)
}

/// Compute features over the samples currently held by `window`.
///
/// Returns `None` for an empty window.
pub fn compute_features(window: &SampleWindow) -> Option<FeatureRow> {
    let timestamp = window.first()?.timestamp();
    let magnitudes: Vec<f64> = window.view().map(magnitude).collect();
    Some(summarize(timestamp, &magnitudes))
}

/// Reduce a non-empty slice of magnitudes to a [`FeatureRow`].
fn summarize(timestamp: i64, magnitudes: &[f64]) -> FeatureRow {
    let min = Statistics::min(magnitudes.iter());
    let max = Statistics::max(magnitudes.iter());
    let mean = Statistics::mean(magnitudes.iter());
    let variance = sample_variance(magnitudes, mean);

    FeatureRow {
        timestamp,
        min,
        max,
        mean,
        variance,
        standard_deviation: variance.sqrt(),
    }
}

/// Two-pass sample variance around a precomputed mean.
///
/// NaN for fewer than two values.
fn sample_variance(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }

    let sum_sq: f64 = values.iter().map(|&v| (v - mean) * (v - mean)).sum();
    sum_sq / (values.len() - 1) as f64
}
