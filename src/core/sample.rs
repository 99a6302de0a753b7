//! Accelerometer sample type.
//!
//! A sample is what the collector writes and what the extractor reads:
//! a device timestamp plus the three axis readings in m/s².

use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single three-axis accelerometer reading.
///
/// The timestamp is device-supplied and opaque. On some devices it counts
/// uptime rather than wall-clock time, so it is only ever propagated.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Sample {
    timestamp: i64,
    x: f32,
    y: f32,
    z: f32,
}

impl Sample {
    pub fn new(timestamp: i64, x: f32, y: f32, z: f32) -> Self {
        Self { timestamp, x, y, z }
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn z(&self) -> f32 {
        self.z
    }

    /// Euclidean norm of the acceleration vector, computed in double precision.
    pub fn magnitude(&self) -> f64 {
        let (x, y, z) = (f64::from(self.x), f64::from(self.y), f64::from(self.z));
        (x * x + y * y + z * z).sqrt()
    }

    fn bits(&self) -> (i64, u32, u32, u32) {
        (
            self.timestamp,
            self.x.to_bits(),
            self.y.to_bits(),
            self.z.to_bits(),
        )
    }
}

// Axis comparison is bit-for-bit, so NaN == NaN and 0.0 != -0.0.
impl PartialEq for Sample {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for Sample {}

impl Hash for Sample {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sample{{timestamp={}, x={:?}, y={:?}, z={:?}}}",
            self.timestamp, self.x, self.y, self.z
        )
    }
}
