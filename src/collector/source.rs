//! Sample sources the collector can poll.
//!
//! [`IioAccelerometer`] reads a Linux Industrial I/O accelerometer through
//! sysfs. [`ReplaySource`] re-reads a previously recorded sample log.

use crate::collector::error::CollectorError;
use crate::core::{Sample, SampleReader};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Where the kernel exposes IIO devices.
pub const IIO_DEVICES_ROOT: &str = "/sys/bus/iio/devices";

const AXES: [&str; 3] = ["x", "y", "z"];

/// Anything that yields accelerometer samples one at a time.
pub trait SampleSource {
    /// Read the next sample. `Ok(None)` means the source is exhausted.
    fn read(&mut self) -> Result<Option<Sample>, CollectorError>;

    /// Human-readable name for log messages.
    fn name(&self) -> &str;
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn read(&mut self) -> Result<Option<Sample>, CollectorError> {
        (**self).read()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// An accelerometer exposed through the Linux IIO sysfs interface.
///
/// Each axis is read from `in_accel_<axis>_raw` and multiplied by its
/// scale, which the kernel defines so that the product is in m/s².
#[derive(Debug)]
pub struct IioAccelerometer {
    device: PathBuf,
    name: String,
    scale: [f64; 3],
    opened: Instant,
}

impl IioAccelerometer {
    /// Open the IIO device directory at `device`.
    pub fn open(device: &Path) -> Result<Self, CollectorError> {
        for axis in AXES {
            let raw = device.join(format!("in_accel_{axis}_raw"));
            if !raw.exists() {
                return Err(CollectorError::Sensor {
                    path: raw,
                    reason: "not an accelerometer channel".to_string(),
                });
            }
        }

        let shared_scale = read_optional_f64(&device.join("in_accel_scale"))?;
        let mut scale = [1.0; 3];
        for (slot, axis) in scale.iter_mut().zip(AXES) {
            let axis_scale = read_optional_f64(&device.join(format!("in_accel_{axis}_scale")))?;
            match axis_scale.or(shared_scale) {
                Some(value) => *slot = value,
                None => tracing::warn!(
                    "{} has no scale for axis {axis}, using raw values",
                    device.display()
                ),
            }
        }

        let name = std::fs::read_to_string(device.join("name"))
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|_| {
                device
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| device.display().to_string())
            });

        Ok(Self {
            device: device.to_path_buf(),
            name,
            scale,
            opened: Instant::now(),
        })
    }

    /// Open the first accelerometer found under `root`.
    pub fn discover(root: &Path) -> Result<Self, CollectorError> {
        let mut devices: Vec<PathBuf> = std::fs::read_dir(root)
            .map_err(|_| CollectorError::NoDevice(root.to_path_buf()))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        devices.sort();

        devices
            .iter()
            .find_map(|device| Self::open(device).ok())
            .ok_or_else(|| CollectorError::NoDevice(root.to_path_buf()))
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    pub fn scale(&self) -> [f64; 3] {
        self.scale
    }
}

impl SampleSource for IioAccelerometer {
    fn read(&mut self) -> Result<Option<Sample>, CollectorError> {
        // Nanoseconds since open: monotonic, and like the device clocks it
        // stands in for, not wall-clock time.
        let timestamp = i64::try_from(self.opened.elapsed().as_nanos()).unwrap_or(i64::MAX);

        let mut values = [0.0f32; 3];
        for ((value, axis), scale) in values.iter_mut().zip(AXES).zip(self.scale) {
            let path = self.device.join(format!("in_accel_{axis}_raw"));
            *value = (read_f64(&path)? * scale) as f32;
        }

        Ok(Some(Sample::new(timestamp, values[0], values[1], values[2])))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn read_f64(path: &Path) -> Result<f64, CollectorError> {
    let content = std::fs::read_to_string(path).map_err(|e| CollectorError::Sensor {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    content.trim().parse().map_err(|e: std::num::ParseFloatError| {
        CollectorError::Sensor {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })
}

fn read_optional_f64(path: &Path) -> Result<Option<f64>, CollectorError> {
    if path.exists() {
        read_f64(path).map(Some)
    } else {
        Ok(None)
    }
}

/// Replays samples from an existing `timestamp,x,y,z` log.
pub struct ReplaySource {
    reader: SampleReader<File>,
    name: String,
}

impl ReplaySource {
    pub fn open(path: &Path) -> Result<Self, CollectorError> {
        let file = File::open(path)?;
        Ok(Self {
            reader: SampleReader::new(file)?,
            name: path.display().to_string(),
        })
    }
}

impl SampleSource for ReplaySource {
    fn read(&mut self) -> Result<Option<Sample>, CollectorError> {
        Ok(self.reader.next_sample()?)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
