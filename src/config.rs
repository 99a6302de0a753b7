//! Configuration for hello-sensing.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration, shared by the extractor and the collector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Sliding window parameters for feature extraction
    #[serde(default)]
    pub window: WindowConfig,

    /// On-device collection settings
    #[serde(default)]
    pub collector: CollectorSettings,
}

impl Config {
    /// Load configuration from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.window.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hello-sensing")
            .join("config.json")
    }
}

/// Sliding window parameters, counted in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Samples per window. A power of two keeps later frequency analysis easy.
    pub size: usize,
    /// Samples shared between consecutive windows
    pub overlap: usize,
}

/// Default window size.
pub const WINDOW_SIZE: usize = 256;

/// Default overlap, half a window.
pub const WINDOW_OVERLAP: usize = WINDOW_SIZE / 2;

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: WINDOW_SIZE,
            overlap: WINDOW_OVERLAP,
        }
    }
}

impl WindowConfig {
    /// Number of new samples between consecutive emissions.
    pub fn step(&self) -> usize {
        self.size - self.overlap
    }

    /// Reject parameters for which a window could never advance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::InvalidWindow(
                "window size must be at least 1".to_string(),
            ));
        }
        if self.overlap >= self.size {
            return Err(ConfigError::InvalidWindow(format!(
                "overlap {} must be smaller than window size {}",
                self.overlap, self.size
            )));
        }
        Ok(())
    }

    /// Number of feature rows produced by `samples` input rows.
    pub fn expected_rows(&self, samples: usize) -> usize {
        if samples < self.size {
            0
        } else {
            (samples - self.size) / self.step() + 1
        }
    }
}

/// Settings for the sample collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorSettings {
    /// Directory under which per-session directories are created
    pub data_path: PathBuf,

    /// Flush once this many samples are queued
    pub flush_size_limit: usize,

    /// Flush at least this often while samples keep arriving
    #[serde(with = "duration_serde")]
    pub flush_time_limit: Duration,

    /// Pause between two sensor reads, in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hello-sensing");

        Self {
            data_path: data_dir,
            flush_size_limit: 10_000,
            flush_time_limit: Duration::from_secs(30),
            poll_interval_ms: 10,
        }
    }
}

impl CollectorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidWindow(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidWindow(e) => write!(f, "Invalid window: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
