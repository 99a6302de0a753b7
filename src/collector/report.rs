//! Collection statistics.
//!
//! Counters are shared between the sampling thread and the flush thread,
//! and written next to the sample log when a session ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Live counters for one collection session.
#[derive(Debug)]
pub struct CollectionReport {
    /// Samples read from the source
    samples_captured: AtomicU64,
    /// Samples appended to the session log
    samples_written: AtomicU64,
    /// Samples lost because their flush failed
    samples_dropped: AtomicU64,
    /// Successful flushes
    flushes: AtomicU64,
    /// Failed flushes
    failed_flushes: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl CollectionReport {
    pub fn new() -> Self {
        Self {
            samples_captured: AtomicU64::new(0),
            samples_written: AtomicU64::new(0),
            samples_dropped: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            failed_flushes: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    pub fn record_sample_captured(&self) {
        self.samples_captured.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful flush of `count` samples.
    pub fn record_flush(&self, count: u64) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.samples_written.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a failed flush; its `count` samples are gone.
    pub fn record_failed_flush(&self, count: u64) {
        self.failed_flushes.fetch_add(1, Ordering::Relaxed);
        self.samples_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> CollectionStats {
        CollectionStats {
            samples_captured: self.samples_captured.load(Ordering::Relaxed),
            samples_written: self.samples_written.load(Ordering::Relaxed),
            samples_dropped: self.samples_dropped.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            failed_flushes: self.failed_flushes.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Samples captured: {}\n\
             - Samples written: {}\n\
             - Samples dropped: {}\n\
             - Flushes: {} ({} failed)\n\
             - Session duration: {} seconds",
            stats.samples_captured,
            stats.samples_written,
            stats.samples_dropped,
            stats.flushes,
            stats.failed_flushes,
            stats.session_duration_secs
        )
    }

    /// Save the statistics as JSON at `path`.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.stats()).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl Default for CollectionReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of collection statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub samples_captured: u64,
    pub samples_written: u64,
    pub samples_dropped: u64,
    pub flushes: u64,
    pub failed_flushes: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared collection report.
pub type SharedCollectionReport = Arc<CollectionReport>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counting() {
        let report = CollectionReport::new();

        report.record_sample_captured();
        report.record_sample_captured();
        report.record_sample_captured();
        report.record_flush(2);
        report.record_failed_flush(1);

        let stats = report.stats();
        assert_eq!(stats.samples_captured, 3);
        assert_eq!(stats.samples_written, 2);
        assert_eq!(stats.samples_dropped, 1);
        assert_eq!(stats.flushes, 1);
        assert_eq!(stats.failed_flushes, 1);
    }

    #[test]
    fn test_summary_format() {
        let summary = CollectionReport::new().summary();
        assert!(summary.contains("Samples captured"));
        assert!(summary.contains("Flushes: 0 (0 failed)"));
    }

    #[test]
    fn test_save_writes_json() {
        let path = std::env::temp_dir()
            .join("hello-sensing-report-test")
            .join("session.json");
        let report = CollectionReport::new();
        report.record_flush(5);
        report.save(&path).unwrap();

        let stats: CollectionStats =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stats.samples_written, 5);
    }
}
