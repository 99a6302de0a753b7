//! The collection service: a sampling thread feeding a flush thread.
//!
//! The sampling thread only reads the source and queues samples, so slow
//! disk writes never delay it. The flush thread drains the queue into the
//! session log once enough samples are waiting or enough time has passed,
//! and a final time when sampling stops. A failed flush is logged and its
//! batch dropped; there is no retry.

use crate::collector::error::CollectorError;
use crate::collector::report::{CollectionReport, SharedCollectionReport};
use crate::collector::session::SessionLog;
use crate::collector::source::SampleSource;
use crate::config::CollectorSettings;
use crate::core::Sample;
use chrono::Local;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Name of the statistics file written next to the sample log.
pub const REPORT_FILENAME: &str = "session.json";

/// Shortest idle wait of the flush thread, so a zero time limit cannot spin.
const MIN_FLUSH_WAIT: Duration = Duration::from_millis(10);

/// Collects samples from a source into a session log.
pub struct Collector {
    settings: CollectorSettings,
    running: Arc<AtomicBool>,
    report: SharedCollectionReport,
    session: Option<SessionLog>,
    sampler: Option<JoinHandle<Result<(), CollectorError>>>,
    flusher: Option<JoinHandle<()>>,
}

impl Collector {
    pub fn new(settings: CollectorSettings) -> Self {
        Self {
            settings,
            running: Arc::new(AtomicBool::new(false)),
            report: Arc::new(CollectionReport::new()),
            session: None,
            sampler: None,
            flusher: None,
        }
    }

    /// Start sampling `source` into a new session directory.
    ///
    /// Returns the session directory. It is created on the first flush.
    pub fn start<S>(&mut self, mut source: S) -> Result<PathBuf, CollectorError>
    where
        S: SampleSource + Send + 'static,
    {
        if self.running.load(Ordering::SeqCst) || self.sampler.is_some() {
            return Err(CollectorError::AlreadyRunning);
        }

        let session = SessionLog::new(&self.settings.data_path, &Local::now());
        tracing::info!(
            "Starting collection from {} into {}",
            source.name(),
            session.dir().display()
        );

        self.report = Arc::new(CollectionReport::new());
        self.running.store(true, Ordering::SeqCst);

        let (sender, receiver) = unbounded();

        let running = self.running.clone();
        let report = self.report.clone();
        let poll_interval = self.settings.poll_interval();
        let sampler = thread::spawn(move || {
            let result = loop {
                if !running.load(Ordering::SeqCst) {
                    break Ok(());
                }
                match source.read() {
                    Ok(Some(sample)) => {
                        report.record_sample_captured();
                        if sender.send(sample).is_err() {
                            break Ok(());
                        }
                    }
                    Ok(None) => {
                        tracing::info!("{} is exhausted", source.name());
                        break Ok(());
                    }
                    Err(e) => {
                        tracing::error!("Reading {} failed: {e}", source.name());
                        break Err(e);
                    }
                }
                if !poll_interval.is_zero() {
                    thread::sleep(poll_interval);
                }
            };
            running.store(false, Ordering::SeqCst);
            result
        });

        let flusher = {
            let session = session.clone();
            let report = self.report.clone();
            let size_limit = self.settings.flush_size_limit.max(1);
            let time_limit = self.settings.flush_time_limit;
            thread::spawn(move || run_flusher(receiver, session, report, size_limit, time_limit))
        };

        self.sampler = Some(sampler);
        self.flusher = Some(flusher);
        self.session = Some(session.clone());
        Ok(session.dir().to_path_buf())
    }

    /// Stop sampling, flush what is queued, and wait for both threads.
    ///
    /// Returns the source error that ended sampling early, if any.
    pub fn stop(&mut self) -> Result<(), CollectorError> {
        self.running.store(false, Ordering::SeqCst);
        self.join()
    }

    /// Wait for the source to run dry, then flush and join.
    pub fn wait(&mut self) -> Result<(), CollectorError> {
        self.join()
    }

    fn join(&mut self) -> Result<(), CollectorError> {
        let sampled = match self.sampler.take() {
            Some(handle) => handle
                .join()
                .unwrap_or(Err(CollectorError::ThreadPanicked("sampling"))),
            None => Ok(()),
        };

        // The sampler dropped its sender, so the flusher drains and exits.
        let flushed = match self.flusher.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| CollectorError::ThreadPanicked("flush")),
            None => Ok(()),
        };

        if let Some(session) = self.session.take() {
            if session.dir().exists() {
                let path = session.dir().join(REPORT_FILENAME);
                if let Err(e) = self.report.save(&path) {
                    tracing::warn!("Could not save session statistics: {e}");
                }
            }
            tracing::info!("Stopped collection into {}", session.dir().display());
        }

        sampled.and(flushed)
    }

    /// Whether the sampling thread is still reading its source.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn report(&self) -> &SharedCollectionReport {
        &self.report
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        if self.sampler.is_some() || self.flusher.is_some() {
            let _ = self.stop();
        }
    }
}

fn run_flusher(
    receiver: Receiver<Sample>,
    session: SessionLog,
    report: SharedCollectionReport,
    size_limit: usize,
    time_limit: Duration,
) {
    let mut batch: Vec<Sample> = Vec::new();
    let mut last_attempted_flush = Instant::now();

    loop {
        let wait = time_limit
            .saturating_sub(last_attempted_flush.elapsed())
            .max(MIN_FLUSH_WAIT);
        match receiver.recv_timeout(wait) {
            Ok(sample) => batch.push(sample),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                flush(&session, &report, &mut batch);
                break;
            }
        }

        if batch.len() >= size_limit || last_attempted_flush.elapsed() >= time_limit {
            last_attempted_flush = Instant::now();
            flush(&session, &report, &mut batch);
        }
    }
}

fn flush(session: &SessionLog, report: &CollectionReport, batch: &mut Vec<Sample>) {
    if batch.is_empty() {
        return;
    }

    let count = batch.len() as u64;
    match session.append(batch) {
        Ok(()) => report.record_flush(count),
        Err(e) => {
            tracing::error!(
                "Error writing {count} samples to {}: {e}",
                session.file_path().display()
            );
            report.record_failed_flush(count);
        }
    }
    batch.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Yields a fixed number of samples, then runs dry.
    struct CountingSource {
        remaining: i64,
        next: i64,
    }

    impl SampleSource for CountingSource {
        fn read(&mut self) -> Result<Option<Sample>, CollectorError> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            self.next += 1;
            Ok(Some(Sample::new(self.next, 0.0, 0.0, 9.8)))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    /// Yields samples forever.
    struct EndlessSource(i64);

    impl SampleSource for EndlessSource {
        fn read(&mut self) -> Result<Option<Sample>, CollectorError> {
            self.0 += 1;
            Ok(Some(Sample::new(self.0, 1.0, 0.0, 0.0)))
        }

        fn name(&self) -> &str {
            "endless"
        }
    }

    struct FailingSource;

    impl SampleSource for FailingSource {
        fn read(&mut self) -> Result<Option<Sample>, CollectorError> {
            Err(CollectorError::Sensor {
                path: PathBuf::from("/dev/null"),
                reason: "unplugged".to_string(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn test_settings(name: &str) -> CollectorSettings {
        let data_path = std::env::temp_dir()
            .join("hello-sensing-collector-test")
            .join(name);
        let _ = std::fs::remove_dir_all(&data_path);
        CollectorSettings {
            data_path,
            flush_size_limit: 4,
            flush_time_limit: Duration::from_secs(30),
            poll_interval_ms: 0,
        }
    }

    fn data_rows(dir: &std::path::Path) -> Vec<String> {
        let content =
            std::fs::read_to_string(dir.join(crate::collector::LOG_FILENAME)).unwrap();
        content.lines().skip(1).map(str::to_string).collect()
    }

    #[test]
    fn test_collector_creation() {
        let collector = Collector::new(test_settings("creation"));
        assert!(!collector.is_running());
    }

    #[test]
    fn test_collects_until_source_exhausted() {
        let mut collector = Collector::new(test_settings("exhausted"));
        let dir = collector
            .start(CountingSource {
                remaining: 10,
                next: 0,
            })
            .unwrap();
        collector.wait().unwrap();

        let rows = data_rows(&dir);
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0], "1,0.0,0.0,9.8");
        assert_eq!(rows[9], "10,0.0,0.0,9.8");

        let stats = collector.report().stats();
        assert_eq!(stats.samples_captured, 10);
        assert_eq!(stats.samples_written, 10);
        // Two size-triggered flushes of four, then the final two.
        assert_eq!(stats.flushes, 3);
        assert!(dir.join(REPORT_FILENAME).exists());
    }

    #[test]
    fn test_zero_time_limit_flushes_every_sample() {
        let mut settings = test_settings("zero-time-limit");
        settings.flush_size_limit = 1_000;
        settings.flush_time_limit = Duration::ZERO;
        settings.poll_interval_ms = 15;
        let mut collector = Collector::new(settings);
        let dir = collector
            .start(CountingSource {
                remaining: 3,
                next: 0,
            })
            .unwrap();
        collector.wait().unwrap();

        assert_eq!(data_rows(&dir).len(), 3);
        let stats = collector.report().stats();
        assert_eq!(stats.samples_written, 3);
        // Each sample is its own batch; idle timeouts find nothing to flush.
        assert_eq!(stats.flushes, 3);
    }

    #[test]
    fn test_stop_flushes_pending_samples() {
        let mut settings = test_settings("stop");
        settings.poll_interval_ms = 1;
        let mut collector = Collector::new(settings);
        let dir = collector.start(EndlessSource(0)).unwrap();
        thread::sleep(Duration::from_millis(20));
        collector.stop().unwrap();

        let stats = collector.report().stats();
        assert!(stats.samples_captured > 0);
        assert_eq!(stats.samples_written, stats.samples_captured);
        assert_eq!(data_rows(&dir).len() as u64, stats.samples_captured);
    }

    #[test]
    fn test_start_twice_fails() {
        let mut settings = test_settings("twice");
        settings.poll_interval_ms = 1;
        let mut collector = Collector::new(settings);
        collector.start(EndlessSource(0)).unwrap();
        assert!(matches!(
            collector.start(EndlessSource(0)),
            Err(CollectorError::AlreadyRunning)
        ));
        collector.stop().unwrap();
    }

    #[test]
    fn test_source_error_is_reported() {
        let mut collector = Collector::new(test_settings("failing"));
        collector.start(FailingSource).unwrap();
        assert!(matches!(
            collector.wait(),
            Err(CollectorError::Sensor { .. })
        ));
        assert!(!collector.is_running());
    }
}
