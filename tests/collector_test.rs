//! Collector output feeds straight into the feature extractor.

use hello_sensing::collector::{Collector, ReplaySource, LOG_FILENAME};
use hello_sensing::{core, CollectorSettings, WindowConfig};
use std::path::PathBuf;
use std::time::Duration;

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("hello-sensing-collector-it")
        .join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn recorded_log(dir: &std::path::Path, rows: usize) -> PathBuf {
    let mut content = String::from("timestamp,x,y,z\n");
    for i in 0..rows {
        let phase = i as f32 * 0.2;
        content.push_str(&format!(
            "{},{},{},{}\n",
            1_000_000 * i as i64,
            phase.sin(),
            phase.cos(),
            9.81 + 0.5 * phase.sin()
        ));
    }
    let path = dir.join("recorded.csv");
    std::fs::write(&path, content).unwrap();
    path
}

fn extract(path: &std::path::Path) -> String {
    let mut output = Vec::new();
    let input = std::fs::File::open(path).unwrap();
    core::run(input, &mut output, &WindowConfig::default()).unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn replayed_session_produces_identical_features() {
    let dir = test_dir("replay");
    let original = recorded_log(&dir, 700);

    let settings = CollectorSettings {
        data_path: dir.join("sessions"),
        flush_size_limit: 100,
        flush_time_limit: Duration::from_secs(30),
        poll_interval_ms: 0,
    };
    let mut collector = Collector::new(settings);
    let session_dir = collector
        .start(ReplaySource::open(&original).unwrap())
        .unwrap();
    collector.wait().unwrap();

    let stats = collector.report().stats();
    assert_eq!(stats.samples_captured, 700);
    assert_eq!(stats.samples_written, 700);
    assert_eq!(stats.flushes, 7);

    let session_log = session_dir.join(LOG_FILENAME);
    let content = std::fs::read_to_string(&session_log).unwrap();
    assert_eq!(content.matches("timestamp,x,y,z").count(), 1);
    assert!(!session_dir
        .file_name()
        .unwrap()
        .to_string_lossy()
        .contains(':'));

    let features = extract(&original);
    assert_eq!(extract(&session_log), features);
    assert_eq!(features.lines().count(), 1 + 4);
}
