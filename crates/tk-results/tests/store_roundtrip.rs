use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tk_results::{
    FileStore, HistoryOptions, HistoryRecord, HistoryRecorder, HistoryStore, LoadOutcome,
    load_or_empty,
};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn sample_history() -> Vec<HistoryRecord> {
    vec![
        HistoryRecord::new("09:59:58", Some(50.0), 25.0, 1.0),
        HistoryRecord::new("09:59:59", Some(55.5), 24.8, 0.95),
        HistoryRecord::new("10:00:00", None, 24.6, 0.9),
        HistoryRecord::new("10:00:01", Some(61.123456789), 24.400000000000002, 0.85),
    ]
}

#[test]
fn persisted_history_restores_identically() {
    let dir = unique_temp_dir("tk_results_roundtrip");
    let store = FileStore::new(dir.clone()).expect("failed to create store");
    let options = HistoryOptions::default();

    let mut recorder = HistoryRecorder::empty(Box::new(store.clone()), options.clone());
    for record in sample_history() {
        recorder.append(record).expect("append failed");
    }

    let (restored, outcome) = load_or_empty(&store, &options.key);
    assert_eq!(outcome, LoadOutcome::Loaded { count: 4 });
    assert_eq!(restored, sample_history());

    let (reopened, _) = HistoryRecorder::open(Box::new(store), options);
    assert_eq!(reopened.records(), sample_history().as_slice());

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn persisted_layout_is_a_plain_record_array() {
    let dir = unique_temp_dir("tk_results_layout");
    let store = FileStore::new(dir.clone()).unwrap();
    let mut recorder = HistoryRecorder::empty(Box::new(store.clone()), HistoryOptions::default());
    recorder
        .append(HistoryRecord::new("12:00:00", None, 30.0, 2.0))
        .unwrap();

    let path = store.path_for("process_history").unwrap();
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    let first = &value.as_array().unwrap()[0];
    assert_eq!(first["timestamp"], "12:00:00");
    assert!(first["level"].is_null());
    assert_eq!(first["temperature"], 30.0);
    assert_eq!(first["pressure"], 2.0);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn missing_and_corrupt_files_start_empty() {
    let dir = unique_temp_dir("tk_results_corrupt");
    let mut store = FileStore::new(dir.clone()).unwrap();

    let (records, outcome) = load_or_empty(&store, "process_history");
    assert!(records.is_empty());
    assert_eq!(outcome, LoadOutcome::Missing);

    store.put("process_history", "[{\"timestamp\":").unwrap();
    let (records, outcome) = load_or_empty(&store, "process_history");
    assert!(records.is_empty());
    assert!(matches!(outcome, LoadOutcome::Corrupt { .. }));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn reset_removes_file() {
    let dir = unique_temp_dir("tk_results_reset");
    let store = FileStore::new(dir.clone()).unwrap();
    let mut recorder = HistoryRecorder::empty(Box::new(store.clone()), HistoryOptions::default());
    recorder
        .append(HistoryRecord::new("12:00:00", Some(1.0), 2.0, 3.0))
        .unwrap();
    let path = store.path_for("process_history").unwrap();
    assert!(path.exists());

    recorder.reset().unwrap();
    assert!(!path.exists());
    assert!(recorder.is_empty());

    let (records, outcome) = load_or_empty(&store, "process_history");
    assert!(records.is_empty());
    assert_eq!(outcome, LoadOutcome::Missing);

    let _ = fs::remove_dir_all(dir);
}
