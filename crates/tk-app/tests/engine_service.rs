use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tk_app::{build_engine, open_engine, open_history};
use tk_project::{EngineConfig, FaultPolicyDef};
use tk_results::{HistoryRecord, HistoryStore, LoadOutcome, MemoryStore};
use tk_sim::FaultPolicy;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

#[test]
fn settings_follow_config() {
    let mut config = EngineConfig::default();
    config.fault.policy = FaultPolicyDef::MaskOnly;
    config.alarms.level_high_pct = 90.0;
    config.commands.clamp_flow_inputs = true;

    let settings = tk_app::settings_from_config(&config);
    assert_eq!(settings.fault_policy, FaultPolicy::MaskOnly);
    assert_eq!(settings.thresholds.level_high, 90.0);
    assert!(settings.limits.clamp_flow_inputs);
    assert_eq!(settings.limits.flow_limits.hi, 10.0);
}

#[test]
fn build_restores_persisted_history() {
    let mut store = MemoryStore::new();
    let records = vec![
        HistoryRecord::new("08:00:00", Some(50.0), 25.0, 1.0),
        HistoryRecord::new("08:00:01", None, 24.8, 0.95),
    ];
    store
        .put("process_history", &serde_json::to_string(&records).unwrap())
        .unwrap();

    let mut config = EngineConfig::default();
    config.fault.seed = Some(9);
    let (mut engine, outcome) = build_engine(&config, Box::new(store)).unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded { count: 2 });
    assert_eq!(engine.history().records(), records.as_slice());

    let snap = engine.tick();
    assert_eq!(snap.history.len(), 3);
    assert_eq!(&snap.history[..2], records.as_slice());
}

#[test]
fn build_with_corrupt_history_starts_empty() {
    let store = MemoryStore::new();
    store.insert_raw("process_history", "not json at all");

    let (engine, outcome) = build_engine(&EngineConfig::default(), Box::new(store)).unwrap();
    assert!(outcome.is_fallback());
    assert!(engine.history().is_empty());
}

#[test]
fn build_rejects_invalid_config() {
    let mut config = EngineConfig::default();
    config.fault.probability = -1.0;
    assert!(build_engine(&config, Box::new(MemoryStore::new())).is_err());
}

#[test]
fn build_rejects_unrenderable_timestamp_format() {
    let mut config = EngineConfig::default();
    config.history.timestamp_format = "%H:%M:%Q".to_string();
    assert!(build_engine(&config, Box::new(MemoryStore::new())).is_err());
}

#[test]
fn file_backed_engine_survives_restart() {
    let dir = unique_temp_dir("tk_app_restart");
    fs::create_dir_all(&dir).unwrap();
    let config_path = dir.join("tank.yaml");
    fs::write(&config_path, "tick_period_ms: 50\nfault:\n  probability: 0.0\n").unwrap();

    let mut setup = open_engine(&config_path, Some(5)).unwrap();
    assert_eq!(setup.period.as_millis(), 50);
    assert_eq!(setup.load_outcome, LoadOutcome::Missing);
    assert_eq!(setup.history_dir, dir.join(".tanksim"));
    for _ in 0..4 {
        setup.engine.tick();
    }
    drop(setup);

    let (recorder, outcome) = open_history(&config_path).unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded { count: 4 });
    assert_eq!(recorder.len(), 4);

    let setup = open_engine(&config_path, None).unwrap();
    assert_eq!(setup.engine.history().len(), 4);

    let _ = fs::remove_dir_all(dir);
}
