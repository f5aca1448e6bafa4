//! Integration tests: engine behaviour over multiple ticks.

use proptest::prelude::*;
use tk_process::{ControlInputs, ProcessState};
use tk_results::{HistoryOptions, HistoryRecorder, MemoryStore};
use tk_sim::{
    AlarmSet, Command, Engine, EngineSettings, FaultPolicy, RngSource, ScriptedSource,
};

fn inputs(inflow: f64, outflow: f64) -> ControlInputs {
    ControlInputs {
        inflow_rate: inflow,
        outflow_rate: outflow,
        heater_on: false,
        pump_on: false,
    }
}

fn engine(state: ProcessState, inputs: ControlInputs, settings: EngineSettings) -> (Engine, MemoryStore) {
    let store = MemoryStore::new();
    let recorder = HistoryRecorder::empty(Box::new(store.clone()), HistoryOptions::default());
    let engine = Engine::new(settings, state, inputs, Box::new(ScriptedSource::never()), recorder)
        .expect("engine should build");
    (engine, store)
}

#[test]
fn balanced_flows_hold_level_without_alarms() {
    let (mut engine, _) = engine(
        ProcessState::new(50.0, 25.0, 1.0).unwrap(),
        inputs(5.0, 5.0),
        EngineSettings::default(),
    );

    let snap = engine.tick();
    assert_eq!(snap.level(), 50.0);
    assert_eq!(snap.alarms, AlarmSet::default());
}

#[test]
fn large_inflow_trips_rapid_change() {
    let (mut engine, _) = engine(
        ProcessState::new(50.0, 25.0, 1.0).unwrap(),
        inputs(12.0, 0.0),
        EngineSettings::default(),
    );

    let snap = engine.tick();
    assert_eq!(snap.level(), 62.0);
    assert!(snap.alarms.rapid_change);
    assert!(!snap.alarms.level_high);
    assert!(!snap.alarms.level_low);
}

#[test]
fn step_of_exactly_ten_is_not_rapid() {
    let (mut engine, _) = engine(
        ProcessState::new(70.0, 25.0, 1.0).unwrap(),
        inputs(10.0, 0.0),
        EngineSettings::default(),
    );

    let snap = engine.tick();
    assert_eq!(snap.level(), 80.0);
    assert!(snap.alarms.level_high);
    assert!(!snap.alarms.rapid_change);
}

#[test]
fn alarms_clear_on_the_next_tick() {
    let (mut engine, _) = engine(
        ProcessState::new(50.0, 25.0, 1.0).unwrap(),
        inputs(12.0, 0.0),
        EngineSettings::default(),
    );
    assert!(engine.tick().alarms.rapid_change);

    engine.apply(Command::SetInflowRate(0.0)).unwrap();
    let snap = engine.tick();
    assert_eq!(snap.level(), 62.0);
    assert!(!snap.alarms.rapid_change);
}

#[test]
fn faulted_sensor_freezes_and_masks_level_until_reset() {
    let (mut engine, _) = engine(
        ProcessState::new(40.0, 25.0, 1.0).unwrap(),
        inputs(3.0, 1.0),
        EngineSettings::default(),
    );
    engine.tick();
    engine.apply(Command::InjectSensorFault).unwrap();
    let frozen_level = engine.state().level;
    assert_eq!(frozen_level, 42.0);

    for (inflow, outflow) in [(9.0, 0.0), (0.0, 7.0), (10.0, 2.0)] {
        engine.apply(Command::SetInflowRate(inflow)).unwrap();
        engine.apply(Command::SetOutflowRate(outflow)).unwrap();
        let snap = engine.tick();
        assert_eq!(snap.level(), frozen_level);
        assert!(snap.alarms.sensor_fault);
        assert!(!snap.alarms.rapid_change);
        assert_eq!(snap.history.last().unwrap().level, None);
    }
    // Temperature keeps cooling while the level is held.
    assert!(engine.state().temperature < 25.0);

    engine.apply(Command::ResetSensor).unwrap();
    let snap = engine.tick();
    assert!(!snap.alarms.sensor_fault);
    assert_eq!(snap.level(), frozen_level + 8.0);
    assert_eq!(snap.history.last().unwrap().level, Some(frozen_level + 8.0));
}

#[test]
fn mask_only_policy_keeps_level_moving() {
    let settings = EngineSettings {
        fault_policy: FaultPolicy::MaskOnly,
        ..EngineSettings::default()
    };
    let (mut engine, _) = engine(ProcessState::new(40.0, 25.0, 1.0).unwrap(), inputs(3.0, 1.0), settings);
    engine.apply(Command::InjectSensorFault).unwrap();

    let snap = engine.tick();
    assert_eq!(snap.level(), 42.0);
    assert_eq!(snap.history[0].level, None);
    assert!(snap.alarms.sensor_fault);
}

#[test]
fn sensor_never_self_heals() {
    let store = MemoryStore::new();
    let recorder = HistoryRecorder::empty(Box::new(store), HistoryOptions::default());
    let settings = EngineSettings {
        fault_probability: 1.0,
        ..EngineSettings::default()
    };
    let mut engine = Engine::new(
        settings,
        ProcessState::default(),
        ControlInputs::default(),
        Box::new(RngSource::seeded(3)),
        recorder,
    )
    .unwrap();

    for _ in 0..50 {
        assert!(engine.tick().sensor.is_faulted());
    }
}

#[test]
fn history_grows_by_one_per_tick_until_reset() {
    let (mut engine, store) = engine(ProcessState::default(), ControlInputs::default(), EngineSettings::default());
    for n in 1..=5 {
        let snap = engine.tick();
        assert_eq!(snap.history.len(), n);
    }
    assert!(store.contains("process_history"));

    engine.apply(Command::ResetHistory).unwrap();
    assert_eq!(engine.snapshot().history.len(), 0);
    assert!(!store.contains("process_history"));

    assert_eq!(engine.tick().history.len(), 1);
}

#[test]
fn persistence_failure_does_not_stop_ticks() {
    let (mut engine, store) = engine(ProcessState::default(), ControlInputs::default(), EngineSettings::default());
    store.set_fail_writes(true);
    for n in 1..=3 {
        assert_eq!(engine.tick().history.len(), n);
    }
    assert_eq!(engine.history().write_failures(), 3);
    assert!(!store.contains("process_history"));

    store.set_fail_writes(false);
    engine.tick();
    let persisted: Vec<tk_results::HistoryRecord> =
        serde_json::from_str(&store.raw("process_history").unwrap()).unwrap();
    assert_eq!(persisted.len(), 4);
}

#[test]
fn clamped_commands_pin_flows() {
    let mut settings = EngineSettings::default();
    settings.limits.clamp_flow_inputs = true;
    let (mut engine, _) = engine(ProcessState::default(), ControlInputs::default(), settings);
    engine.apply(Command::SetInflowRate(25.0)).unwrap();
    engine.apply(Command::SetOutflowRate(-4.0)).unwrap();
    assert_eq!(engine.inputs().inflow_rate, 10.0);
    assert_eq!(engine.inputs().outflow_rate, 0.0);
}

fn any_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        (-20.0_f64..20.0).prop_map(Command::SetInflowRate),
        (-20.0_f64..20.0).prop_map(Command::SetOutflowRate),
        any::<bool>().prop_map(Command::SetHeater),
        any::<bool>().prop_map(Command::SetPump),
        Just(Command::ResetSensor),
        Just(Command::ResetHistory),
        Just(Command::InjectSensorFault),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_operation_stays_in_bounds(
        seed in any::<u64>(),
        commands in prop::collection::vec(prop::option::of(any_command()), 1..80),
    ) {
        let recorder = HistoryRecorder::empty(Box::new(MemoryStore::new()), HistoryOptions::default());
        let settings = EngineSettings { fault_probability: 0.2, ..EngineSettings::default() };
        let mut engine = Engine::new(
            settings,
            ProcessState::default(),
            ControlInputs::default(),
            Box::new(RngSource::seeded(seed)),
            recorder,
        ).unwrap();

        let mut expected_len = 0usize;
        for command in commands {
            if let Some(command) = command {
                engine.apply(command).unwrap();
                if command == Command::ResetHistory {
                    expected_len = 0;
                }
            }
            let snap = engine.tick();
            expected_len += 1;
            prop_assert!(snap.state.is_within_bounds());
            prop_assert_eq!(snap.history.len(), expected_len);
            prop_assert_eq!(snap.history.last().unwrap().level.is_none(), snap.sensor.is_faulted());
        }
    }
}
