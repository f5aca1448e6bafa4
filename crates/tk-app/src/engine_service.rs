//! Engine assembly from configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use tk_core::Bounds;
use tk_process::{ControlInputs, ProcessRates, ProcessState};
use tk_project::{EngineConfig, FaultPolicyDef};
use tk_results::{FileStore, HistoryOptions, HistoryRecorder, HistoryStore, LoadOutcome};
use tk_sim::{
    AlarmThresholds, CommandLimits, Engine, EngineSettings, FaultPolicy, RandomSource, RngSource,
};

use crate::error::{AppError, AppResult};

/// A ready-to-run engine plus what the caller needs to drive and report on it.
pub struct EngineSetup {
    pub engine: Engine,
    pub period: Duration,
    pub load_outcome: LoadOutcome,
    pub history_dir: PathBuf,
}

/// Map the file-level configuration onto engine parameters.
pub fn settings_from_config(config: &EngineConfig) -> EngineSettings {
    let p = &config.process;
    let a = &config.alarms;
    let [flow_lo, flow_hi] = config.commands.flow_limits_lps;
    EngineSettings {
        rates: ProcessRates {
            heater_rise: p.heater_rise_c,
            ambient_cooling: p.ambient_cooling_c,
            pump_rise: p.pump_rise_bar,
            pressure_decay: p.pressure_decay_bar,
        },
        thresholds: AlarmThresholds {
            level_high: a.level_high_pct,
            level_low: a.level_low_pct,
            temperature_high: a.temperature_high_c,
            pressure_high: a.pressure_high_bar,
            rapid_change: a.rapid_change_pct,
        },
        fault_probability: config.fault.probability,
        fault_policy: match config.fault.policy {
            FaultPolicyDef::FreezeLevel => FaultPolicy::FreezeLevel,
            FaultPolicyDef::MaskOnly => FaultPolicy::MaskOnly,
        },
        limits: CommandLimits {
            clamp_flow_inputs: config.commands.clamp_flow_inputs,
            flow_limits: Bounds::new(flow_lo, flow_hi),
        },
        timestamp_format: config.history.timestamp_format.clone(),
    }
}

fn history_options(config: &EngineConfig) -> HistoryOptions {
    HistoryOptions {
        key: config.history.key.clone(),
        max_records: config.history.max_records,
    }
}

fn random_source(config: &EngineConfig) -> Box<dyn RandomSource> {
    match config.fault.seed {
        Some(seed) => Box::new(RngSource::seeded(seed)),
        None => Box::new(RngSource::from_entropy()),
    }
}

/// Build an engine over the given store, restoring any persisted history.
pub fn build_engine(
    config: &EngineConfig,
    store: Box<dyn HistoryStore>,
) -> AppResult<(Engine, LoadOutcome)> {
    tk_project::validate_config(config).map_err(|e| AppError::Config(e.to_string()))?;

    let s = &config.initial_state;
    let initial_state = ProcessState::new(s.level_pct, s.temperature_c, s.pressure_bar)?;
    let i = &config.initial_inputs;
    let initial_inputs = ControlInputs {
        inflow_rate: i.inflow_lps,
        outflow_rate: i.outflow_lps,
        heater_on: i.heater_on,
        pump_on: i.pump_on,
    };

    let (recorder, outcome) = HistoryRecorder::open(store, history_options(config));
    let engine = Engine::new(
        settings_from_config(config),
        initial_state,
        initial_inputs,
        random_source(config),
        recorder,
    )?;
    Ok((engine, outcome))
}

fn file_store(config: &EngineConfig, config_path: &Path) -> AppResult<(FileStore, PathBuf)> {
    let dir = config.history.resolve_dir(config_path);
    let store = FileStore::new(dir.clone()).map_err(|source| AppError::HistoryDir {
        path: dir.clone(),
        source,
    })?;
    Ok((store, dir))
}

/// Load the configuration at `config_path` and build a file-backed engine.
///
/// `seed` overrides the configured fault seed.
pub fn open_engine(config_path: &Path, seed: Option<u64>) -> AppResult<EngineSetup> {
    let mut config = tk_project::load(config_path)?;
    if seed.is_some() {
        config.fault.seed = seed;
    }

    let (store, history_dir) = file_store(&config, config_path)?;
    let (engine, load_outcome) = build_engine(&config, Box::new(store))?;
    info!(
        config = %config_path.display(),
        name = %config.name,
        period_ms = config.tick_period_ms,
        restored = engine.history().len(),
        "engine ready"
    );

    Ok(EngineSetup {
        engine,
        period: Duration::from_millis(config.tick_period_ms),
        load_outcome,
        history_dir,
    })
}

/// Open only the persisted history described by a configuration file.
pub fn open_history(config_path: &Path) -> AppResult<(HistoryRecorder, LoadOutcome)> {
    let config = tk_project::load(config_path)?;
    let (store, _) = file_store(&config, config_path)?;
    Ok(HistoryRecorder::open(Box::new(store), history_options(&config)))
}
