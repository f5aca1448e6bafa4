//! Per-tick engine: one owned context, fixed sequencing.
//!
//! Tick order: process model, fault draw, level freeze, alarms, history.
//! Commands mutate the context between ticks and are seen by the next tick.

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use tracing::{debug, info, warn};

use tk_process::{ControlInputs, ProcessModel, ProcessRates, ProcessState};
use tk_results::{
    DEFAULT_TIMESTAMP_FORMAT, HistoryRecord, HistoryRecorder, format_timestamp,
    is_valid_timestamp_format,
};

use crate::alarms::{AlarmEvaluator, AlarmSet, AlarmThresholds};
use crate::command::{Command, CommandLimits};
use crate::error::{SimError, SimResult};
use crate::fault::{DEFAULT_FAULT_PROBABILITY, FaultInjector, FaultPolicy, RandomSource, SensorHealth};

/// Static engine parameters.
#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub rates: ProcessRates,
    pub thresholds: AlarmThresholds,
    pub fault_probability: f64,
    pub fault_policy: FaultPolicy,
    pub limits: CommandLimits,
    /// chrono format string for history timestamps
    pub timestamp_format: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            rates: ProcessRates::default(),
            thresholds: AlarmThresholds::default(),
            fault_probability: DEFAULT_FAULT_PROBABILITY,
            fault_policy: FaultPolicy::default(),
            limits: CommandLimits::default(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

/// Mutable state owned exclusively by the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineContext {
    pub state: ProcessState,
    pub inputs: ControlInputs,
    pub health: SensorHealth,
}

/// What consumers see after each tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    /// Ticks completed since the engine started
    pub tick: u64,
    pub state: ProcessState,
    pub inputs: ControlInputs,
    pub sensor: SensorHealth,
    pub alarms: AlarmSet,
    pub history: Vec<HistoryRecord>,
}

impl Snapshot {
    pub fn level(&self) -> f64 {
        self.state.level
    }

    pub fn temperature(&self) -> f64 {
        self.state.temperature
    }

    pub fn pressure(&self) -> f64 {
        self.state.pressure
    }

    /// Level as the instrument reports it.
    pub fn level_reading(&self) -> Option<f64> {
        self.sensor.level_sensor_ok.then_some(self.state.level)
    }
}

/// Pure transition for one tick given the sensor health after this tick's draw.
///
/// Returns the new state and its alarms. `previous.level` is the level from the
/// preceding tick, before any freeze is applied to the new state.
pub fn advance(
    model: &ProcessModel,
    evaluator: &AlarmEvaluator,
    policy: FaultPolicy,
    previous: &ProcessState,
    inputs: &ControlInputs,
    health: SensorHealth,
) -> (ProcessState, AlarmSet) {
    let mut next = model.step(previous, inputs);
    if health.is_faulted() && policy == FaultPolicy::FreezeLevel {
        next = next.with_level(previous.level);
    }
    let alarms = evaluator.evaluate(&next, previous.level, health);
    (next, alarms)
}

pub struct Engine {
    model: ProcessModel,
    evaluator: AlarmEvaluator,
    injector: FaultInjector,
    policy: FaultPolicy,
    limits: CommandLimits,
    timestamp_format: String,
    recorder: HistoryRecorder,
    ctx: EngineContext,
    alarms: AlarmSet,
    tick: u64,
}

impl Engine {
    pub fn new(
        settings: EngineSettings,
        initial_state: ProcessState,
        initial_inputs: ControlInputs,
        source: Box<dyn RandomSource>,
        recorder: HistoryRecorder,
    ) -> SimResult<Self> {
        if !is_valid_timestamp_format(&settings.timestamp_format) {
            return Err(SimError::InvalidArg {
                what: "timestamp format has an unknown or incomplete specifier",
            });
        }
        let injector = FaultInjector::new(settings.fault_probability, source)?;
        let evaluator = AlarmEvaluator::new(settings.thresholds);
        let health = SensorHealth::healthy();
        let alarms = evaluator.evaluate(&initial_state, initial_state.level, health);
        Ok(Self {
            model: ProcessModel::new(settings.rates),
            evaluator,
            injector,
            policy: settings.fault_policy,
            limits: settings.limits,
            timestamp_format: settings.timestamp_format,
            recorder,
            ctx: EngineContext {
                state: initial_state,
                inputs: initial_inputs,
                health,
            },
            alarms,
            tick: 0,
        })
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn state(&self) -> &ProcessState {
        &self.ctx.state
    }

    pub fn inputs(&self) -> &ControlInputs {
        &self.ctx.inputs
    }

    pub fn health(&self) -> SensorHealth {
        self.ctx.health
    }

    pub fn alarms(&self) -> AlarmSet {
        self.alarms
    }

    pub fn history(&self) -> &HistoryRecorder {
        &self.recorder
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Apply one command to the context. Takes effect from the next tick.
    ///
    /// A failed history removal still clears the in-memory log; the error only
    /// reports that the persisted copy could not be removed.
    pub fn apply(&mut self, command: Command) -> SimResult<()> {
        match command {
            Command::SetInflowRate(v) => {
                self.ctx.inputs.inflow_rate = self.limits.flow(v, "inflow rate")?;
            }
            Command::SetOutflowRate(v) => {
                self.ctx.inputs.outflow_rate = self.limits.flow(v, "outflow rate")?;
            }
            Command::SetHeater(on) => self.ctx.inputs.heater_on = on,
            Command::SetPump(on) => self.ctx.inputs.pump_on = on,
            Command::ResetSensor => {
                if self.ctx.health.is_faulted() {
                    info!(tick = self.tick, "level sensor reset by operator");
                }
                self.ctx.health = self.injector.reset();
            }
            Command::InjectSensorFault => {
                if self.ctx.health.level_sensor_ok {
                    warn!(tick = self.tick, level = self.ctx.state.level, "level sensor fault injected");
                }
                self.ctx.health = SensorHealth::faulted();
            }
            Command::ResetHistory => self.recorder.reset()?,
        }
        debug!(tick = self.tick, %command, "command applied");
        Ok(())
    }

    /// Run one tick stamped with the local wall clock.
    pub fn tick(&mut self) -> Snapshot {
        self.tick_at(&Local::now())
    }

    /// Run one tick. Never fails: persistence errors are logged and counted.
    pub fn tick_at<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Snapshot
    where
        Tz::Offset: std::fmt::Display,
    {
        let previous = self.ctx.state;
        let health = self.injector.maybe_fail(self.ctx.health);
        if self.ctx.health.level_sensor_ok && health.is_faulted() {
            warn!(tick = self.tick + 1, level = previous.level, "level sensor faulted");
        }

        let (next, alarms) = advance(
            &self.model,
            &self.evaluator,
            self.policy,
            &previous,
            &self.ctx.inputs,
            health,
        );

        let reading = health.level_sensor_ok.then_some(next.level);
        let record = HistoryRecord::new(
            format_timestamp(now, &self.timestamp_format),
            reading,
            next.temperature,
            next.pressure,
        );
        // The recorder logs and counts the failure; the in-memory log stays authoritative.
        let _ = self.recorder.append(record);

        self.ctx.state = next;
        self.ctx.health = health;
        self.alarms = alarms;
        self.tick += 1;
        self.snapshot()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            state: self.ctx.state,
            inputs: self.ctx.inputs,
            sensor: self.ctx.health,
            alarms: self.alarms,
            history: self.recorder.records().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::ScriptedSource;
    use tk_core::{Tolerances, nearly_equal};
    use tk_results::{HistoryOptions, MemoryStore};

    fn engine_with(state: ProcessState, inputs: ControlInputs, source: ScriptedSource) -> Engine {
        let recorder = HistoryRecorder::empty(Box::new(MemoryStore::new()), HistoryOptions::default());
        Engine::new(EngineSettings::default(), state, inputs, Box::new(source), recorder).unwrap()
    }

    #[test]
    fn advance_freezes_level_only_when_faulted() {
        let model = ProcessModel::default();
        let evaluator = AlarmEvaluator::default();
        let s0 = ProcessState::new(50.0, 25.0, 1.0).unwrap();
        let inputs = ControlInputs {
            inflow_rate: 8.0,
            outflow_rate: 0.0,
            heater_on: true,
            pump_on: true,
        };

        let (ok, _) = advance(&model, &evaluator, FaultPolicy::FreezeLevel, &s0, &inputs, SensorHealth::healthy());
        assert_eq!(ok.level, 58.0);

        let (frozen, alarms) = advance(&model, &evaluator, FaultPolicy::FreezeLevel, &s0, &inputs, SensorHealth::faulted());
        assert_eq!(frozen.level, 50.0);
        assert!(nearly_equal(frozen.temperature, 25.5, Tolerances::default()));
        assert!(nearly_equal(frozen.pressure, 1.1, Tolerances::default()));
        assert!(alarms.sensor_fault);
        assert!(!alarms.rapid_change);

        let (masked, _) = advance(&model, &evaluator, FaultPolicy::MaskOnly, &s0, &inputs, SensorHealth::faulted());
        assert_eq!(masked.level, 58.0);
    }

    #[test]
    fn commands_apply_from_next_tick() {
        let mut engine = engine_with(ProcessState::default(), ControlInputs::default(), ScriptedSource::never());
        engine.apply(Command::SetInflowRate(7.0)).unwrap();
        assert_eq!(engine.state().level, 50.0);

        let snap = engine.tick();
        assert_eq!(snap.level(), 52.0);
        assert_eq!(snap.tick, 1);
    }

    #[test]
    fn non_finite_setpoint_is_rejected_and_context_unchanged() {
        let mut engine = engine_with(ProcessState::default(), ControlInputs::default(), ScriptedSource::never());
        assert!(engine.apply(Command::SetOutflowRate(f64::NAN)).is_err());
        assert_eq!(engine.inputs().outflow_rate, 5.0);
    }

    #[test]
    fn bad_timestamp_format_is_rejected_at_construction() {
        let settings = EngineSettings {
            timestamp_format: "%H:%M:%Q".to_string(),
            ..EngineSettings::default()
        };
        let recorder = HistoryRecorder::empty(Box::new(MemoryStore::new()), HistoryOptions::default());
        let result = Engine::new(
            settings,
            ProcessState::default(),
            ControlInputs::default(),
            Box::new(ScriptedSource::never()),
            recorder,
        );
        assert!(matches!(result, Err(SimError::InvalidArg { .. })));
    }

    #[test]
    fn masked_reading_in_history() {
        let mut engine = engine_with(ProcessState::default(), ControlInputs::default(), ScriptedSource::fault_at(1));
        let first = engine.tick();
        assert_eq!(first.history[0].level, Some(50.0));
        assert_eq!(first.level_reading(), Some(50.0));

        let second = engine.tick();
        assert!(second.sensor.is_faulted());
        assert_eq!(second.history[1].level, None);
        assert_eq!(second.level_reading(), None);
    }
}
