//! Configuration validation logic.

use chrono::format::{Item, StrftimeItems};

use crate::schema::{AlarmsDef, CommandsDef, EngineConfig, FaultDef, HistoryDef, ProcessDef};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Inconsistent values: {what}")]
    Inconsistent { what: String },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn check_range(field: &str, value: f64, lo: f64, hi: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(invalid(field, value, "must be finite"));
    }
    if value < lo || value > hi {
        return Err(invalid(field, value, &format!("must be within [{lo}, {hi}]")));
    }
    Ok(())
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(invalid(field, value, "must be finite"));
    }
    if value < 0.0 {
        return Err(invalid(field, value, "must not be negative"));
    }
    Ok(())
}

pub fn validate_config(config: &EngineConfig) -> Result<(), ValidationError> {
    if config.tick_period_ms == 0 {
        return Err(invalid("tick_period_ms", 0, "must be positive"));
    }

    let s = &config.initial_state;
    check_range("initial_state.level_pct", s.level_pct, 0.0, 100.0)?;
    check_range("initial_state.temperature_c", s.temperature_c, 0.0, 100.0)?;
    check_range("initial_state.pressure_bar", s.pressure_bar, 0.0, 5.0)?;

    let i = &config.initial_inputs;
    if !i.inflow_lps.is_finite() {
        return Err(invalid("initial_inputs.inflow_lps", i.inflow_lps, "must be finite"));
    }
    if !i.outflow_lps.is_finite() {
        return Err(invalid("initial_inputs.outflow_lps", i.outflow_lps, "must be finite"));
    }

    validate_process(&config.process)?;
    validate_alarms(&config.alarms)?;
    validate_fault(&config.fault)?;
    validate_history(&config.history)?;
    validate_commands(&config.commands)?;
    Ok(())
}

fn validate_process(process: &ProcessDef) -> Result<(), ValidationError> {
    check_non_negative("process.heater_rise_c", process.heater_rise_c)?;
    check_non_negative("process.ambient_cooling_c", process.ambient_cooling_c)?;
    check_non_negative("process.pump_rise_bar", process.pump_rise_bar)?;
    check_non_negative("process.pressure_decay_bar", process.pressure_decay_bar)?;
    Ok(())
}

fn validate_alarms(alarms: &AlarmsDef) -> Result<(), ValidationError> {
    check_range("alarms.level_high_pct", alarms.level_high_pct, 0.0, 100.0)?;
    check_range("alarms.level_low_pct", alarms.level_low_pct, 0.0, 100.0)?;
    check_range("alarms.temperature_high_c", alarms.temperature_high_c, 0.0, 100.0)?;
    check_range("alarms.pressure_high_bar", alarms.pressure_high_bar, 0.0, 5.0)?;
    check_non_negative("alarms.rapid_change_pct", alarms.rapid_change_pct)?;
    if alarms.level_low_pct >= alarms.level_high_pct {
        return Err(ValidationError::Inconsistent {
            what: format!(
                "alarms.level_low_pct ({}) must be below alarms.level_high_pct ({})",
                alarms.level_low_pct, alarms.level_high_pct
            ),
        });
    }
    Ok(())
}

fn validate_fault(fault: &FaultDef) -> Result<(), ValidationError> {
    check_range("fault.probability", fault.probability, 0.0, 1.0)
}

fn validate_history(history: &HistoryDef) -> Result<(), ValidationError> {
    let key_ok = !history.key.is_empty()
        && history
            .key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && history.key != "."
        && history.key != "..";
    if !key_ok {
        return Err(invalid(
            "history.key",
            &history.key,
            "must be non-empty and use only letters, digits, '_', '-' or '.'",
        ));
    }
    if history.max_records == Some(0) {
        return Err(invalid("history.max_records", 0, "must be positive when set"));
    }
    if history.timestamp_format.is_empty() {
        return Err(invalid("history.timestamp_format", "\"\"", "must not be empty"));
    }
    if StrftimeItems::new(&history.timestamp_format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid(
            "history.timestamp_format",
            &history.timestamp_format,
            "contains an unknown or incomplete strftime specifier",
        ));
    }
    Ok(())
}

fn validate_commands(commands: &CommandsDef) -> Result<(), ValidationError> {
    let [lo, hi] = commands.flow_limits_lps;
    if !lo.is_finite() || !hi.is_finite() || lo > hi {
        return Err(ValidationError::Inconsistent {
            what: format!("commands.flow_limits_lps [{lo}, {hi}] must be finite and ordered"),
        });
    }
    Ok(())
}
