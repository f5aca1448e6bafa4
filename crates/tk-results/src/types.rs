//! History data types.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use std::fmt::Write;
use serde::{Deserialize, Serialize};

/// Default key the history is persisted under.
pub const DEFAULT_HISTORY_KEY: &str = "process_history";

/// Default wall-clock format for record timestamps.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// One tick's worth of recorded readings.
///
/// `level` is the instrument reading: `None` while the level sensor is faulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub timestamp: String,
    pub level: Option<f64>,
    pub temperature: f64,
    pub pressure: f64,
}

impl HistoryRecord {
    pub fn new(timestamp: impl Into<String>, level: Option<f64>, temperature: f64, pressure: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            level,
            temperature,
            pressure,
        }
    }

    pub fn level_masked(&self) -> bool {
        self.level.is_none()
    }
}

/// True when every specifier in `format` is one chrono understands.
pub fn is_valid_timestamp_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Render a record timestamp the way an operator display shows wall-clock time.
///
/// A format chrono cannot render falls back to [`DEFAULT_TIMESTAMP_FORMAT`].
pub fn format_timestamp<Tz: TimeZone>(now: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    if write!(out, "{}", now.format(format)).is_ok() {
        return out;
    }
    out.clear();
    let _ = write!(out, "{}", now.format(DEFAULT_TIMESTAMP_FORMAT));
    out
}
