//! Append-only history log with a full-rewrite persisted mirror.

use crate::store::HistoryStore;
use crate::types::{DEFAULT_HISTORY_KEY, HistoryRecord};
use crate::ResultsResult;
use tracing::{debug, info, warn};

/// Recorder settings.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryOptions {
    /// Key the log is persisted under.
    pub key: String,
    /// Keep at most this many records, dropping the oldest first. `None` is unbounded.
    pub max_records: Option<usize>,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            key: DEFAULT_HISTORY_KEY.to_string(),
            max_records: None,
        }
    }
}

/// What happened when the persisted history was read at startup.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadOutcome {
    /// Nothing stored under the key.
    Missing,
    /// Payload parsed successfully.
    Loaded { count: usize },
    /// Payload could not be read from the store.
    Unreadable { reason: String },
    /// Payload was read but is not a well-formed record list.
    Corrupt { reason: String },
}

impl LoadOutcome {
    /// True when a stored payload had to be discarded.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Unreadable { .. } | Self::Corrupt { .. })
    }
}

/// Read the persisted history, falling back to an empty log on any failure.
pub fn load_or_empty(store: &dyn HistoryStore, key: &str) -> (Vec<HistoryRecord>, LoadOutcome) {
    let payload = match store.get(key) {
        Ok(Some(payload)) => payload,
        Ok(None) => return (Vec::new(), LoadOutcome::Missing),
        Err(e) => {
            return (
                Vec::new(),
                LoadOutcome::Unreadable {
                    reason: e.to_string(),
                },
            );
        }
    };

    match serde_json::from_str::<Vec<HistoryRecord>>(&payload) {
        Ok(records) => {
            let count = records.len();
            (records, LoadOutcome::Loaded { count })
        }
        Err(e) => (
            Vec::new(),
            LoadOutcome::Corrupt {
                reason: e.to_string(),
            },
        ),
    }
}

/// Owns the in-memory history and keeps the store in sync with it.
///
/// The in-memory log is authoritative. A failed write leaves the persisted copy
/// stale until the next successful full rewrite.
pub struct HistoryRecorder {
    store: Box<dyn HistoryStore>,
    options: HistoryOptions,
    records: Vec<HistoryRecord>,
    write_failures: u64,
}

impl HistoryRecorder {
    /// Open the recorder, restoring whatever the store holds under the key.
    pub fn open(store: Box<dyn HistoryStore>, options: HistoryOptions) -> (Self, LoadOutcome) {
        let (records, outcome) = load_or_empty(store.as_ref(), &options.key);
        match &outcome {
            LoadOutcome::Missing => debug!(key = %options.key, "no persisted history"),
            LoadOutcome::Loaded { count } => {
                info!(key = %options.key, count, "restored persisted history")
            }
            LoadOutcome::Unreadable { reason } | LoadOutcome::Corrupt { reason } => {
                warn!(key = %options.key, %reason, "discarding persisted history, starting empty")
            }
        }

        let mut recorder = Self {
            store,
            options,
            records,
            write_failures: 0,
        };
        recorder.enforce_bound();
        (recorder, outcome)
    }

    /// Start from an empty log without reading the store.
    pub fn empty(store: Box<dyn HistoryStore>, options: HistoryOptions) -> Self {
        Self {
            store,
            options,
            records: Vec::new(),
            write_failures: 0,
        }
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryRecord> {
        self.records.last()
    }

    pub fn options(&self) -> &HistoryOptions {
        &self.options
    }

    /// Number of persistence writes that failed since the recorder was opened.
    pub fn write_failures(&self) -> u64 {
        self.write_failures
    }

    /// Append one record and rewrite the persisted log.
    ///
    /// The record is kept in memory even when the write fails; the error only
    /// reports that the persisted copy is behind.
    pub fn append(&mut self, record: HistoryRecord) -> ResultsResult<()> {
        self.records.push(record);
        self.enforce_bound();
        self.persist()
    }

    /// Serialize the whole log and write it under the key.
    pub fn persist(&mut self) -> ResultsResult<()> {
        let result = serde_json::to_string(&self.records)
            .map_err(Into::into)
            .and_then(|payload| self.store.put(&self.options.key, &payload));
        if let Err(e) = &result {
            self.write_failures += 1;
            warn!(
                key = %self.options.key,
                records = self.records.len(),
                failures = self.write_failures,
                error = %e,
                "history write failed, in-memory log kept"
            );
        }
        result
    }

    /// Clear the in-memory log and remove the persisted copy.
    pub fn reset(&mut self) -> ResultsResult<()> {
        let dropped = self.records.len();
        self.records.clear();
        info!(key = %self.options.key, dropped, "history reset");
        self.store.remove(&self.options.key).inspect_err(|e| {
            self.write_failures += 1;
            warn!(key = %self.options.key, error = %e, "failed to remove persisted history");
        })
    }

    /// Render the log as CSV with an empty cell for masked levels.
    pub fn to_csv(&self) -> String {
        records_to_csv(&self.records)
    }

    fn enforce_bound(&mut self) {
        if let Some(max) = self.options.max_records
            && self.records.len() > max
        {
            let excess = self.records.len() - max;
            self.records.drain(..excess);
        }
    }
}

/// CSV rendering shared by the recorder and offline export.
pub fn records_to_csv(records: &[HistoryRecord]) -> String {
    let mut out = String::from("timestamp,level,temperature,pressure\n");
    for r in records {
        let level = r.level.map(|v| v.to_string()).unwrap_or_default();
        out.push_str(&format!(
            "{},{},{},{}\n",
            csv_field(&r.timestamp),
            level,
            r.temperature,
            r.pressure
        ));
    }
    out
}

/// Quote a text cell when it would otherwise split the row.
fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}
