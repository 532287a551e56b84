//! Activity, issue and waveform sources.
//!
//! These traits are the seams to the collaborators that know about the
//! running simulation. The crate ships a table-backed in-process source and
//! an in-memory waveform service; real integrations implement the traits.

use crate::error::Result;
use crate::types::Status;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Errors returned by an [`ActivitySource`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActivityError {
    /// The model is not simulated in-process.
    #[error("'{0}' is not simulated in-process")]
    NotFound(String),

    #[error("Activity source unavailable: {0}")]
    Unavailable(String),
}

/// In-process simulation activity, queried per model and time.
#[cfg_attr(test, mockall::automock)]
pub trait ActivitySource {
    /// Status of the model behind `model_ref` at `time`.
    ///
    /// `model_ref` is the path of the pipe's producer port.
    fn get_status(&self, model_ref: &str, time: u64) -> std::result::Result<Status, ActivityError>;
}

/// A diagnostic attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub node_path: String,
    pub message: String,
}

/// Issue-tracking collaborator. Any related issue forces `Error` status.
#[cfg_attr(test, mockall::automock)]
pub trait IssueSource {
    fn related_issues(&self, node_path: &str) -> Vec<Issue>;
}

/// External waveform service (a waveform viewer process or a trace file).
///
/// Implementations may block; they are driven from a worker thread by
/// [`WaveformBridge`](super::transport::WaveformBridge).
#[cfg_attr(test, mockall::automock)]
pub trait WaveformService: Send {
    fn list_signals(&mut self) -> Result<Vec<String>>;

    /// One value token per requested signal, in request order.
    fn query_values(&mut self, time: u64, signals: &[String]) -> Result<Vec<String>>;

    /// Fire-and-forget display commands.
    fn run_command(&mut self, commands: &[String]) -> Result<()>;
}

/// Status table keyed by model reference, with step-wise values over time.
#[derive(Debug, Clone, Default)]
pub struct InProcessActivity {
    table: HashMap<String, BTreeMap<u64, Status>>,
}

impl InProcessActivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `model_ref` has `status` from `time` on.
    pub fn record(&mut self, model_ref: impl Into<String>, time: u64, status: Status) {
        self.table
            .entry(model_ref.into())
            .or_default()
            .insert(time, status);
    }

    pub fn with_status(mut self, model_ref: impl Into<String>, time: u64, status: Status) -> Self {
        self.record(model_ref, time, status);
        self
    }

    pub fn contains(&self, model_ref: &str) -> bool {
        self.table.contains_key(model_ref)
    }
}

impl ActivitySource for InProcessActivity {
    fn get_status(&self, model_ref: &str, time: u64) -> std::result::Result<Status, ActivityError> {
        let changes = self
            .table
            .get(model_ref)
            .ok_or_else(|| ActivityError::NotFound(model_ref.to_string()))?;
        Ok(changes
            .range(..=time)
            .next_back()
            .map(|(_, &status)| status)
            .unwrap_or_default())
    }
}

/// Value token returned for unknown signals or times before the first change.
pub const UNKNOWN_VALUE: &str = "x";

/// In-memory waveform: value changes per signal.
#[derive(Debug, Clone, Default)]
pub struct MemoryWaveform {
    signals: BTreeMap<String, BTreeMap<u64, String>>,
    commands: Vec<String>,
    queries: usize,
}

impl MemoryWaveform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value change of `signal` at `time`.
    pub fn set(&mut self, signal: impl Into<String>, time: u64, value: impl Into<String>) {
        self.signals
            .entry(signal.into())
            .or_default()
            .insert(time, value.into());
    }

    /// Add a signal with its value changes.
    pub fn with_signal(mut self, signal: &str, changes: &[(u64, &str)]) -> Self {
        for &(time, value) in changes {
            self.set(signal, time, value);
        }
        self.signals.entry(signal.to_string()).or_default();
        self
    }

    pub fn value_at(&self, signal: &str, time: u64) -> &str {
        self.signals
            .get(signal)
            .and_then(|changes| changes.range(..=time).next_back())
            .map(|(_, v)| v.as_str())
            .unwrap_or(UNKNOWN_VALUE)
    }

    /// Display commands received so far.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Number of `query_values` calls served.
    pub fn query_count(&self) -> usize {
        self.queries
    }
}

impl WaveformService for MemoryWaveform {
    fn list_signals(&mut self) -> Result<Vec<String>> {
        Ok(self.signals.keys().cloned().collect())
    }

    fn query_values(&mut self, time: u64, signals: &[String]) -> Result<Vec<String>> {
        self.queries += 1;
        Ok(signals
            .iter()
            .map(|s| self.value_at(s, time).to_string())
            .collect())
    }

    fn run_command(&mut self, commands: &[String]) -> Result<()> {
        self.commands.extend_from_slice(commands);
        Ok(())
    }
}
