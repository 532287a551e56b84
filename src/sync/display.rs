//! Display commands for the external waveform viewer.
//!
//! Selecting a pipe in the graph adds its handshake signals to the viewer as
//! a named group and highlights them. Commands are fire-and-forget and never
//! touch status logic.

use crate::error::Result;
use crate::graph::{GraphModel, PipeId};
use crate::sync::client::WaveformClient;
use crate::sync::signal_index::PipeSignals;

/// Commands that show `signals` as a group named after the pipe.
pub fn display_commands(group: &str, signals: &PipeSignals) -> Vec<String> {
    let mut commands = vec![format!("group_begin {}", group)];
    commands.extend(signals.all().map(|s| format!("add {}", s)));
    commands.push("group_end".to_string());
    commands.push(format!("highlight {}", signals.valid));
    commands.push(format!("highlight {}", signals.ready));
    commands
}

impl WaveformClient {
    /// Show the signals of `pipe` in the viewer.
    ///
    /// Returns false (and sends nothing) if the pipe has no resolved signals
    /// or the signal index is not built yet.
    pub fn show_pipe_signals(&mut self, model: &GraphModel, pipe: PipeId) -> Result<bool> {
        let Some(signals) = self.index().and_then(|index| index.signals(pipe)) else {
            return Ok(false);
        };
        let commands = display_commands(&model.pipe(pipe).name, signals);
        tracing::debug!("Showing {} signals of '{}'", commands.len(), model.pipe(pipe).name);
        self.run_command(commands)?;
        Ok(true)
    }
}
