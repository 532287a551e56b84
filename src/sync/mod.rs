//! Activity status synchronizer.
//!
//! Keeps pipe and node statuses in step with the simulation time. On every
//! time advance:
//!
//! 1. Visible pipes not yet computed for this time are looked up in the
//!    in-process [`ActivitySource`], keyed by producer port path. A
//!    `NotFound` answer leaves the pipe to the waveform path.
//! 2. The [`WaveformClient`] starts (or coalesces) a batched query for the
//!    remaining pipes. Responses are applied whenever they are polled.
//! 3. Node statuses are derived from the visible pipes, with the issue
//!    override on top. A node whose visible pipes still wait on a waveform
//!    answer for the current time keeps its status until that answer is
//!    polled.
//!
//! Without any source the synchronizer is inert and statuses stay as they
//! are. Collaborators are passed in explicitly through
//! [`SimulationContext`].

pub mod client;
pub mod display;
pub mod signal_index;
pub mod source;
pub mod transport;

pub use client::WaveformClient;
pub use display::display_commands;
pub use signal_index::{port_stem, PipeSignals, SignalIndex};
pub use source::{
    ActivityError, ActivitySource, InProcessActivity, Issue, IssueSource, MemoryWaveform,
    WaveformService, UNKNOWN_VALUE,
};
pub use transport::{InlineTransport, WaveformBridge, WaveformRequest, WaveformResponse, WaveformTransport};

use crate::graph::{GraphModel, NodeId, PipeId};
use crate::types::{GraphItem, Status};

/// Collaborators the synchronizer pulls activity from.
#[derive(Default)]
pub struct SimulationContext {
    pub activity: Option<Box<dyn ActivitySource>>,
    pub issues: Option<Box<dyn IssueSource>>,
    pub waveform: Option<WaveformClient>,
}

impl SimulationContext {
    /// No sources at all: running detached from any simulator.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn with_activity(mut self, activity: impl ActivitySource + 'static) -> Self {
        self.activity = Some(Box::new(activity));
        self
    }

    pub fn with_issues(mut self, issues: impl IssueSource + 'static) -> Self {
        self.issues = Some(Box::new(issues));
        self
    }

    pub fn with_waveform(mut self, client: WaveformClient) -> Self {
        self.waveform = Some(client);
        self
    }
}

/// Pushes activity status onto the graph model.
pub struct ActivitySynchronizer {
    context: SimulationContext,
    time: Option<u64>,
    /// Some node derivation was held back waiting on the waveform.
    deferred: bool,
}

impl ActivitySynchronizer {
    pub fn new(context: SimulationContext) -> Self {
        Self {
            context,
            time: None,
            deferred: false,
        }
    }

    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SimulationContext {
        &mut self.context
    }

    /// Last time index seen.
    pub fn current_time(&self) -> Option<u64> {
        self.time
    }

    /// Update statuses for a new time index.
    ///
    /// Returns every pipe and node whose status changed.
    pub fn on_time_advanced(&mut self, model: &mut GraphModel, time: u64) -> Vec<GraphItem> {
        self.time = Some(time);
        let mut changed = self.sync_in_process(model, time);

        if let Some(client) = &mut self.context.waveform {
            if let Err(e) = client.request_update(model, time) {
                tracing::warn!("Waveform request failed at t={}: {}", time, e);
            }
            match client.poll(model) {
                Ok(pipes) => changed.extend(pipes),
                Err(e) => tracing::warn!("Waveform poll failed: {}", e),
            }
        }

        self.finish(model, changed)
    }

    /// Apply any waveform responses that arrived since the last call.
    pub fn poll(&mut self, model: &mut GraphModel) -> Vec<GraphItem> {
        let Some(client) = &mut self.context.waveform else {
            return Vec::new();
        };
        let changed = match client.poll(model) {
            Ok(pipes) => pipes,
            Err(e) => {
                tracing::warn!("Waveform poll failed: {}", e);
                Vec::new()
            }
        };
        if changed.is_empty() && !self.deferred {
            return Vec::new();
        }
        self.finish(model, changed)
    }

    /// Show the signals of `pipe` in the waveform viewer, if one is attached.
    pub fn show_pipe_signals(&mut self, model: &GraphModel, pipe: PipeId) -> bool {
        let Some(client) = &mut self.context.waveform else {
            return false;
        };
        match client.show_pipe_signals(model, pipe) {
            Ok(shown) => shown,
            Err(e) => {
                tracing::warn!("Failed to show signals of '{}': {}", model.pipe(pipe).name, e);
                false
            }
        }
    }

    /// Pipe traced by a waveform signal name.
    pub fn pipe_for_signal(&self, signal: &str) -> Option<PipeId> {
        self.context
            .waveform
            .as_ref()
            .and_then(WaveformClient::index)
            .and_then(|index| index.pipe_for_signal(signal))
    }

    fn sync_in_process(&self, model: &mut GraphModel, time: u64) -> Vec<PipeId> {
        let Some(activity) = &self.context.activity else {
            return Vec::new();
        };

        let stale: Vec<PipeId> = model
            .visible_pipes()
            .filter(|&p| model.pipe(p).status_time != Some(time))
            .collect();

        let mut changed = Vec::new();
        for pipe_id in stale {
            let model_ref = &model.port(model.pipe(pipe_id).producer).path;
            let status = match activity.get_status(model_ref, time) {
                Ok(status) => status,
                Err(ActivityError::NotFound(_)) => continue,
                Err(e) => {
                    tracing::warn!("In-process activity lookup failed: {}", e);
                    continue;
                }
            };

            let pipe = model.pipe_mut(pipe_id);
            pipe.status_time = Some(time);
            if pipe.status != status {
                tracing::trace!("Pipe '{}': {} -> {}", pipe.name, pipe.status, status);
                pipe.status = status;
                changed.push(pipe_id);
            }
        }
        changed
    }

    /// Derive node statuses for every node whose pipes are all in for the
    /// current time.
    fn finish(&mut self, model: &mut GraphModel, pipes: Vec<PipeId>) -> Vec<GraphItem> {
        let mut changed: Vec<GraphItem> = pipes.into_iter().map(GraphItem::Pipe).collect();
        self.deferred = false;
        for id in model.visible_post_order(model.root()) {
            if self.awaits_waveform(model, id) {
                self.deferred = true;
                continue;
            }
            let status = self.derive_node_status(model, id);
            let node = model.node_mut(id);
            if node.status != status {
                tracing::trace!("Node '{}': {} -> {}", node.path, node.status, status);
                node.status = status;
                changed.push(GraphItem::Node(id));
            }
        }
        changed
    }

    /// Whether a visible pipe of `id` still waits on a waveform answer.
    fn awaits_waveform(&self, model: &GraphModel, id: NodeId) -> bool {
        let (Some(client), Some(time)) = (&self.context.waveform, self.time) else {
            return false;
        };
        model
            .input_pipes(id)
            .chain(model.output_pipes(id))
            .filter(|&p| model.is_pipe_visible(p))
            .any(|p| client.awaits(model, p, time))
    }

    /// `Error` if the issue source reports anything for the node; otherwise
    /// `Stuck` if a visible input is active while no visible output flows.
    fn derive_node_status(&self, model: &GraphModel, id: NodeId) -> Status {
        if let Some(issues) = &self.context.issues {
            if !issues.related_issues(&model.node(id).path).is_empty() {
                return Status::Error;
            }
        }

        let input_active = model
            .input_pipes(id)
            .filter(|&p| model.is_pipe_visible(p))
            .any(|p| model.pipe(p).status == Status::Active);
        let output_flowing = model
            .output_pipes(id)
            .filter(|&p| model.is_pipe_visible(p))
            .any(|p| model.pipe(p).status.is_flowing());

        if input_active && !output_flowing {
            Status::Stuck
        } else {
            Status::Empty
        }
    }
}
