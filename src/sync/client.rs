//! Coalescing client for the external waveform service.
//!
//! At most one round trip is outstanding at any time. A time advance that
//! arrives while a request is in flight does not send anything: it records
//! the newest time, drops the not-yet-sent batches of the stale cycle and
//! raises the "update again" flag. When the in-flight response is consumed,
//! exactly one follow-up cycle starts for the newest time.
//!
//! ```text
//! Idle --advance--> InFlight --response--> (more batches?) InFlight
//!                      |                   (update again?) InFlight (new cycle)
//!                      +--advance--> flag set              otherwise Idle
//! ```
//!
//! The first round trip lists the service's signals and builds the
//! [`SignalIndex`]; every later cycle queries the valid/ready pairs of the
//! visible pipes, in batches bounded by `max_batch_signals`.

use crate::config::SyncSettings;
use crate::error::Result;
use crate::graph::{GraphModel, PipeId};
use crate::sync::signal_index::SignalIndex;
use crate::sync::transport::{WaveformRequest, WaveformResponse, WaveformTransport};
use crate::types::Status;
use std::collections::VecDeque;

/// One batch of pipes and the signals queried for them.
#[derive(Debug, Clone)]
struct Batch {
    time: u64,
    pipes: Vec<PipeId>,
    signals: Vec<String>,
}

#[derive(Debug, Clone)]
enum InFlight {
    ListSignals,
    Query(Batch),
}

/// Waveform client with request coalescing.
pub struct WaveformClient {
    transport: Box<dyn WaveformTransport>,
    settings: SyncSettings,
    index: Option<SignalIndex>,
    in_flight: Option<InFlight>,
    update_again: bool,
    pending: VecDeque<Batch>,
    target_time: u64,
    round_trips: u64,
}

impl WaveformClient {
    pub fn new(transport: impl WaveformTransport + 'static, settings: SyncSettings) -> Self {
        Self {
            transport: Box::new(transport),
            settings,
            index: None,
            in_flight: None,
            update_again: false,
            pending: VecDeque::new(),
            target_time: 0,
            round_trips: 0,
        }
    }

    /// The signal index, once the first round trip has completed.
    pub fn index(&self) -> Option<&SignalIndex> {
        self.index.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn update_pending(&self) -> bool {
        self.update_again
    }

    /// No request in flight, no batch queued and no follow-up requested.
    pub fn is_settled(&self) -> bool {
        self.in_flight.is_none() && self.pending.is_empty() && !self.update_again
    }

    /// Whether `pipe` still waits on an answer for `time`.
    ///
    /// Before the signal index exists every stale pipe waits; afterwards
    /// only pipes with traced signals do.
    pub fn awaits(&self, model: &GraphModel, pipe: PipeId, time: u64) -> bool {
        if model.pipe(pipe).status_time == Some(time) || self.is_settled() {
            return false;
        }
        match &self.index {
            Some(index) => index.signals(pipe).is_some(),
            None => true,
        }
    }

    /// Round trips sent so far (list and query requests).
    pub fn round_trips(&self) -> u64 {
        self.round_trips
    }

    /// Ask for statuses at `time`. Sends at most one request.
    pub fn request_update(&mut self, model: &GraphModel, time: u64) -> Result<()> {
        self.target_time = time;
        if self.in_flight.is_some() {
            if !self.pending.is_empty() {
                tracing::debug!("Dropping {} stale waveform batches", self.pending.len());
                self.pending.clear();
            }
            self.update_again = true;
            return Ok(());
        }
        self.start_cycle(model)
    }

    /// Consume every ready response, applying decoded statuses to `model`.
    ///
    /// Returns the pipes whose status changed.
    pub fn poll(&mut self, model: &mut GraphModel) -> Result<Vec<PipeId>> {
        let mut changed = Vec::new();
        while let Some(response) = self.transport.try_recv() {
            let Some(in_flight) = self.in_flight.take() else {
                tracing::warn!("Discarding unexpected waveform response");
                continue;
            };
            let mut listed = false;
            match (in_flight, response) {
                (InFlight::ListSignals, WaveformResponse::Signals(signals)) => {
                    self.index = Some(SignalIndex::build(model, &signals, &self.settings));
                    listed = true;
                }
                (InFlight::Query(batch), WaveformResponse::Values { time, values }) => {
                    if time != batch.time || values.len() != batch.signals.len() {
                        tracing::warn!(
                            "Waveform response mismatch at t={}: expected {} values, got {}",
                            batch.time,
                            batch.signals.len(),
                            values.len()
                        );
                    } else {
                        apply_batch(model, &batch, &values, &mut changed);
                    }
                }
                (_, WaveformResponse::Failed(msg)) => {
                    tracing::warn!("Waveform request failed: {}", msg);
                    self.pending.clear();
                }
                (_, other) => {
                    tracing::warn!("Waveform response out of order: {:?}", other);
                    self.pending.clear();
                }
            }
            self.advance(model, listed)?;
        }
        Ok(changed)
    }

    /// Send fire-and-forget display commands.
    pub fn run_command(&mut self, commands: Vec<String>) -> Result<()> {
        self.transport.send(WaveformRequest::RunCommand(commands))
    }

    /// After a response: start the first query cycle once the index is
    /// built, otherwise the next batch of this cycle, otherwise the coalesced
    /// follow-up, otherwise go idle.
    fn advance(&mut self, model: &GraphModel, listed: bool) -> Result<()> {
        if listed || (self.pending.is_empty() && self.update_again) {
            self.update_again = false;
            return self.start_cycle(model);
        }
        self.send_next()
    }

    fn start_cycle(&mut self, model: &GraphModel) -> Result<()> {
        let Some(index) = &self.index else {
            self.transport.send(WaveformRequest::ListSignals)?;
            self.round_trips += 1;
            self.in_flight = Some(InFlight::ListSignals);
            return Ok(());
        };

        let time = self.target_time;
        let stale: Vec<PipeId> = model
            .visible_pipes()
            .filter(|&p| model.pipe(p).status_time != Some(time))
            .filter(|&p| index.signals(p).is_some())
            .collect();

        self.pending = stale
            .chunks(self.settings.pipes_per_batch())
            .map(|chunk| {
                let signals = chunk
                    .iter()
                    .filter_map(|&p| index.signals(p))
                    .flat_map(|s| [s.valid.clone(), s.ready.clone()])
                    .collect();
                Batch {
                    time,
                    pipes: chunk.to_vec(),
                    signals,
                }
            })
            .collect();
        tracing::trace!(
            "Waveform cycle at t={}: {} pipes in {} batches",
            time,
            stale.len(),
            self.pending.len()
        );
        self.send_next()
    }

    fn send_next(&mut self) -> Result<()> {
        let Some(batch) = self.pending.pop_front() else {
            return Ok(());
        };
        let request = WaveformRequest::QueryValues {
            time: batch.time,
            signals: batch.signals.clone(),
        };
        if let Err(e) = self.transport.send(request) {
            self.pending.clear();
            return Err(e);
        }
        self.round_trips += 1;
        self.in_flight = Some(InFlight::Query(batch));
        Ok(())
    }
}

fn apply_batch(model: &mut GraphModel, batch: &Batch, values: &[String], changed: &mut Vec<PipeId>) {
    for (&pipe_id, pair) in batch.pipes.iter().zip(values.chunks(2)) {
        let status = Status::from_handshake(&pair[0], &pair[1]);
        let pipe = model.pipe_mut(pipe_id);
        pipe.status_time = Some(batch.time);
        if pipe.status != status {
            tracing::trace!("Pipe '{}': {} -> {}", pipe.name, pipe.status, status);
            pipe.status = status;
            changed.push(pipe_id);
        }
    }
}
