//! Transport between the synchronizer and a waveform service.
//!
//! The service may block for a long time, so the normal transport is
//! [`WaveformBridge`]: a worker thread owns the service and talks to the core
//! thread over crossbeam channels. Responses are only ever consumed on the
//! core thread, by polling. [`InlineTransport`] serves requests synchronously
//! into a queue, for single-threaded hosts and deterministic tests.

use crate::error::{PipeViewError, Result};
use crate::sync::source::WaveformService;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::collections::VecDeque;
use std::thread::JoinHandle;

/// Channel capacity for requests (core -> worker).
const REQUEST_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaveformRequest {
    ListSignals,
    QueryValues { time: u64, signals: Vec<String> },
    /// Fire-and-forget; produces no response.
    RunCommand(Vec<String>),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaveformResponse {
    Signals(Vec<String>),
    Values { time: u64, values: Vec<String> },
    /// The service failed to answer a request.
    Failed(String),
}

/// Request/response channel to a waveform service.
pub trait WaveformTransport {
    fn send(&mut self, request: WaveformRequest) -> Result<()>;

    /// Next response, if one is ready.
    fn try_recv(&mut self) -> Option<WaveformResponse>;
}

/// Serve one request against `service`.
fn serve(service: &mut dyn WaveformService, request: WaveformRequest) -> Option<WaveformResponse> {
    match request {
        WaveformRequest::ListSignals => Some(match service.list_signals() {
            Ok(signals) => WaveformResponse::Signals(signals),
            Err(e) => WaveformResponse::Failed(e.to_string()),
        }),
        WaveformRequest::QueryValues { time, signals } => {
            Some(match service.query_values(time, &signals) {
                Ok(values) => WaveformResponse::Values { time, values },
                Err(e) => WaveformResponse::Failed(e.to_string()),
            })
        }
        WaveformRequest::RunCommand(commands) => {
            if let Err(e) = service.run_command(&commands) {
                tracing::warn!("Waveform display command failed: {}", e);
            }
            None
        }
        WaveformRequest::Shutdown => None,
    }
}

/// Worker-thread transport.
pub struct WaveformBridge {
    req_tx: Sender<WaveformRequest>,
    resp_rx: Receiver<WaveformResponse>,
    worker: Option<JoinHandle<()>>,
}

impl WaveformBridge {
    /// Spawn a worker thread that owns `service`.
    pub fn spawn<S: WaveformService + 'static>(service: S) -> Result<Self> {
        let (req_tx, req_rx) = bounded(REQUEST_CHANNEL_CAPACITY);
        let (resp_tx, resp_rx) = unbounded();

        let worker = std::thread::Builder::new()
            .name("waveform".to_string())
            .spawn(move || run_worker(service, req_rx, resp_tx))?;

        Ok(Self {
            req_tx,
            resp_rx,
            worker: Some(worker),
        })
    }

    /// Block until a response arrives. Returns `None` once the worker is gone.
    pub fn recv(&self) -> Option<WaveformResponse> {
        self.resp_rx.recv().ok()
    }
}

fn run_worker<S: WaveformService>(
    mut service: S,
    requests: Receiver<WaveformRequest>,
    responses: Sender<WaveformResponse>,
) {
    tracing::debug!("Waveform worker started");
    for request in requests.iter() {
        if request == WaveformRequest::Shutdown {
            break;
        }
        if let Some(response) = serve(&mut service, request) {
            if responses.send(response).is_err() {
                break;
            }
        }
    }
    tracing::debug!("Waveform worker stopped");
}

impl WaveformTransport for WaveformBridge {
    fn send(&mut self, request: WaveformRequest) -> Result<()> {
        self.req_tx
            .send(request)
            .map_err(|_| PipeViewError::Channel("waveform worker disconnected".to_string()))
    }

    fn try_recv(&mut self) -> Option<WaveformResponse> {
        self.resp_rx.try_recv().ok()
    }
}

impl Drop for WaveformBridge {
    fn drop(&mut self) {
        let _ = self.req_tx.send(WaveformRequest::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Synchronous transport: requests are served on `send`, responses are
/// queued until polled.
pub struct InlineTransport<S> {
    service: S,
    responses: VecDeque<WaveformResponse>,
}

impl<S: WaveformService> InlineTransport<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            responses: VecDeque::new(),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }
}

impl<S: WaveformService> WaveformTransport for InlineTransport<S> {
    fn send(&mut self, request: WaveformRequest) -> Result<()> {
        if let Some(response) = serve(&mut self.service, request) {
            self.responses.push_back(response);
        }
        Ok(())
    }

    fn try_recv(&mut self) -> Option<WaveformResponse> {
        self.responses.pop_front()
    }
}
