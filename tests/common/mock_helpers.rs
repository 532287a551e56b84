//! Mock construction helpers

use pipeview::error::Result;
use pipeview::sync::{ActivitySynchronizer, MemoryWaveform, WaveformService};
use crossbeam_channel::{unbounded, Receiver, Sender};
use pipeview::{GraphItem, GraphModel};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// In-memory waveform that stays inspectable after it moves into a worker thread.
#[derive(Clone, Default)]
pub struct SharedWaveform {
    inner: Arc<Mutex<MemoryWaveform>>,
}

impl SharedWaveform {
    pub fn new(waveform: MemoryWaveform) -> Self {
        Self {
            inner: Arc::new(Mutex::new(waveform)),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.inner.lock().unwrap().commands().to_vec()
    }

    pub fn query_count(&self) -> usize {
        self.inner.lock().unwrap().query_count()
    }
}

impl WaveformService for SharedWaveform {
    fn list_signals(&mut self) -> Result<Vec<String>> {
        self.inner.lock().unwrap().list_signals()
    }

    fn query_values(&mut self, time: u64, signals: &[String]) -> Result<Vec<String>> {
        self.inner.lock().unwrap().query_values(time, signals)
    }

    fn run_command(&mut self, commands: &[String]) -> Result<()> {
        self.inner.lock().unwrap().run_command(commands)
    }
}

/// Waveform whose value queries block until the test opens the gate.
///
/// Signal listing and display commands pass straight through.
pub struct GatedWaveform {
    inner: SharedWaveform,
    gate: Receiver<()>,
}

impl GatedWaveform {
    /// Returns the service and the sender that releases one query per message.
    pub fn new(waveform: MemoryWaveform) -> (Self, Sender<()>) {
        let (tx, rx) = unbounded();
        let service = Self {
            inner: SharedWaveform::new(waveform),
            gate: rx,
        };
        (service, tx)
    }
}

impl WaveformService for GatedWaveform {
    fn list_signals(&mut self) -> Result<Vec<String>> {
        self.inner.list_signals()
    }

    fn query_values(&mut self, time: u64, signals: &[String]) -> Result<Vec<String>> {
        // a closed gate means the test is over
        let _ = self.gate.recv();
        self.inner.query_values(time, signals)
    }

    fn run_command(&mut self, commands: &[String]) -> Result<()> {
        self.inner.run_command(commands)
    }
}

/// Handshake signal names (`<stem>_valid`, `<stem>_ready`) for every pipe.
pub fn handshake_signals(model: &GraphModel) -> Vec<String> {
    model
        .pipes()
        .flat_map(|p| {
            let stem = pipeview::sync::port_stem(&p.name);
            [format!("{}_valid", stem), format!("{}_ready", stem)]
        })
        .collect()
}

/// Poll the synchronizer until `done` holds or the test timeout expires.
///
/// Returns every item reported as changed along the way.
pub fn poll_until(
    sync: &mut ActivitySynchronizer,
    model: &mut GraphModel,
    mut done: impl FnMut(&GraphModel) -> bool,
) -> Vec<GraphItem> {
    let deadline = Instant::now() + super::test_timeout();
    let mut changed = Vec::new();
    while !done(model) {
        assert!(Instant::now() < deadline, "timed out waiting for waveform responses");
        changed.extend(sync.poll(model));
        std::thread::sleep(std::time::Duration::from_millis(2));
    }
    changed
}
