//! Pipe to waveform-signal resolution.
//!
//! A handshake pipe is traced as three signals sharing a stem:
//! `<stem>_valid`, `<stem>_ready` and optionally `<stem>_data`. The stem of
//! a port path is the path with `/` replaced by `.` (`top/a.dout` becomes
//! `top.a.dout`). Waveform dumps often add leading scopes of their own
//! (`TOP.tb.top.a.dout_valid`), so stems are matched on whole-segment
//! suffixes.
//!
//! Candidates are tried in order: the broadcast stem of a fan-out pipe
//! (`top.a.dout_bc_1`), the producer stem, then the consumer stem.
//!
//! The index is built once per waveform source and is read-only afterwards.

use crate::config::SyncSettings;
use crate::graph::{GraphModel, Pipe, PipeId};
use std::collections::{HashMap, HashSet};

/// Resolved signal names of one pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeSignals {
    pub stem: String,
    pub valid: String,
    pub ready: String,
    pub data: Option<String>,
}

impl PipeSignals {
    pub fn all(&self) -> impl Iterator<Item = &str> {
        [Some(self.valid.as_str()), Some(self.ready.as_str()), self.data.as_deref()]
            .into_iter()
            .flatten()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignalIndex {
    by_pipe: HashMap<PipeId, PipeSignals>,
    by_signal: HashMap<String, PipeId>,
}

impl SignalIndex {
    /// Resolve every pipe of `model` against the signal list of a source.
    pub fn build(model: &GraphModel, signals: &[String], settings: &SyncSettings) -> Self {
        let available: HashSet<&str> = signals.iter().map(String::as_str).collect();

        // every whole-segment suffix of a complete handshake stem -> shortest full stem
        let mut stems: HashMap<&str, &str> = HashMap::new();
        for name in signals {
            let Some(stem) = name.strip_suffix(settings.valid_suffix.as_str()) else {
                continue;
            };
            if !available.contains(format!("{}{}", stem, settings.ready_suffix).as_str()) {
                continue;
            }
            for key in dot_suffixes(stem) {
                let entry = stems.entry(key).or_insert(stem);
                if stem.len() < entry.len() {
                    *entry = stem;
                }
            }
        }

        let mut index = SignalIndex::default();
        for pipe in model.pipes() {
            let resolved = candidates(model, pipe, settings)
                .iter()
                .find_map(|c| stems.get(c.as_str()).copied());
            let Some(stem) = resolved else {
                tracing::trace!("No waveform signals for pipe '{}'", pipe.name);
                continue;
            };

            let data = format!("{}{}", stem, settings.data_suffix);
            let entry = PipeSignals {
                stem: stem.to_string(),
                valid: format!("{}{}", stem, settings.valid_suffix),
                ready: format!("{}{}", stem, settings.ready_suffix),
                data: available.contains(data.as_str()).then_some(data),
            };
            for signal in entry.all() {
                index.by_signal.entry(signal.to_string()).or_insert(pipe.id);
            }
            index.by_pipe.insert(pipe.id, entry);
        }

        tracing::debug!(
            "Signal index: {} of {} pipes resolved from {} signals",
            index.by_pipe.len(),
            model.pipe_count(),
            signals.len()
        );
        index
    }

    pub fn signals(&self, pipe: PipeId) -> Option<&PipeSignals> {
        self.by_pipe.get(&pipe)
    }

    /// Pipe traced by a waveform signal, for cross-referencing a selection
    /// in the waveform viewer back to the graph.
    pub fn pipe_for_signal(&self, signal: &str) -> Option<PipeId> {
        self.by_signal.get(signal).copied()
    }

    pub fn len(&self) -> usize {
        self.by_pipe.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pipe.is_empty()
    }
}

/// Signal stem of a port path.
pub fn port_stem(port_path: &str) -> String {
    port_path.replace('/', ".")
}

fn candidates(model: &GraphModel, pipe: &Pipe, settings: &SyncSettings) -> Vec<String> {
    let producer = port_stem(&model.port(pipe.producer).path);
    let consumer = port_stem(&model.port(pipe.consumer).path);
    let mut out = Vec::with_capacity(3);
    if pipe.is_broadcast() {
        out.push(format!(
            "{}{}{}",
            producer, settings.broadcast_infix, pipe.consumer_index
        ));
    }
    out.push(producer);
    out.push(consumer);
    out
}

/// `a.b.c` -> `a.b.c`, `b.c`, `c`
fn dot_suffixes(stem: &str) -> impl Iterator<Item = &str> {
    std::iter::once(stem).chain(stem.match_indices('.').map(move |(i, _)| &stem[i + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CircuitNode;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn stage(name: &str) -> CircuitNode {
        CircuitNode::new(name)
            .with_inputs(["din"])
            .with_outputs(["dout"])
    }

    #[test]
    fn test_dot_suffixes() {
        let all: Vec<_> = dot_suffixes("TOP.top.a").collect();
        assert_eq!(all, ["TOP.top.a", "top.a", "a"]);
    }

    #[test]
    fn test_resolves_through_extra_scopes() {
        let circuit = CircuitNode::new("top")
            .with_child(stage("a"))
            .with_child(stage("b"))
            .connect("a.dout", &["b.din"]);
        let model = GraphModel::build(&circuit);
        let signals = names(&[
            "TOP.tb.top.a.dout_valid",
            "TOP.tb.top.a.dout_ready",
            "TOP.tb.top.a.dout_data",
        ]);
        let index = SignalIndex::build(&model, &signals, &SyncSettings::default());

        let pipe = model.pipe_by_name("top/a.dout").unwrap();
        let resolved = index.signals(pipe).unwrap();
        assert_eq!(resolved.valid, "TOP.tb.top.a.dout_valid");
        assert_eq!(resolved.data.as_deref(), Some("TOP.tb.top.a.dout_data"));
        assert_eq!(index.pipe_for_signal("TOP.tb.top.a.dout_ready"), Some(pipe));
    }

    #[test]
    fn test_broadcast_prefers_own_stem_then_falls_back() {
        let circuit = CircuitNode::new("top")
            .with_child(stage("src"))
            .with_child(stage("c0"))
            .with_child(stage("c1"))
            .connect("src.dout", &["c0.din", "c1.din"]);
        let model = GraphModel::build(&circuit);
        let signals = names(&[
            "top.src.dout_bc_0_valid",
            "top.src.dout_bc_0_ready",
            "top.c1.din_valid",
            "top.c1.din_ready",
        ]);
        let index = SignalIndex::build(&model, &signals, &SyncSettings::default());

        let p0 = model.pipe_by_name("top/src.dout_bc_0").unwrap();
        let p1 = model.pipe_by_name("top/src.dout_bc_1").unwrap();
        assert_eq!(index.signals(p0).unwrap().stem, "top.src.dout_bc_0");
        assert_eq!(index.signals(p1).unwrap().stem, "top.c1.din");
        assert!(index.signals(p1).unwrap().data.is_none());
    }

    #[test]
    fn test_incomplete_handshake_is_ignored() {
        let circuit = CircuitNode::new("top")
            .with_child(stage("a"))
            .with_child(stage("b"))
            .connect("a.dout", &["b.din"]);
        let model = GraphModel::build(&circuit);
        let signals = names(&["top.a.dout_valid"]);
        let index = SignalIndex::build(&model, &signals, &SyncSettings::default());
        assert!(index.is_empty());
    }
}
