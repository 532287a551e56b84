//! Pipes: directed connections from one producer port to one consumer port.
//!
//! A producer interface with N consumers is modeled as N pipes sharing the
//! producer port, each with a distinct consumer index.

use crate::graph::id::{NodeId, PipeId, PortId};
use crate::types::{Point, Status};

#[derive(Debug, Clone)]
pub struct Pipe {
    pub id: PipeId,
    /// Deterministic name: producer port path, plus a broadcast suffix for fan-out.
    pub name: String,
    pub producer: PortId,
    pub consumer: PortId,
    /// Index of this consumer within the producer interface's consumer list.
    pub consumer_index: usize,
    /// Total number of consumers of the producer interface.
    pub fanout: usize,
    /// Lowest node containing both endpoints.
    pub owner: NodeId,
    /// Routed poly-bezier in the owner's local frame.
    pub path: Vec<Point>,
    pub status: Status,
    /// Time index the status was last computed for.
    pub status_time: Option<u64>,
}

impl Pipe {
    pub fn is_broadcast(&self) -> bool {
        self.fanout > 1
    }
}
