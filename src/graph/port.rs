//! Ports: named, directional connection points owned by exactly one node.
//!
//! Ports are created together with their owning node and never reassigned.
//! The plug position is derived by the layout engine and expressed in the
//! owning node's local frame.

use crate::graph::id::{NodeId, PipeId, PortId};
use crate::types::Point;
use serde::{Deserialize, Serialize};

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub fn opposite(self) -> Self {
        match self {
            PortDirection::Input => PortDirection::Output,
            PortDirection::Output => PortDirection::Input,
        }
    }
}

/// A port of a node.
#[derive(Debug, Clone)]
pub struct Port {
    pub id: PortId,
    /// Owning node.
    pub node: NodeId,
    pub direction: PortDirection,
    /// Position within the owner's input or output list.
    pub index: usize,
    pub name: String,
    /// Full name, e.g. `"top/a.dout"`.
    pub path: String,
    /// Pipes attached to this port (either side).
    pub pipes: Vec<PipeId>,
    /// Plug coordinate in the owner's local frame.
    pub plug: Point,
}

impl Port {
    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }
}
