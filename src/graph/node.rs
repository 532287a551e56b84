//! Nodes of the hierarchical graph.
//!
//! A node is either a leaf gear or a composite block with children. The
//! [`NodeKind`] is chosen once at construction and selects the layout and
//! geometry strategy for the node; it never changes afterwards.

use crate::graph::id::{NodeId, PipeId, PortId};
use crate::graph::port::PortDirection;
use crate::types::{Point, Rect, Size, Status};
use serde::{Deserialize, Serialize};

/// Kind hint supplied by the circuit description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindHint {
    /// Decide from structure: hierarchical if it has children, leaf otherwise.
    #[default]
    Auto,
    /// Force a leaf box even if the description lists children.
    Leaf,
    /// Pass-through kinds drawn as a small fixed box.
    Minimized,
}

/// Per-node layout/geometry strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Leaf,
    Hierarchical,
    Minimized,
}

impl NodeKind {
    /// Select the strategy for a node from its hint and child count.
    pub fn select(hint: KindHint, child_count: usize) -> Self {
        match hint {
            KindHint::Minimized => NodeKind::Minimized,
            KindHint::Leaf => NodeKind::Leaf,
            KindHint::Auto if child_count > 0 => NodeKind::Hierarchical,
            KindHint::Auto => NodeKind::Leaf,
        }
    }
}

/// One hierarchical unit of the circuit.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    /// Short name, unique among siblings.
    pub name: String,
    /// Slash-delimited full path, e.g. `"top/a"`.
    pub path: String,
    /// Parent node (NodeId::INVALID for the root).
    pub parent: NodeId,
    pub depth: u16,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    pub inputs: Vec<PortId>,
    pub outputs: Vec<PortId>,
    /// Pipes whose lowest common ancestor is this node.
    pub pipes: Vec<PipeId>,
    pub collapsed: bool,
    pub status: Status,

    // ---- derived by the layout engine ----
    /// Top-left corner in the parent's local frame.
    pub position: Point,
    pub size: Size,
    /// Cached minimum size of the collapsed box, without padding.
    pub min_size: Size,
    /// Sibling layers of the visible children, left to right, each ordered top to bottom.
    pub layers: Vec<Vec<NodeId>>,
    /// Number of completed layout passes for this node.
    pub layout_generation: u64,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: String, path: String, parent: NodeId, depth: u16) -> Self {
        Self {
            id,
            name,
            path,
            parent,
            depth,
            kind: NodeKind::Leaf,
            children: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            pipes: Vec::new(),
            collapsed: parent.is_valid(),
            status: Status::Empty,
            position: Point::ORIGIN,
            size: Size::default(),
            min_size: Size::default(),
            layers: Vec::new(),
            layout_generation: 0,
        }
    }

    pub fn is_root(&self) -> bool {
        !self.parent.is_valid()
    }

    /// A node is hierarchical iff it has at least one child.
    pub fn is_hierarchical(&self) -> bool {
        !self.children.is_empty()
    }

    /// True if the node can toggle between collapsed and expanded.
    pub fn is_expandable(&self) -> bool {
        self.is_hierarchical() && self.kind == NodeKind::Hierarchical
    }

    /// True if the children of this node are laid out and shown.
    pub fn is_expanded(&self) -> bool {
        self.is_expandable() && !self.collapsed
    }

    pub fn ports(&self, direction: PortDirection) -> &[PortId] {
        match direction {
            PortDirection::Input => &self.inputs,
            PortDirection::Output => &self.outputs,
        }
    }

    /// Box in the parent's local frame.
    pub fn rect(&self) -> Rect {
        Rect::new(self.position, self.size)
    }
}
