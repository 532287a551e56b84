//! Serializable snapshot of the visible geometry.
//!
//! Node and pipe coordinates in the model are local to the enclosing node.
//! The snapshot resolves them to absolute coordinates so a renderer (or the
//! command-line tool) can draw without walking the tree.

use crate::graph::{GraphModel, NodeId, NodeKind, PortDirection};
use crate::layout::strategy::Shape;
use crate::types::{Point, Rect, Status};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortSnapshot {
    pub name: String,
    pub direction: PortDirection,
    pub plug: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub path: String,
    pub kind: NodeKind,
    pub shape: Shape,
    pub label: Option<String>,
    pub collapsed: bool,
    pub status: Status,
    pub bounds: Rect,
    pub ports: Vec<PortSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeSnapshot {
    pub name: String,
    pub status: Status,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometrySnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub pipes: Vec<PipeSnapshot>,
}

impl GeometrySnapshot {
    pub fn node(&self, path: &str) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|n| n.path == path)
    }

    pub fn pipe(&self, name: &str) -> Option<&PipeSnapshot> {
        self.pipes.iter().find(|p| p.name == name)
    }
}

/// Absolute position of the top-left corner of `id`.
pub fn frame_origin(model: &GraphModel, id: NodeId) -> Point {
    std::iter::once(id)
        .chain(model.ancestors(id))
        .fold(Point::ORIGIN, |acc, n| acc + model.node(n).position)
}

/// Snapshot every visible node (pre-order) and every visible pipe.
pub fn export_geometry(model: &GraphModel) -> GeometrySnapshot {
    let mut snapshot = GeometrySnapshot::default();
    let mut stack = vec![model.root()];

    while let Some(id) = stack.pop() {
        let node = model.node(id);
        let origin = frame_origin(model, id);
        let geometry = node.kind.render_geometry(model, id);

        let ports = node
            .inputs
            .iter()
            .chain(node.outputs.iter())
            .map(|&p| {
                let port = model.port(p);
                PortSnapshot {
                    name: port.name.clone(),
                    direction: port.direction,
                    plug: origin + port.plug,
                }
            })
            .collect();

        snapshot.nodes.push(NodeSnapshot {
            path: node.path.clone(),
            kind: node.kind,
            shape: geometry.shape,
            label: geometry.label,
            collapsed: node.collapsed,
            status: node.status,
            bounds: Rect {
                x: origin.x,
                y: origin.y,
                ..geometry.bounds
            },
            ports,
        });

        stack.extend(model.visible_children(id).iter().rev());
    }

    for pipe_id in model.visible_pipes() {
        let pipe = model.pipe(pipe_id);
        let origin = frame_origin(model, pipe.owner);
        snapshot.pipes.push(PipeSnapshot {
            name: pipe.name.clone(),
            status: pipe.status,
            points: pipe.path.iter().map(|&p| origin + p).collect(),
        });
    }

    snapshot
}
