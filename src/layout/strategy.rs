//! Per-kind layout and geometry strategies.
//!
//! The kind of a node is fixed at construction; dispatch is a plain `match`
//! over [`NodeKind`]:
//!
//! | Kind | Layout | Shape |
//! |------|--------|-------|
//! | `Leaf` | labelled box, ports evenly spaced | `Box` |
//! | `Hierarchical` (collapsed) | same as `Leaf` | `Box` |
//! | `Hierarchical` (expanded) | layered layout of visible children | `Frame` |
//! | `Minimized` | fixed small square, ports at mid-height | `Marker` |

use crate::config::LayoutSettings;
use crate::graph::{GraphModel, NodeId, NodeKind, PortId};
use crate::layout::layered::{LayeredGraph, VertexKind};
use crate::layout::{layers, ordering, placement, routing};
use crate::types::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// How a renderer should draw a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Opaque labelled box.
    Box,
    /// Open frame around visible children, label on top.
    Frame,
    /// Small unlabelled square.
    Marker,
}

/// Render-ready geometry of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGeometry {
    pub shape: Shape,
    /// Box in the parent's frame.
    pub bounds: Rect,
    pub label: Option<String>,
    /// Input plugs in the node's own frame, in port order.
    pub inputs: Vec<Point>,
    /// Output plugs in the node's own frame, in port order.
    pub outputs: Vec<Point>,
}

impl NodeKind {
    /// Compute size, port plugs and (when expanded) children and pipe
    /// geometry for `id`. Visible children must already be laid out.
    pub fn layout(self, model: &mut GraphModel, id: NodeId, settings: &LayoutSettings) {
        match self {
            NodeKind::Minimized => layout_minimized(model, id, settings),
            NodeKind::Hierarchical if model.node(id).is_expanded() => {
                layout_expanded(model, id, settings)
            }
            NodeKind::Leaf | NodeKind::Hierarchical => layout_box(model, id, settings),
        }
    }

    /// Geometry a renderer needs to draw `id`.
    pub fn render_geometry(self, model: &GraphModel, id: NodeId) -> NodeGeometry {
        let node = model.node(id);
        let (shape, label) = match self {
            NodeKind::Minimized => (Shape::Marker, None),
            NodeKind::Hierarchical if node.is_expanded() => (Shape::Frame, Some(node.name.clone())),
            NodeKind::Leaf | NodeKind::Hierarchical => (Shape::Box, Some(node.name.clone())),
        };
        let plugs = |ports: &[PortId]| ports.iter().map(|&p| model.port(p).plug).collect();
        NodeGeometry {
            shape,
            bounds: node.rect(),
            label,
            inputs: plugs(&node.inputs),
            outputs: plugs(&node.outputs),
        }
    }
}

/// Minimum size of the labelled box, without padding.
pub fn min_box_size(model: &GraphModel, id: NodeId, settings: &LayoutSettings) -> Size {
    let node = model.node(id);
    let label_width = node.name.chars().count() as f64 * settings.char_width;
    let port_rows = node.inputs.len().max(node.outputs.len()) as f64;
    Size::new(
        settings.min_node_width.max(label_width),
        settings.min_node_height.max(port_rows * settings.port_spacing),
    )
}

fn layout_box(model: &mut GraphModel, id: NodeId, settings: &LayoutSettings) {
    let min = min_box_size(model, id, settings);
    let size = Size::new(
        min.width + 2.0 * settings.padding,
        min.height + 2.0 * settings.padding,
    );
    spread_ports(model, id, size);

    let node = model.node_mut(id);
    node.min_size = min;
    node.size = size;
    node.layers.clear();
}

fn layout_minimized(model: &mut GraphModel, id: NodeId, settings: &LayoutSettings) {
    let side = settings.minimized_size;
    let size = Size::new(side, side);
    let (inputs, outputs) = {
        let node = model.node(id);
        (node.inputs.clone(), node.outputs.clone())
    };
    for p in inputs {
        model.port_mut(p).plug = Point::new(0.0, side / 2.0);
    }
    for p in outputs {
        model.port_mut(p).plug = Point::new(side, side / 2.0);
    }

    let node = model.node_mut(id);
    node.min_size = size;
    node.size = size;
    node.layers.clear();
}

/// Spread the ports evenly along the left and right edges.
fn spread_ports(model: &mut GraphModel, id: NodeId, size: Size) {
    let (inputs, outputs) = {
        let node = model.node(id);
        (node.inputs.clone(), node.outputs.clone())
    };
    for (ports, x) in [(inputs, 0.0), (outputs, size.width)] {
        let step = size.height / (ports.len() + 1) as f64;
        for (i, p) in ports.into_iter().enumerate() {
            model.port_mut(p).plug = Point::new(x, step * (i + 1) as f64);
        }
    }
}

fn layout_expanded(model: &mut GraphModel, id: NodeId, settings: &LayoutSettings) {
    let mut graph = LayeredGraph::build(model, id);
    graph.break_cycles();
    graph.assign_ranks();
    graph.insert_dummies();
    let order = ordering::minimize_crossings(&graph, settings.crossing_passes);
    placement::assign_coordinates(&mut graph, &order, settings);

    let (min, max) = graph.extent();
    let pad = settings.padding;
    graph.translate(Point::new(pad - min.x, pad - min.y));

    let floor = min_box_size(model, id, settings);
    let size = Size::new(
        (max.x - min.x).max(floor.width) + 2.0 * pad,
        (max.y - min.y).max(floor.height) + 2.0 * pad,
    );

    for v in &graph.vertices {
        match v.kind {
            VertexKind::Child(child) => model.node_mut(child).position = v.pos,
            VertexKind::Input(port) => model.port_mut(port).plug = Point::new(0.0, v.pos.y),
            VertexKind::Output(port) => {
                model.port_mut(port).plug = Point::new(size.width, v.pos.y)
            }
            VertexKind::Dummy => {}
        }
    }

    let routed: Vec<_> = model.pipes_owned_by(id).to_vec();
    for pipe_id in routed {
        let edge = graph.edges.iter().find(|e| e.pipe == pipe_id);
        let path = match edge {
            Some(edge) => {
                let (producer, consumer) = {
                    let pipe = model.pipe(pipe_id);
                    (pipe.producer, pipe.consumer)
                };
                let start = plug_in_frame(model, id, producer);
                let end = plug_in_frame(model, id, consumer);
                if edge.is_self_loop() {
                    let bounds = match graph.vertices[edge.source].kind {
                        VertexKind::Child(child) => model.node(child).rect(),
                        _ => Rect::new(start, Size::default()),
                    };
                    routing::route_self_loop(start, end, &bounds, settings)
                } else {
                    let mut anchors = Vec::with_capacity(edge.chain.len());
                    anchors.push(start);
                    anchors.extend(edge.dummies().iter().map(|&d| graph.vertices[d].center()));
                    anchors.push(end);
                    routing::route(&anchors, settings)
                }
            }
            None => Vec::new(),
        };
        model.pipe_mut(pipe_id).path = path;
    }

    let node_layers = layers::compute_layers(model, id);
    let node = model.node_mut(id);
    node.min_size = floor;
    node.size = size;
    node.layers = node_layers;

    tracing::debug!(
        "Laid out '{}': {} ranks, {} edges, size {:.0}x{:.0}",
        node.path,
        graph.rank_count,
        graph.edges.len(),
        size.width,
        size.height
    );
}

/// Plug position of `port` in the frame of `frame`, which is either the
/// port's owner or the owner's parent.
pub fn plug_in_frame(model: &GraphModel, frame: NodeId, port: PortId) -> Point {
    let port = model.port(port);
    if port.node == frame {
        port.plug
    } else {
        model.node(port.node).position + port.plug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CircuitNode, KindHint};

    fn settings() -> LayoutSettings {
        LayoutSettings::default()
    }

    #[test]
    fn test_leaf_box_size() {
        let circuit = CircuitNode::new("top").with_child(
            CircuitNode::new("a")
                .with_inputs(["i0", "i1", "i2", "i3"])
                .with_outputs(["o"]),
        );
        let mut model = GraphModel::build(&circuit);
        let a = model.find("top/a").unwrap();
        let s = settings();
        NodeKind::Leaf.layout(&mut model, a, &s);

        let node = model.node(a);
        assert_eq!(node.min_size.width, s.min_node_width);
        assert_eq!(node.min_size.height, 4.0 * s.port_spacing);
        assert_eq!(node.size.width, node.min_size.width + 2.0 * s.padding);

        // evenly spaced inputs on the left edge
        let ys: Vec<f64> = node.inputs.iter().map(|&p| model.port(p).plug.y).collect();
        let step = node.size.height / 5.0;
        for (i, y) in ys.iter().enumerate() {
            assert!((y - step * (i + 1) as f64).abs() < 1e-9);
        }
        let out = model.port(node.outputs[0]).plug;
        assert_eq!(out, Point::new(node.size.width, node.size.height / 2.0));
    }

    #[test]
    fn test_long_name_widens_box() {
        let circuit = CircuitNode::new("top").with_child(CircuitNode::new("a_very_long_stage_name"));
        let mut model = GraphModel::build(&circuit);
        let a = model.find("top/a_very_long_stage_name").unwrap();
        let s = settings();
        NodeKind::Leaf.layout(&mut model, a, &s);
        assert_eq!(model.node(a).min_size.width, 22.0 * s.char_width);
    }

    #[test]
    fn test_minimized_box() {
        let circuit = CircuitNode::new("top").with_child(
            CircuitNode::new("bc")
                .with_kind(KindHint::Minimized)
                .with_inputs(["din"])
                .with_outputs(["d0", "d1"]),
        );
        let mut model = GraphModel::build(&circuit);
        let bc = model.find("top/bc").unwrap();
        let s = settings();
        NodeKind::Minimized.layout(&mut model, bc, &s);

        let node = model.node(bc);
        assert_eq!(node.size, Size::new(s.minimized_size, s.minimized_size));
        let geometry = NodeKind::Minimized.render_geometry(&model, bc);
        assert_eq!(geometry.shape, Shape::Marker);
        assert!(geometry.label.is_none());
        assert_eq!(geometry.outputs[0], geometry.outputs[1]);
    }

    #[test]
    fn test_collapsed_hierarchical_renders_as_box() {
        let circuit = CircuitNode::new("top")
            .with_child(CircuitNode::new("mid").with_child(CircuitNode::new("leaf")));
        let mut model = GraphModel::build(&circuit);
        let mid = model.find("top/mid").unwrap();
        NodeKind::Hierarchical.layout(&mut model, mid, &settings());
        let geometry = NodeKind::Hierarchical.render_geometry(&model, mid);
        assert_eq!(geometry.shape, Shape::Box);
        assert_eq!(geometry.label.as_deref(), Some("mid"));
    }
}
