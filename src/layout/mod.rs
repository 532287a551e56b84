//! Layout engine: layered geometry for the visible part of the tree.
//!
//! Layout is strictly bottom-up. A node is laid out only after each of its
//! visible children, because the parent sizes its child vertices from the
//! children's freshly computed boxes. Expanded nodes go through the layered
//! pipeline:
//!
//! ```text
//! LayeredGraph::build        children + own ports as vertices, owned pipes as edges
//!   -> break_cycles          DFS back edges reversed for ranking
//!   -> assign_ranks          longest path; inputs first, outputs last
//!   -> insert_dummies        one vertex per spanned rank
//!   -> minimize_crossings    barycenter sweeps, best ordering kept
//!   -> assign_coordinates    columns, stacking, alignment passes
//!   -> route                 poly-bezier through plugs and dummies
//! ```
//!
//! Leaf, collapsed and minimized nodes get a fixed box instead
//! (see [`strategy`]). Layout never fails; pipes that cannot be mapped onto
//! the vertex set are logged and left unrouted.

pub mod geometry;
pub mod layered;
pub mod layers;
pub mod ordering;
pub mod placement;
pub mod routing;
pub mod strategy;

pub use geometry::{export_geometry, frame_origin, GeometrySnapshot, NodeSnapshot, PipeSnapshot, PortSnapshot};
pub use strategy::{NodeGeometry, Shape};

use crate::config::LayoutSettings;
use crate::graph::{GraphModel, NodeId};

/// Bottom-up layout driver.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    settings: LayoutSettings,
}

impl LayoutEngine {
    pub fn new(settings: LayoutSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// Lay out `id` and every visible descendant, children first.
    pub fn layout_subtree(&self, model: &mut GraphModel, id: NodeId) {
        for node in model.visible_post_order(id) {
            self.layout_node(model, node);
        }
    }

    /// Lay out a single node from its children's current sizes.
    pub fn layout_node(&self, model: &mut GraphModel, id: NodeId) {
        let kind = model.node(id).kind;
        kind.layout(model, id, &self.settings);
        model.node_mut(id).layout_generation += 1;
    }

    /// Re-lay out every strict ancestor of `id`, nearest first.
    ///
    /// Returns the ancestors in the order they were laid out.
    pub fn layout_ancestors(&self, model: &mut GraphModel, id: NodeId) -> Vec<NodeId> {
        let ancestors: Vec<NodeId> = model.ancestors(id).collect();
        for &a in &ancestors {
            self.layout_node(model, a);
        }
        ancestors
    }
}
