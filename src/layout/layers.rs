//! Sibling layers used for spatial navigation.
//!
//! A layer is a maximal run of visible siblings whose horizontal extents
//! overlap, ordered top to bottom. Layers are ordered left to right and are
//! rebuilt on every layout pass of the parent.

use crate::graph::{GraphModel, NodeId};
use std::cmp::Ordering;

/// Group the visible children of `id` into layers.
pub fn compute_layers(model: &GraphModel, id: NodeId) -> Vec<Vec<NodeId>> {
    let mut children = model.visible_children(id).to_vec();
    children.sort_by(|&a, &b| {
        let (ra, rb) = (model.node(a).rect(), model.node(b).rect());
        ra.x.partial_cmp(&rb.x)
            .unwrap_or(Ordering::Equal)
            .then(ra.y.partial_cmp(&rb.y).unwrap_or(Ordering::Equal))
    });

    let mut layers: Vec<Vec<NodeId>> = Vec::new();
    let mut extent: Option<(f64, f64)> = None;
    for child in children {
        let rect = model.node(child).rect();
        match (extent, layers.last_mut()) {
            (Some((left, right)), Some(layer)) if rect.x < right && rect.right() > left => {
                layer.push(child);
                extent = Some((left.min(rect.x), right.max(rect.right())));
            }
            _ => {
                layers.push(vec![child]);
                extent = Some((rect.x, rect.right()));
            }
        }
    }

    for layer in &mut layers {
        layer.sort_by(|&a, &b| {
            model
                .node(a)
                .position
                .y
                .partial_cmp(&model.node(b).position.y)
                .unwrap_or(Ordering::Equal)
        });
    }
    layers
}
