//! Selection and directional navigation.
//!
//! Navigation works on the layers of the selected node's parent, as computed
//! by the last layout pass. Left/right moves to the neighbouring layer and
//! picks the member closest in height; up/down moves within the layer. Both
//! wrap around at the ends.

use crate::graph::{GraphModel, NodeId};
use crate::types::GraphItem;

/// Navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Currently selected items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    items: Vec<GraphItem>,
}

impl Selection {
    /// Replace the selection with exactly `item`. Returns true if it changed.
    pub fn select(&mut self, item: GraphItem) -> bool {
        if self.items == [item] {
            return false;
        }
        self.items.clear();
        self.items.push(item);
        true
    }

    /// Add `item` to the selection without clearing it.
    pub fn extend(&mut self, item: GraphItem) -> bool {
        if self.items.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Returns true if anything was selected.
    pub fn clear(&mut self) -> bool {
        let had_items = !self.items.is_empty();
        self.items.clear();
        had_items
    }

    pub fn items(&self) -> &[GraphItem] {
        &self.items
    }

    pub fn contains(&self, item: GraphItem) -> bool {
        self.items.contains(&item)
    }

    /// The selected item, if exactly one is selected.
    pub fn single(&self) -> Option<GraphItem> {
        match self.items.as_slice() {
            [item] => Some(*item),
            _ => None,
        }
    }

    /// The selected node, if exactly one node and nothing else is selected.
    pub fn single_node(&self) -> Option<NodeId> {
        self.single().and_then(GraphItem::as_node)
    }
}

/// Sibling of `from` in `direction`, per the parent's layers.
pub fn neighbour(model: &GraphModel, from: NodeId, direction: Direction) -> Option<NodeId> {
    let parent = model.parent(from)?;
    let layers = &model.node(parent).layers;
    let (li, pos) = layers.iter().enumerate().find_map(|(li, layer)| {
        layer.iter().position(|&n| n == from).map(|pos| (li, pos))
    })?;

    let target = match direction {
        Direction::Up | Direction::Down => {
            let layer = &layers[li];
            let len = layer.len();
            let next = if direction == Direction::Down {
                (pos + 1) % len
            } else {
                (pos + len - 1) % len
            };
            layer[next]
        }
        Direction::Left | Direction::Right => {
            let len = layers.len();
            let next = if direction == Direction::Right {
                (li + 1) % len
            } else {
                (li + len - 1) % len
            };
            let y = model.node(from).rect().center().y;
            layers[next].iter().copied().min_by(|&a, &b| {
                let da = (model.node(a).rect().center().y - y).abs();
                let db = (model.node(b).rect().center().y - y).abs();
                da.total_cmp(&db)
            })?
        }
    };

    (target != from).then_some(target)
}
