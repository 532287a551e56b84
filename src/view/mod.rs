//! View controller: expansion state, selection and navigation.
//!
//! [`GraphView`] owns the graph model and the layout engine and is the only
//! place expansion state changes. Every change follows the same explicit
//! sequence: flip the flag, lay out the changed subtree, lay out each strict
//! ancestor nearest first, then publish events.
//!
//! ```text
//! expand(n)    collapsed -> expanded, layout_subtree(n), ancestors bottom-up, select n
//! collapse(n)  expanded -> collapsed, layout_node(n),    ancestors bottom-up
//! ```
//!
//! Both are no-ops (returning `false`) on leaves, minimized nodes, the root
//! (collapse) and nodes already in the requested state.

pub mod events;
pub mod selection;

pub use events::{event_channel, EventReceiver, EventSender, GraphEvent};
pub use selection::{Direction, Selection};

use crate::config::LayoutSettings;
use crate::graph::{GraphModel, GraphResult, NodeId};
use crate::layout::{export_geometry, GeometrySnapshot, LayoutEngine};
use crate::types::GraphItem;

/// Interactive view over one graph model.
pub struct GraphView {
    model: GraphModel,
    engine: LayoutEngine,
    selection: Selection,
    events: EventSender,
}

impl GraphView {
    /// Wrap `model`, lay it out, and return the view with its event receiver.
    pub fn new(model: GraphModel, settings: LayoutSettings) -> (Self, EventReceiver) {
        let (events, receiver) = event_channel();
        let mut view = Self {
            model,
            engine: LayoutEngine::new(settings),
            selection: Selection::default(),
            events,
        };
        let root = view.model.root();
        view.engine.layout_subtree(&mut view.model, root);
        (view, receiver)
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    /// Mutable model access for status updates. Expansion state must go
    /// through [`expand`](Self::expand) / [`collapse`](Self::collapse).
    pub fn model_mut(&mut self) -> &mut GraphModel {
        &mut self.model
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    // ---- expansion ----

    pub fn expand(&mut self, id: NodeId) -> bool {
        let node = self.model.node(id);
        if !node.is_expandable() || !node.collapsed {
            return false;
        }

        self.model.node_mut(id).collapsed = false;
        self.engine.layout_subtree(&mut self.model, id);
        let ancestors = self.engine.layout_ancestors(&mut self.model, id);
        tracing::info!("Expanded '{}'", self.model.node(id).path);

        self.events.emit(GraphEvent::NodeExpanded(id));
        self.publish_layout(id, &ancestors);
        self.select(GraphItem::Node(id));
        true
    }

    pub fn collapse(&mut self, id: NodeId) -> bool {
        let node = self.model.node(id);
        if !node.is_expandable() || node.collapsed || node.is_root() {
            return false;
        }

        self.model.node_mut(id).collapsed = true;
        self.engine.layout_node(&mut self.model, id);
        let ancestors = self.engine.layout_ancestors(&mut self.model, id);
        tracing::info!("Collapsed '{}'", self.model.node(id).path);

        self.events.emit(GraphEvent::NodeCollapsed(id));
        self.publish_layout(id, &ancestors);

        let hidden = self
            .selection
            .items()
            .iter()
            .any(|&item| !self.is_item_visible(item));
        if hidden {
            self.select(GraphItem::Node(id));
        }
        true
    }

    pub fn toggle(&mut self, id: NodeId) -> bool {
        if self.model.node(id).is_expanded() {
            self.collapse(id)
        } else {
            self.expand(id)
        }
    }

    /// Expand by full path, e.g. `"top/a"`.
    pub fn expand_path(&mut self, path: &str) -> GraphResult<bool> {
        let id = self.model.find(path)?;
        Ok(self.expand(id))
    }

    /// Expand every collapsed ancestor of `id` so that it becomes visible.
    ///
    /// Returns false if `id` is already visible or sits below a node that
    /// can never be expanded.
    pub fn reveal(&mut self, id: NodeId) -> bool {
        if self.model.is_visible(id) {
            return false;
        }
        let ancestors: Vec<NodeId> = self.model.ancestors(id).collect();
        if ancestors.iter().any(|&a| !self.model.node(a).is_expandable()) {
            return false;
        }

        let opened: Vec<NodeId> = ancestors
            .iter()
            .copied()
            .filter(|&a| self.model.node(a).collapsed)
            .collect();
        for &a in &opened {
            self.model.node_mut(a).collapsed = false;
        }

        // Highest newly opened ancestor; everything that became visible is below it.
        let Some(&top) = opened.last() else {
            return false;
        };
        self.engine.layout_subtree(&mut self.model, top);
        let above = self.engine.layout_ancestors(&mut self.model, top);
        tracing::info!(
            "Revealed '{}' ({} ancestors expanded)",
            self.model.node(id).path,
            opened.len()
        );

        for &a in opened.iter().rev() {
            self.events.emit(GraphEvent::NodeExpanded(a));
        }
        // opened nodes below `top` were laid out inside its subtree, deepest first
        for &a in &opened[..opened.len() - 1] {
            self.events.emit(GraphEvent::LayoutChanged(a));
        }
        self.publish_layout(top, &above);
        self.select(GraphItem::Node(id));
        true
    }

    /// Expand every expandable node and lay out the whole tree.
    pub fn expand_all(&mut self) {
        let expandable: Vec<NodeId> = self
            .model
            .nodes()
            .filter(|n| n.is_expandable() && n.collapsed)
            .map(|n| n.id)
            .collect();
        for &id in &expandable {
            self.model.node_mut(id).collapsed = false;
            self.events.emit(GraphEvent::NodeExpanded(id));
        }
        self.relayout_all();
    }

    /// Lay out the whole visible tree from scratch.
    pub fn relayout_all(&mut self) {
        let root = self.model.root();
        let nodes = self.model.visible_post_order(root);
        for &id in &nodes {
            self.engine.layout_node(&mut self.model, id);
        }
        for id in nodes.into_iter().filter(|&n| self.model.node(n).is_expanded()) {
            self.events.emit(GraphEvent::LayoutChanged(id));
        }
    }

    fn publish_layout(&self, id: NodeId, ancestors: &[NodeId]) {
        self.events.emit(GraphEvent::LayoutChanged(id));
        for &a in ancestors {
            self.events.emit(GraphEvent::LayoutChanged(a));
        }
    }

    // ---- selection ----

    pub fn select(&mut self, item: GraphItem) -> bool {
        let changed = self.selection.select(item);
        if changed {
            self.events.emit(GraphEvent::SelectionChanged(Some(item)));
        }
        changed
    }

    pub fn clear_selection(&mut self) -> bool {
        let changed = self.selection.clear();
        if changed {
            self.events.emit(GraphEvent::SelectionChanged(None));
        }
        changed
    }

    /// Move the single selected node one step in `direction`.
    ///
    /// No-op unless exactly one node is selected.
    pub fn navigate(&mut self, direction: Direction) -> Option<NodeId> {
        let from = self.selection.single_node()?;
        let to = selection::neighbour(&self.model, from, direction)?;
        self.select(GraphItem::Node(to));
        Some(to)
    }

    fn is_item_visible(&self, item: GraphItem) -> bool {
        match item {
            GraphItem::Node(id) => self.model.is_visible(id),
            GraphItem::Pipe(id) => self.model.is_pipe_visible(id),
        }
    }

    // ---- status ----

    /// Publish `StatusChanged` for items updated by the synchronizer.
    pub fn publish_status(&self, changed: &[GraphItem]) {
        for &item in changed {
            self.events.emit(GraphEvent::StatusChanged(item));
        }
    }

    pub fn export_geometry(&self) -> GeometrySnapshot {
        export_geometry(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CircuitNode;

    fn stage(name: &str) -> CircuitNode {
        CircuitNode::new(name)
            .with_inputs(["din"])
            .with_outputs(["dout"])
    }

    /// top
    /// +-- outer (x -> inner -> y)
    /// |   +-- inner (p -> q)
    /// +-- b
    fn nested() -> CircuitNode {
        let inner = CircuitNode::new("inner")
            .with_inputs(["din"])
            .with_outputs(["dout"])
            .with_child(stage("p"))
            .with_child(stage("q"))
            .connect("din", &["p.din"])
            .connect("p.dout", &["q.din"])
            .connect("q.dout", &["dout"]);
        let outer = CircuitNode::new("outer")
            .with_inputs(["din"])
            .with_outputs(["dout"])
            .with_child(stage("x"))
            .with_child(inner)
            .with_child(stage("y"))
            .connect("din", &["x.din"])
            .connect("x.dout", &["inner.din"])
            .connect("inner.dout", &["y.din"])
            .connect("y.dout", &["dout"]);
        CircuitNode::new("top")
            .with_child(outer)
            .with_child(stage("b"))
            .connect("outer.dout", &["b.din"])
    }

    fn view() -> (GraphView, EventReceiver) {
        GraphView::new(GraphModel::build(&nested()), LayoutSettings::default())
    }

    fn id(view: &GraphView, path: &str) -> NodeId {
        view.model().find(path).unwrap()
    }

    #[test]
    fn test_expand_is_idempotent() {
        let (mut view, rx) = view();
        let outer = id(&view, "top/outer");
        assert!(view.expand(outer));
        let size = view.model().node(outer).size;
        let root_gen = view.model().node(view.model().root()).layout_generation;
        rx.drain();

        assert!(!view.expand(outer));
        assert_eq!(view.model().node(outer).size, size);
        assert_eq!(
            view.model().node(view.model().root()).layout_generation,
            root_gen
        );
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn test_expand_relayouts_ancestors_bottom_up() {
        let (mut view, rx) = view();
        let outer = id(&view, "top/outer");
        let inner = id(&view, "top/outer/inner");
        view.expand(outer);
        rx.drain();

        assert!(view.expand(inner));
        let events = rx.drain();
        assert_eq!(events[0], GraphEvent::NodeExpanded(inner));
        assert_eq!(
            &events[1..4],
            [
                GraphEvent::LayoutChanged(inner),
                GraphEvent::LayoutChanged(outer),
                GraphEvent::LayoutChanged(view.model().root()),
            ]
        );
        assert_eq!(
            events[4],
            GraphEvent::SelectionChanged(Some(GraphItem::Node(inner)))
        );

        // parent saw the child's fresh size
        let inner_rect = view.model().node(inner).rect();
        let outer_size = view.model().node(outer).size;
        assert!(inner_rect.right() < outer_size.width);
        assert!(inner_rect.bottom() < outer_size.height);
    }

    #[test]
    fn test_collapse_expand_round_trip() {
        let (mut view, _rx) = view();
        let outer = id(&view, "top/outer");
        let inner = id(&view, "top/outer/inner");
        view.expand(outer);
        view.expand(inner);
        let before: Vec<_> = view
            .model()
            .nodes()
            .map(|n| (n.collapsed, view.model().is_visible(n.id), n.size))
            .collect();

        assert!(view.collapse(outer));
        assert!(!view.model().node(inner).collapsed);
        assert!(!view.model().is_visible(inner));

        assert!(view.expand(outer));
        let after: Vec<_> = view
            .model()
            .nodes()
            .map(|n| (n.collapsed, view.model().is_visible(n.id), n.size))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_collapsed_size_is_minimum_plus_padding() {
        let (mut view, _rx) = view();
        let outer = id(&view, "top/outer");
        let collapsed_size = view.model().node(outer).size;
        view.expand(outer);
        assert_ne!(view.model().node(outer).size, collapsed_size);

        view.collapse(outer);
        let node = view.model().node(outer);
        let pad = view.engine().settings().padding;
        assert_eq!(node.size.width, node.min_size.width + 2.0 * pad);
        assert_eq!(node.size.height, node.min_size.height + 2.0 * pad);
        assert!(node.layers.is_empty());
    }

    #[test]
    fn test_rejected_transitions() {
        let (mut view, rx) = view();
        let b = id(&view, "top/b");
        let root = view.model().root();
        assert!(!view.expand(b));
        assert!(!view.collapse(b));
        assert!(!view.collapse(root));
        assert!(!view.expand(root));
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn test_collapse_moves_hidden_selection() {
        let (mut view, _rx) = view();
        let outer = id(&view, "top/outer");
        let x = id(&view, "top/outer/x");
        view.expand(outer);
        view.select(GraphItem::Node(x));
        view.collapse(outer);
        assert_eq!(view.selection().single_node(), Some(outer));
    }

    #[test]
    fn test_reveal_expands_chain() {
        let (mut view, rx) = view();
        let p = id(&view, "top/outer/inner/p");
        assert!(view.reveal(p));
        assert!(view.model().is_visible(p));
        assert_eq!(view.selection().single_node(), Some(p));

        let events = rx.drain();
        let outer = id(&view, "top/outer");
        let inner = id(&view, "top/outer/inner");
        let root = view.model().root();
        assert_eq!(
            events,
            [
                GraphEvent::NodeExpanded(outer),
                GraphEvent::NodeExpanded(inner),
                GraphEvent::LayoutChanged(inner),
                GraphEvent::LayoutChanged(outer),
                GraphEvent::LayoutChanged(root),
                GraphEvent::SelectionChanged(Some(GraphItem::Node(p))),
            ]
        );
        assert!(!view.reveal(p));
    }

    #[test]
    fn test_navigate_left_right_wraps() {
        let (mut view, _rx) = view();
        let outer = id(&view, "top/outer");
        let b = id(&view, "top/b");

        assert_eq!(view.navigate(Direction::Right), None);
        view.select(GraphItem::Node(outer));
        assert_eq!(view.navigate(Direction::Right), Some(b));
        assert_eq!(view.navigate(Direction::Right), Some(outer));
        assert_eq!(view.navigate(Direction::Left), Some(b));
        assert_eq!(view.navigate(Direction::Up), None);
    }
}
