//! The graph model: an arena of nodes, ports and pipes.
//!
//! Storage follows a flat-vector layout: `NodeId`, `PortId` and `PipeId`
//! are direct indices. Ownership is strictly tree-shaped (a node lists its
//! children, ports and owned pipes) and every upward link is a plain index.
//!
//! Construction is the only place nodes and pipes are created. It walks the
//! circuit top-down, parent before children:
//!
//! ```text
//! top                    (hierarchical, expanded)
//! +-- top/a              (leaf, ports din/dout)
//! +-- top/b              (leaf, ports din/dout)
//!     pipe top/a.dout -> top/b.din   (owner: top)
//! ```

use crate::graph::circuit::{CircuitHierarchy, Endpoint};
use crate::graph::error::{GraphError, GraphResult};
use crate::graph::id::{NodeId, PipeId, PortId};
use crate::graph::node::{Node, NodeKind};
use crate::graph::pipe::Pipe;
use crate::graph::port::{Port, PortDirection};
use crate::types::{Point, Status};
use std::collections::HashMap;

/// Flat-storage hierarchical graph.
#[derive(Debug, Clone)]
pub struct GraphModel {
    nodes: Vec<Node>,
    ports: Vec<Port>,
    pipes: Vec<Pipe>,
    root: NodeId,
    path_index: HashMap<String, NodeId>,
    pipe_index: HashMap<String, PipeId>,
}

impl GraphModel {
    /// Build the model from a circuit hierarchy.
    pub fn build(circuit: &dyn CircuitHierarchy) -> Self {
        let mut model = Self {
            nodes: Vec::new(),
            ports: Vec::new(),
            pipes: Vec::new(),
            root: NodeId::INVALID,
            path_index: HashMap::new(),
            pipe_index: HashMap::new(),
        };
        model.root = model.instantiate(circuit, NodeId::INVALID);

        tracing::info!(
            "Built graph model '{}': {} nodes, {} ports, {} pipes",
            circuit.name(),
            model.nodes.len(),
            model.ports.len(),
            model.pipes.len()
        );
        model
    }

    fn instantiate(&mut self, circuit: &dyn CircuitHierarchy, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let (path, depth) = match self.get_node(parent) {
            Some(p) => (format!("{}/{}", p.path, circuit.name()), p.depth + 1),
            None => (circuit.name().to_string(), 0),
        };

        let children = circuit.children();
        let mut node = Node::new(id, circuit.name().to_string(), path.clone(), parent, depth);
        node.kind = NodeKind::select(circuit.kind_hint(), children.len());
        self.nodes.push(node);
        self.path_index.insert(path, id);

        for name in circuit.input_names() {
            self.add_port(id, PortDirection::Input, name);
        }
        for name in circuit.output_names() {
            self.add_port(id, PortDirection::Output, name);
        }

        for child in children {
            let child_id = self.instantiate(child, id);
            self.nodes[id.index()].children.push(child_id);
        }

        // every declared consumer of a producer counts towards its fan-out,
        // even across separate interfaces
        let mut links = Vec::new();
        let mut fanout: HashMap<PortId, usize> = HashMap::new();
        for intf in circuit.interfaces() {
            let Some(producer) = self.resolve_endpoint(id, &intf.producer, PortDirection::Output)
            else {
                tracing::debug!(
                    "Skipping interface in '{}': producer '{}' is out of scope",
                    self.nodes[id.index()].path,
                    intf.producer
                );
                continue;
            };
            let declared = fanout.entry(producer).or_default();
            for ep in intf.consumers {
                links.push((producer, *declared, ep, intf.producer.clone()));
                *declared += 1;
            }
        }

        for (producer, consumer_index, ep, from) in links {
            match self.resolve_endpoint(id, &ep, PortDirection::Input) {
                Some(consumer) => {
                    self.add_pipe(id, producer, consumer, consumer_index, fanout[&producer]);
                }
                None => tracing::debug!(
                    "Skipping consumer '{}' of '{}' in '{}': out of scope",
                    ep,
                    from,
                    self.nodes[id.index()].path
                ),
            }
        }

        id
    }

    fn add_port(&mut self, node: NodeId, direction: PortDirection, name: &str) -> PortId {
        let id = PortId(self.ports.len() as u32);
        let owner = &mut self.nodes[node.index()];
        let list = match direction {
            PortDirection::Input => &mut owner.inputs,
            PortDirection::Output => &mut owner.outputs,
        };
        let index = list.len();
        list.push(id);
        let path = format!("{}.{}", owner.path, name);
        self.ports.push(Port {
            id,
            node,
            direction,
            index,
            name: name.to_string(),
            path,
            pipes: Vec::new(),
            plug: Point::ORIGIN,
        });
        id
    }

    /// Resolve an endpoint declared inside `scope`.
    ///
    /// `flow` is the direction data travels at this endpoint: producers emit
    /// (`Output`), consumers receive (`Input`). A port of `scope` itself plays
    /// the opposite role to a child port (an own input acts as a producer).
    fn resolve_endpoint(&self, scope: NodeId, ep: &Endpoint, flow: PortDirection) -> Option<PortId> {
        let (owner, direction) = match &ep.node {
            None => (scope, flow.opposite()),
            Some(child) => {
                let child_id = self.nodes[scope.index()]
                    .children
                    .iter()
                    .copied()
                    .find(|&c| self.nodes[c.index()].name == *child)?;
                (child_id, flow)
            }
        };
        self.nodes[owner.index()]
            .ports(direction)
            .iter()
            .copied()
            .find(|&p| self.ports[p.index()].name == ep.port)
    }

    fn add_pipe(
        &mut self,
        owner: NodeId,
        producer: PortId,
        consumer: PortId,
        consumer_index: usize,
        fanout: usize,
    ) -> PipeId {
        let id = PipeId(self.pipes.len() as u32);
        let producer_path = &self.ports[producer.index()].path;
        let name = if fanout > 1 {
            format!("{}_bc_{}", producer_path, consumer_index)
        } else {
            producer_path.clone()
        };

        self.pipe_index.insert(name.clone(), id);
        self.pipes.push(Pipe {
            id,
            name,
            producer,
            consumer,
            consumer_index,
            fanout,
            owner,
            path: Vec::new(),
            status: Status::Empty,
            status_time: None,
        });
        self.nodes[owner.index()].pipes.push(id);
        self.ports[producer.index()].pipes.push(id);
        self.ports[consumer.index()].pipes.push(id);
        id
    }

    // ---- accessors ----

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Checked node access.
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        if id.is_valid() {
            self.nodes.get(id.index())
        } else {
            None
        }
    }

    pub fn port(&self, id: PortId) -> &Port {
        &self.ports[id.index()]
    }

    pub fn port_mut(&mut self, id: PortId) -> &mut Port {
        &mut self.ports[id.index()]
    }

    pub fn pipe(&self, id: PipeId) -> &Pipe {
        &self.pipes[id.index()]
    }

    pub fn pipe_mut(&mut self, id: PipeId) -> &mut Pipe {
        &mut self.pipes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn pipe_count(&self) -> usize {
        self.pipes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn pipes(&self) -> impl Iterator<Item = &Pipe> {
        self.pipes.iter()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn ports_of(&self, id: NodeId, direction: PortDirection) -> &[PortId] {
        self.nodes[id.index()].ports(direction)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id.index()].parent;
        parent.is_valid().then_some(parent)
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            model: self,
            current: self.nodes[id.index()].parent,
        }
    }

    /// Pipes owned by `id` (both endpoints inside its scope).
    pub fn pipes_owned_by(&self, id: NodeId) -> &[PipeId] {
        &self.nodes[id.index()].pipes
    }

    /// Pipes arriving at the input ports of `id`.
    pub fn input_pipes(&self, id: NodeId) -> impl Iterator<Item = PipeId> + '_ {
        self.nodes[id.index()]
            .inputs
            .iter()
            .flat_map(move |&p| self.ports[p.index()].pipes.iter().copied())
            .filter(move |&pipe| self.node_of_port(self.pipes[pipe.index()].consumer) == id)
    }

    /// Pipes leaving the output ports of `id`.
    pub fn output_pipes(&self, id: NodeId) -> impl Iterator<Item = PipeId> + '_ {
        self.nodes[id.index()]
            .outputs
            .iter()
            .flat_map(move |&p| self.ports[p.index()].pipes.iter().copied())
            .filter(move |&pipe| self.node_of_port(self.pipes[pipe.index()].producer) == id)
    }

    pub fn node_of_port(&self, port: PortId) -> NodeId {
        self.ports[port.index()].node
    }

    pub fn pipe_by_name(&self, name: &str) -> Option<PipeId> {
        self.pipe_index.get(name).copied()
    }

    // ---- path lookup ----

    /// Resolve a slash-delimited path relative to `base` by walking
    /// child-by-name. An empty path resolves to `base`.
    pub fn resolve(&self, base: NodeId, rel_path: &str) -> GraphResult<NodeId> {
        let mut current = base;
        for segment in rel_path.split('/').filter(|s| !s.is_empty()) {
            current = self.nodes[current.index()]
                .children
                .iter()
                .copied()
                .find(|&c| self.nodes[c.index()].name == segment)
                .ok_or_else(|| GraphError::NotFound {
                    path: format!("{}/{}", self.nodes[base.index()].path, rel_path),
                })?;
        }
        Ok(current)
    }

    /// Look up a node by its full path (`"top/a/b"`).
    pub fn find(&self, path: &str) -> GraphResult<NodeId> {
        self.path_index
            .get(path.trim_matches('/'))
            .copied()
            .ok_or_else(|| GraphError::NotFound {
                path: path.to_string(),
            })
    }

    // ---- visibility ----

    /// A node is visible iff every strict ancestor is expanded.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.ancestors(id).all(|a| self.nodes[a.index()].is_expanded())
    }

    /// A pipe is visible iff its owner is visible and expanded.
    pub fn is_pipe_visible(&self, id: PipeId) -> bool {
        let owner = self.pipes[id.index()].owner;
        self.nodes[owner.index()].is_expanded() && self.is_visible(owner)
    }

    /// Visible children of `id` (empty unless `id` is expanded).
    pub fn visible_children(&self, id: NodeId) -> &[NodeId] {
        let node = &self.nodes[id.index()];
        if node.is_expanded() {
            &node.children
        } else {
            &[]
        }
    }

    /// All visible pipes, in creation order.
    pub fn visible_pipes(&self) -> impl Iterator<Item = PipeId> + '_ {
        self.pipes
            .iter()
            .map(|p| p.id)
            .filter(move |&p| self.is_pipe_visible(p))
    }

    /// Post-order walk of visible nodes below (and including) `id`.
    pub fn visible_post_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![(id, false)];
        while let Some((n, visited)) = stack.pop() {
            if visited {
                out.push(n);
                continue;
            }
            stack.push((n, true));
            for &c in self.visible_children(n).iter().rev() {
                stack.push((c, false));
            }
        }
        out
    }
}

/// Iterator over strict ancestors, nearest first.
pub struct Ancestors<'a> {
    model: &'a GraphModel,
    current: NodeId,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.model.get_node(self.current)?;
        let id = node.id;
        self.current = node.parent;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::circuit::CircuitNode;
    use crate::graph::node::KindHint;

    fn stage(name: &str) -> CircuitNode {
        CircuitNode::new(name)
            .with_inputs(["din"])
            .with_outputs(["dout"])
    }

    fn two_stage() -> CircuitNode {
        CircuitNode::new("top")
            .with_inputs(["din"])
            .with_outputs(["dout"])
            .with_child(stage("a"))
            .with_child(stage("b"))
            .connect("din", &["a.din"])
            .connect("a.dout", &["b.din"])
            .connect("b.dout", &["dout"])
    }

    #[test]
    fn test_build_two_stage() {
        let model = GraphModel::build(&two_stage());
        let root = model.root();
        assert_eq!(model.node(root).path, "top");
        assert_eq!(model.children(root).len(), 2);
        assert_eq!(model.pipe_count(), 3);
        assert!(model.node(root).is_hierarchical());
        assert!(!model.node(root).collapsed);

        let a = model.find("top/a").unwrap();
        assert!(model.node(a).collapsed);
        assert_eq!(model.node(a).kind, NodeKind::Leaf);
        assert_eq!(model.parent(a), Some(root));

        let pipe = model.pipe_by_name("top/a.dout").unwrap();
        let p = model.pipe(pipe);
        assert_eq!(p.owner, root);
        assert_eq!(model.port(p.consumer).path, "top/b.din");
    }

    #[test]
    fn test_ports_in_declared_order() {
        let circuit = CircuitNode::new("top").with_child(
            CircuitNode::new("m")
                .with_inputs(["x", "y", "z"])
                .with_outputs(["q"]),
        );
        let model = GraphModel::build(&circuit);
        let m = model.find("top/m").unwrap();
        let names: Vec<_> = model
            .ports_of(m, PortDirection::Input)
            .iter()
            .map(|&p| model.port(p).name.clone())
            .collect();
        assert_eq!(names, ["x", "y", "z"]);
        assert_eq!(model.port(model.node(m).inputs[2]).index, 2);
    }

    #[test]
    fn test_fanout_pipes() {
        let circuit = CircuitNode::new("top")
            .with_child(stage("src"))
            .with_child(stage("c0"))
            .with_child(stage("c1"))
            .with_child(stage("c2"))
            .connect("src.dout", &["c0.din", "c1.din", "c2.din"]);
        let model = GraphModel::build(&circuit);
        assert_eq!(model.pipe_count(), 3);

        let names: Vec<_> = model.pipes().map(|p| p.name.clone()).collect();
        assert_eq!(
            names,
            ["top/src.dout_bc_0", "top/src.dout_bc_1", "top/src.dout_bc_2"]
        );
        let producers: Vec<_> = model.pipes().map(|p| p.producer).collect();
        assert!(producers.windows(2).all(|w| w[0] == w[1]));
        assert!(model.pipes().all(|p| p.fanout == 3));
    }

    #[test]
    fn test_repeated_producer_counts_as_fanout() {
        let circuit = CircuitNode::new("top")
            .with_child(stage("a"))
            .with_child(stage("b"))
            .with_child(stage("c"))
            .connect("a.dout", &["b.din"])
            .connect("a.dout", &["c.din"]);
        let model = GraphModel::build(&circuit);

        let names: Vec<_> = model.pipes().map(|p| p.name.clone()).collect();
        assert_eq!(names, ["top/a.dout_bc_0", "top/a.dout_bc_1"]);
        assert!(model.pipes().all(|p| p.fanout == 2));
        assert_eq!(model.pipe_by_name("top/a.dout_bc_0"), Some(PipeId(0)));
        assert_eq!(model.pipe_by_name("top/a.dout_bc_1"), Some(PipeId(1)));
        assert_eq!(model.pipe_by_name("top/a.dout"), None);
    }

    #[test]
    fn test_unresolved_endpoints_are_skipped() {
        let circuit = CircuitNode::new("top")
            .with_child(stage("a"))
            .with_child(stage("b"))
            .connect("ghost.dout", &["b.din"])
            .connect("a.dout", &["b.din", "b.nope", "missing.din"]);
        let model = GraphModel::build(&circuit);
        assert_eq!(model.pipe_count(), 1);
        let pipe = model.pipes().next().unwrap();
        assert_eq!(pipe.consumer_index, 0);
        assert_eq!(pipe.fanout, 3);
    }

    #[test]
    fn test_wrong_direction_is_skipped() {
        // a.din is an input: it can't produce inside the parent scope
        let circuit = CircuitNode::new("top")
            .with_child(stage("a"))
            .with_child(stage("b"))
            .connect("a.din", &["b.din"]);
        let model = GraphModel::build(&circuit);
        assert_eq!(model.pipe_count(), 0);
    }

    #[test]
    fn test_resolve_relative_path() {
        let circuit = CircuitNode::new("top").with_child(
            CircuitNode::new("mid").with_child(CircuitNode::new("leaf")),
        );
        let model = GraphModel::build(&circuit);
        let root = model.root();
        let leaf = model.resolve(root, "mid/leaf").unwrap();
        assert_eq!(model.node(leaf).path, "top/mid/leaf");
        assert_eq!(model.resolve(root, "").unwrap(), root);

        let mid = model.find("top/mid").unwrap();
        assert_eq!(model.resolve(mid, "leaf").unwrap(), leaf);
    }

    #[test]
    fn test_resolve_not_found_leaves_model_untouched() {
        let model = GraphModel::build(&two_stage());
        let before = model.node_count();
        let err = model.resolve(model.root(), "nonexistent/path").unwrap_err();
        assert!(matches!(err, GraphError::NotFound { .. }));
        assert_eq!(model.node_count(), before);
        assert!(model.find("top/zzz").is_err());
    }

    #[test]
    fn test_visibility() {
        let circuit = CircuitNode::new("top").with_child(
            CircuitNode::new("mid")
                .with_child(stage("x"))
                .with_child(stage("y"))
                .connect("x.dout", &["y.din"]),
        );
        let mut model = GraphModel::build(&circuit);
        let mid = model.find("top/mid").unwrap();
        let x = model.find("top/mid/x").unwrap();
        let pipe = model.pipe_by_name("top/mid/x.dout").unwrap();

        assert!(model.is_visible(mid));
        assert!(!model.is_visible(x));
        assert!(!model.is_pipe_visible(pipe));

        model.node_mut(mid).collapsed = false;
        assert!(model.is_visible(x));
        assert!(model.is_pipe_visible(pipe));
        assert_eq!(model.visible_post_order(model.root()).len(), 4);
    }

    #[test]
    fn test_input_output_pipes() {
        let model = GraphModel::build(&two_stage());
        let a = model.find("top/a").unwrap();
        let inputs: Vec<_> = model.input_pipes(a).collect();
        let outputs: Vec<_> = model.output_pipes(a).collect();
        assert_eq!(inputs.len(), 1);
        assert_eq!(outputs.len(), 1);
        assert_eq!(model.pipe(inputs[0]).name, "top.din");
        assert_eq!(model.pipe(outputs[0]).name, "top/a.dout");
    }

    #[test]
    fn test_minimized_hint() {
        let circuit = CircuitNode::new("top")
            .with_child(stage("bc").with_kind(KindHint::Minimized));
        let model = GraphModel::build(&circuit);
        let bc = model.find("top/bc").unwrap();
        assert_eq!(model.node(bc).kind, NodeKind::Minimized);
        assert!(!model.node(bc).is_expandable());
    }
}
