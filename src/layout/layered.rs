//! Layered graph for one expanded node.
//!
//! Vertices are the node's visible children (opaque boxes sized by their own,
//! already computed layout) plus one zero-size vertex per own port. Each
//! owned pipe becomes one edge. Before ordering, the graph is made acyclic
//! for ranking purposes, ranked by longest path, and long edges are split
//! with dummy vertices so every segment joins two adjacent ranks.

use crate::graph::{GraphModel, NodeId, PipeId, PortId};
use crate::types::{Point, Size};
use std::collections::{HashMap, VecDeque};

/// What a layout vertex stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexKind {
    Child(NodeId),
    /// Own input port, pinned to the first rank.
    Input(PortId),
    /// Own output port, pinned to the last rank.
    Output(PortId),
    /// Bend point of an edge spanning several ranks.
    Dummy,
}

impl VertexKind {
    pub fn is_port(self) -> bool {
        matches!(self, VertexKind::Input(_) | VertexKind::Output(_))
    }
}

#[derive(Debug, Clone)]
pub struct Vertex {
    pub kind: VertexKind,
    pub size: Size,
    pub rank: usize,
    /// Top-left corner, assigned by placement.
    pub pos: Point,
}

impl Vertex {
    pub fn center(&self) -> Point {
        Point::new(
            self.pos.x + self.size.width / 2.0,
            self.pos.y + self.size.height / 2.0,
        )
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub pipe: PipeId,
    /// Vertex of the producing end.
    pub source: usize,
    /// Vertex of the consuming end.
    pub target: usize,
    /// Reversed for ranking (a feedback edge).
    pub reversed: bool,
    /// Vertices from producer to consumer, dummies included.
    pub chain: Vec<usize>,
}

impl Edge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// Endpoints as seen by ranking: `(lower, higher)`.
    pub fn oriented(&self) -> (usize, usize) {
        if self.reversed {
            (self.target, self.source)
        } else {
            (self.source, self.target)
        }
    }

    /// Dummy vertices of this edge, in producer-to-consumer order.
    pub fn dummies(&self) -> &[usize] {
        if self.chain.len() > 2 {
            &self.chain[1..self.chain.len() - 1]
        } else {
            &[]
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LayeredGraph {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub rank_count: usize,
}

impl LayeredGraph {
    /// Collect the vertex and edge sets of `id`.
    ///
    /// Owned pipes whose endpoints are not in the vertex set are dropped.
    pub fn build(model: &GraphModel, id: NodeId) -> Self {
        let node = model.node(id);
        let mut graph = LayeredGraph::default();
        let mut child_vertex: HashMap<NodeId, usize> = HashMap::new();
        let mut port_vertex: HashMap<PortId, usize> = HashMap::new();

        for &port in &node.inputs {
            let v = graph.push_vertex(VertexKind::Input(port), Size::default(), 0);
            port_vertex.insert(port, v);
        }
        for &child in model.visible_children(id) {
            let v = graph.push_vertex(VertexKind::Child(child), model.node(child).size, 0);
            child_vertex.insert(child, v);
        }
        for &port in &node.outputs {
            let v = graph.push_vertex(VertexKind::Output(port), Size::default(), 0);
            port_vertex.insert(port, v);
        }

        let vertex_of = |port: PortId| {
            let owner = model.node_of_port(port);
            if owner == id {
                port_vertex.get(&port).copied()
            } else {
                child_vertex.get(&owner).copied()
            }
        };

        for &pipe_id in model.pipes_owned_by(id) {
            let pipe = model.pipe(pipe_id);
            match (vertex_of(pipe.producer), vertex_of(pipe.consumer)) {
                (Some(source), Some(target)) => graph.edges.push(Edge {
                    pipe: pipe_id,
                    source,
                    target,
                    reversed: false,
                    chain: vec![source, target],
                }),
                _ => tracing::warn!(
                    "Dropping pipe '{}' from layout of '{}': endpoint not in vertex set",
                    pipe.name,
                    node.path
                ),
            }
        }

        graph
    }

    fn push_vertex(&mut self, kind: VertexKind, size: Size, rank: usize) -> usize {
        self.vertices.push(Vertex {
            kind,
            size,
            rank,
            pos: Point::ORIGIN,
        });
        self.vertices.len() - 1
    }

    /// Mark DFS back edges as reversed so ranking sees a DAG.
    ///
    /// Feedback loops are legal in hardware; the reversal only affects ranks,
    /// pipes are still routed from producer to consumer.
    pub fn break_cycles(&mut self) {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        let n = self.vertices.len();
        let mut out: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (ei, edge) in self.edges.iter().enumerate() {
            if !edge.is_self_loop() {
                out[edge.source].push(ei);
            }
        }

        let mut mark = vec![Mark::New; n];
        for start in 0..n {
            if mark[start] != Mark::New {
                continue;
            }
            mark[start] = Mark::Active;
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

            while let Some(top) = stack.last_mut() {
                let (v, cursor) = *top;
                match out[v].get(cursor) {
                    Some(&ei) => {
                        top.1 += 1;
                        let w = self.edges[ei].target;
                        match mark[w] {
                            Mark::New => {
                                mark[w] = Mark::Active;
                                stack.push((w, 0));
                            }
                            Mark::Active => self.edges[ei].reversed = true,
                            Mark::Done => {}
                        }
                    }
                    None => {
                        mark[v] = Mark::Done;
                        stack.pop();
                    }
                }
            }
        }
    }

    /// Longest-path ranking over the oriented edges.
    ///
    /// Own inputs take rank 0 and children start after them; own outputs all
    /// take the rank after the last child.
    pub fn assign_ranks(&mut self) {
        let n = self.vertices.len();
        let mut succ: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut in_degree = vec![0usize; n];
        for edge in self.edges.iter().filter(|e| !e.is_self_loop()) {
            let (u, v) = edge.oriented();
            succ[u].push(v);
            in_degree[v] += 1;
        }

        let has_inputs = self
            .vertices
            .iter()
            .any(|v| matches!(v.kind, VertexKind::Input(_)));
        let base = usize::from(has_inputs);
        for v in &mut self.vertices {
            v.rank = match v.kind {
                VertexKind::Input(_) => 0,
                _ => base,
            };
        }

        let mut queue: VecDeque<usize> = (0..n).filter(|&v| in_degree[v] == 0).collect();
        while let Some(u) = queue.pop_front() {
            let next_rank = self.vertices[u].rank + 1;
            for &v in &succ[u] {
                if self.vertices[v].rank < next_rank {
                    self.vertices[v].rank = next_rank;
                }
                in_degree[v] -= 1;
                if in_degree[v] == 0 {
                    queue.push_back(v);
                }
            }
        }

        let sink_rank = self
            .vertices
            .iter()
            .filter(|v| !matches!(v.kind, VertexKind::Output(_)))
            .map(|v| v.rank + 1)
            .max()
            .unwrap_or(0);
        for v in &mut self.vertices {
            if let VertexKind::Output(_) = v.kind {
                v.rank = sink_rank;
            }
        }

        self.rank_count = self.vertices.iter().map(|v| v.rank + 1).max().unwrap_or(0);
    }

    /// Split every edge spanning more than one rank with dummy vertices.
    pub fn insert_dummies(&mut self) {
        for ei in 0..self.edges.len() {
            if self.edges[ei].is_self_loop() {
                continue;
            }
            let (lo, hi) = self.edges[ei].oriented();
            let (lo_rank, hi_rank) = (self.vertices[lo].rank, self.vertices[hi].rank);

            let mut chain = vec![lo];
            for rank in lo_rank + 1..hi_rank {
                chain.push(self.push_vertex(VertexKind::Dummy, Size::default(), rank));
            }
            chain.push(hi);
            if self.edges[ei].reversed {
                chain.reverse();
            }
            self.edges[ei].chain = chain;
        }
    }

    /// Vertices grouped by rank, in insertion order.
    pub fn initial_order(&self) -> Vec<Vec<usize>> {
        let mut order = vec![Vec::new(); self.rank_count];
        for (i, v) in self.vertices.iter().enumerate() {
            order[v.rank].push(i);
        }
        order
    }

    /// Predecessor and successor lists over the rank-adjacent segments.
    pub fn adjacency(&self) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
        let n = self.vertices.len();
        let mut pred = vec![Vec::new(); n];
        let mut succ = vec![Vec::new(); n];
        for edge in self.edges.iter().filter(|e| !e.is_self_loop()) {
            for pair in edge.chain.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let (lo, hi) = if self.vertices[a].rank <= self.vertices[b].rank {
                    (a, b)
                } else {
                    (b, a)
                };
                succ[lo].push(hi);
                pred[hi].push(lo);
            }
        }
        (pred, succ)
    }

    /// Bounding box of all vertices as `(min corner, max corner)`.
    pub fn extent(&self) -> (Point, Point) {
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for v in &self.vertices {
            min.x = min.x.min(v.pos.x);
            min.y = min.y.min(v.pos.y);
            max.x = max.x.max(v.pos.x + v.size.width);
            max.y = max.y.max(v.pos.y + v.size.height);
        }
        if self.vertices.is_empty() {
            (Point::ORIGIN, Point::ORIGIN)
        } else {
            (min, max)
        }
    }

    /// Shift every vertex by `delta`.
    pub fn translate(&mut self, delta: Point) {
        for v in &mut self.vertices {
            v.pos = v.pos + delta;
        }
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

    fn prepared(circuit: &CircuitNode) -> (GraphModel, LayeredGraph) {
        let model = GraphModel::build(circuit);
        let mut graph = LayeredGraph::build(&model, model.root());
        graph.break_cycles();
        graph.assign_ranks();
        graph.insert_dummies();
        (model, graph)
    }

    fn rank_of(graph: &LayeredGraph, kind: VertexKind) -> usize {
        graph
            .vertices
            .iter()
            .find(|v| v.kind == kind)
            .map(|v| v.rank)
            .unwrap()
    }

    #[test]
    fn test_chain_ranks() {
        let circuit = CircuitNode::new("top")
            .with_inputs(["din"])
            .with_outputs(["dout"])
            .with_child(stage("a"))
            .with_child(stage("b"))
            .connect("din", &["a.din"])
            .connect("a.dout", &["b.din"])
            .connect("b.dout", &["dout"]);
        let (model, graph) = prepared(&circuit);
        let a = model.find("top/a").unwrap();
        let b = model.find("top/b").unwrap();
        let root = model.node(model.root());

        assert_eq!(rank_of(&graph, VertexKind::Input(root.inputs[0])), 0);
        assert_eq!(rank_of(&graph, VertexKind::Child(a)), 1);
        assert_eq!(rank_of(&graph, VertexKind::Child(b)), 2);
        assert_eq!(rank_of(&graph, VertexKind::Output(root.outputs[0])), 3);
        assert_eq!(graph.rank_count, 4);
        assert!(graph.edges.iter().all(|e| e.dummies().is_empty()));
    }

    #[test]
    fn test_bypass_gets_dummies() {
        let circuit = CircuitNode::new("top")
            .with_inputs(["din"])
            .with_outputs(["dout"])
            .with_child(stage("a"))
            .with_child(stage("b"))
            .connect("din", &["a.din", "dout"])
            .connect("a.dout", &["b.din"]);
        let (model, graph) = prepared(&circuit);
        let bypass = model.pipe_by_name("top.din_bc_1").unwrap();
        let edge = graph.edges.iter().find(|e| e.pipe == bypass).unwrap();
        // inputs at 0, a at 1, b at 2, outputs at 3
        assert_eq!(edge.dummies().len(), 2);
        let ranks: Vec<_> = edge.chain.iter().map(|&v| graph.vertices[v].rank).collect();
        assert_eq!(ranks, [0, 1, 2, 3]);
    }

    #[test]
    fn test_feedback_is_reversed_not_dropped() {
        let circuit = CircuitNode::new("top")
            .with_child(stage("a"))
            .with_child(stage("b"))
            .connect("a.dout", &["b.din"])
            .connect("b.dout", &["a.din"]);
        let (model, graph) = prepared(&circuit);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.edges.iter().filter(|e| e.reversed).count(), 1);

        // every oriented edge goes strictly up in rank
        for e in &graph.edges {
            let (lo, hi) = e.oriented();
            assert!(graph.vertices[lo].rank < graph.vertices[hi].rank);
        }

        // chains still run producer to consumer
        let feedback = model.pipe_by_name("top/b.dout").unwrap();
        let edge = graph.edges.iter().find(|e| e.pipe == feedback).unwrap();
        let b = model.find("top/b").unwrap();
        assert_eq!(graph.vertices[edge.chain[0]].kind, VertexKind::Child(b));
    }

    #[test]
    fn test_self_loop_kept_out_of_ranking() {
        let circuit = CircuitNode::new("top")
            .with_child(stage("a"))
            .connect("a.dout", &["a.din"]);
        let (_, graph) = prepared(&circuit);
        assert_eq!(graph.edges.len(), 1);
        assert!(graph.edges[0].is_self_loop());
        assert_eq!(graph.rank_count, 1);
        let (pred, succ) = graph.adjacency();
        assert!(pred.iter().chain(succ.iter()).all(Vec::is_empty));
    }
}
