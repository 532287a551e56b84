//! Crossing minimization by barycenter sweeps.
//!
//! Alternating downward and upward sweeps reorder each rank by the mean
//! position of its neighbours in the adjacent, fixed rank. The best ordering
//! seen is kept; sweeping stops as soon as a pass does not improve on it.
//! Ranks holding own-port vertices keep their declared order.

use crate::layout::layered::LayeredGraph;
use std::cmp::Ordering;

/// Order the vertices of every rank to reduce edge crossings.
pub fn minimize_crossings(graph: &LayeredGraph, max_passes: usize) -> Vec<Vec<usize>> {
    let (pred, succ) = graph.adjacency();
    let mut order = graph.initial_order();
    let mut best = order.clone();
    let mut best_crossings = count_crossings(&order, &succ, graph.vertices.len());

    for pass in 0..max_passes {
        if best_crossings == 0 {
            break;
        }

        for rank in 1..order.len() {
            sweep_rank(graph, &mut order, rank, rank - 1, &pred);
        }
        for rank in (0..order.len().saturating_sub(1)).rev() {
            sweep_rank(graph, &mut order, rank, rank + 1, &succ);
        }

        let crossings = count_crossings(&order, &succ, graph.vertices.len());
        tracing::trace!("Crossing pass {}: {} crossings", pass, crossings);
        if crossings >= best_crossings {
            break;
        }
        best_crossings = crossings;
        best = order.clone();
    }

    best
}

fn sweep_rank(
    graph: &LayeredGraph,
    order: &mut [Vec<usize>],
    rank: usize,
    fixed: usize,
    neighbours: &[Vec<usize>],
) {
    if order[rank]
        .iter()
        .any(|&v| graph.vertices[v].kind.is_port())
    {
        return;
    }

    let mut position = vec![None; graph.vertices.len()];
    for (i, &v) in order[fixed].iter().enumerate() {
        position[v] = Some(i as f64);
    }

    let mut keyed: Vec<(f64, usize)> = order[rank]
        .iter()
        .enumerate()
        .map(|(i, &v)| (barycenter(&neighbours[v], &position).unwrap_or(i as f64), v))
        .collect();
    keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    order[rank] = keyed.into_iter().map(|(_, v)| v).collect();
}

/// Mean position of the neighbours that sit in the fixed rank.
fn barycenter(neighbours: &[usize], position: &[Option<f64>]) -> Option<f64> {
    let placed: Vec<f64> = neighbours.iter().filter_map(|&n| position[n]).collect();
    if placed.is_empty() {
        None
    } else {
        Some(placed.iter().sum::<f64>() / placed.len() as f64)
    }
}

/// Number of pairwise segment crossings between adjacent ranks.
pub fn count_crossings(order: &[Vec<usize>], succ: &[Vec<usize>], vertex_count: usize) -> usize {
    let mut total = 0;
    let mut position = vec![usize::MAX; vertex_count];
    for rank in order {
        for (i, &v) in rank.iter().enumerate() {
            position[v] = i;
        }
    }

    for pair in order.windows(2) {
        let mut segments: Vec<(usize, usize)> = Vec::new();
        for (sp, &v) in pair[0].iter().enumerate() {
            for &w in &succ[v] {
                if pair[1].contains(&w) {
                    segments.push((sp, position[w]));
                }
            }
        }
        for i in 0..segments.len() {
            for j in (i + 1)..segments.len() {
                let (a0, a1) = segments[i];
                let (b0, b1) = segments[j];
                if (a0 < b0 && a1 > b1) || (a0 > b0 && a1 < b1) {
                    total += 1;
                }
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CircuitNode, GraphModel};
    use crate::layout::layered::VertexKind;

    fn stage(name: &str) -> CircuitNode {
        CircuitNode::new(name)
            .with_inputs(["din"])
            .with_outputs(["dout"])
    }

    fn layered(circuit: &CircuitNode) -> (GraphModel, LayeredGraph) {
        let model = GraphModel::build(circuit);
        let mut graph = LayeredGraph::build(&model, model.root());
        graph.break_cycles();
        graph.assign_ranks();
        graph.insert_dummies();
        (model, graph)
    }

    #[test]
    fn test_untangles_crossed_pairs() {
        // a0 -> b1 and a1 -> b0 cross in declaration order
        let circuit = CircuitNode::new("top")
            .with_child(stage("a0"))
            .with_child(stage("a1"))
            .with_child(stage("b0"))
            .with_child(stage("b1"))
            .connect("a0.dout", &["b1.din"])
            .connect("a1.dout", &["b0.din"]);
        let (_, graph) = layered(&circuit);
        let (_, succ) = graph.adjacency();

        let initial = graph.initial_order();
        assert_eq!(count_crossings(&initial, &succ, graph.vertices.len()), 1);

        let order = minimize_crossings(&graph, 24);
        assert_eq!(count_crossings(&order, &succ, graph.vertices.len()), 0);
    }

    #[test]
    fn test_port_ranks_keep_declared_order() {
        let circuit = CircuitNode::new("top")
            .with_inputs(["x", "y"])
            .with_child(stage("a"))
            .with_child(stage("b"))
            .connect("x", &["b.din"])
            .connect("y", &["a.din"]);
        let (model, graph) = layered(&circuit);
        let order = minimize_crossings(&graph, 24);
        let root = model.node(model.root());
        let first: Vec<_> = order[0].iter().map(|&v| graph.vertices[v].kind).collect();
        assert_eq!(
            first,
            [
                VertexKind::Input(root.inputs[0]),
                VertexKind::Input(root.inputs[1])
            ]
        );

        // the children follow the ports instead
        let b = model.find("top/b").unwrap();
        assert_eq!(graph.vertices[order[1][0]].kind, VertexKind::Child(b));
    }

    #[test]
    fn test_zero_passes_keeps_initial_order() {
        let circuit = CircuitNode::new("top")
            .with_child(stage("a"))
            .with_child(stage("b"));
        let (_, graph) = layered(&circuit);
        assert_eq!(minimize_crossings(&graph, 0), graph.initial_order());
    }
}
