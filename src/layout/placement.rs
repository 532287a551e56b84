//! Coordinate assignment for an ordered layered graph.
//!
//! Ranks become columns, left to right, each as wide as its widest vertex.
//! Within a column vertices are stacked in order with a fixed separation,
//! then a few alignment passes pull each vertex toward the mean height of
//! its neighbours without ever changing the order or closing a gap below
//! the separation.

use crate::config::LayoutSettings;
use crate::layout::layered::LayeredGraph;

/// Assign a top-left position to every vertex.
pub fn assign_coordinates(graph: &mut LayeredGraph, order: &[Vec<usize>], settings: &LayoutSettings) {
    let mut x = 0.0;
    for rank in order {
        let column_width = rank
            .iter()
            .map(|&v| graph.vertices[v].size.width)
            .fold(0.0, f64::max);
        for &v in rank {
            let vertex = &mut graph.vertices[v];
            vertex.pos.x = x + (column_width - vertex.size.width) / 2.0;
        }
        x += column_width + settings.rank_separation;
    }

    for rank in order {
        let mut y = 0.0;
        for &v in rank {
            graph.vertices[v].pos.y = y;
            y += graph.vertices[v].size.height + settings.node_separation;
        }
    }

    let (pred, succ) = graph.adjacency();
    for _ in 0..settings.alignment_passes {
        for rank in order {
            let desired: Vec<f64> = rank
                .iter()
                .map(|&v| {
                    let neighbours: Vec<f64> = pred[v]
                        .iter()
                        .chain(succ[v].iter())
                        .map(|&n| graph.vertices[n].center().y)
                        .collect();
                    let vertex = &graph.vertices[v];
                    if neighbours.is_empty() {
                        vertex.pos.y
                    } else {
                        let mean = neighbours.iter().sum::<f64>() / neighbours.len() as f64;
                        mean - vertex.size.height / 2.0
                    }
                })
                .collect();
            pack(graph, rank, &desired, settings.node_separation);
        }
    }
}

/// Move each vertex of `rank` to its desired y, pushing it down only as far
/// as needed to keep `separation` below the previous one.
fn pack(graph: &mut LayeredGraph, rank: &[usize], desired: &[f64], separation: f64) {
    let mut floor = f64::NEG_INFINITY;
    for (&v, &want) in rank.iter().zip(desired) {
        let vertex = &mut graph.vertices[v];
        vertex.pos.y = want.max(floor);
        floor = vertex.pos.y + vertex.size.height + separation;
    }
}
