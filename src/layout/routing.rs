//! Pipe routing as cubic poly-beziers.
//!
//! A routed path is a flat point list `[a0, c, c, a1, c, c, a2, ...]`: the
//! anchors are the producer plug, the centers of any dummy vertices and the
//! consumer plug, and every pair of control points leaves and enters its
//! anchors horizontally. A path of `k` segments therefore has `3k + 1`
//! points. Pipes between two plugs at the same height with nothing in
//! between degenerate to a straight two-point path.

use crate::config::LayoutSettings;
use crate::types::{Point, Rect};

const EPSILON: f64 = 1e-6;

/// Route through `anchors`, which must start at the producer plug and end
/// at the consumer plug.
pub fn route(anchors: &[Point], settings: &LayoutSettings) -> Vec<Point> {
    match anchors {
        [] => Vec::new(),
        [only] => vec![*only],
        [start, end] if (start.y - end.y).abs() < EPSILON && start.x <= end.x => {
            vec![*start, *end]
        }
        _ => {
            let last = anchors.len() - 2;
            let mut points = Vec::with_capacity(3 * (anchors.len() - 1) + 1);
            points.push(anchors[0]);
            for (i, pair) in anchors.windows(2).enumerate() {
                let (from, to) = (pair[0], pair[1]);
                let (out, inn) = tangents(from, to, i == 0, i == last, settings);
                points.push(from.offset(out, 0.0));
                points.push(to.offset(-inn, 0.0));
                points.push(to);
            }
            points
        }
    }
}

/// Signed horizontal tangent lengths at the two ends of one segment.
///
/// Plugs are always left rightward (out of an output) and entered rightward
/// (into an input), even when the segment itself runs backwards.
fn tangents(
    from: Point,
    to: Point,
    leaves_plug: bool,
    enters_plug: bool,
    settings: &LayoutSettings,
) -> (f64, f64) {
    let dx = to.x - from.x;
    let min_len = settings.rank_separation * settings.bezier_tangent;
    let len = (dx.abs() * settings.bezier_tangent).max(min_len);
    let dir = if dx < 0.0 { -1.0 } else { 1.0 };
    let out = if leaves_plug { len } else { dir * len };
    let inn = if enters_plug { len } else { dir * len };
    (out, inn)
}

/// Route a pipe from a child's output back to one of its own inputs,
/// looping over the top of the child's box.
pub fn route_self_loop(start: Point, end: Point, bounds: &Rect, settings: &LayoutSettings) -> Vec<Point> {
    let clearance = settings.node_separation / 2.0;
    let top = bounds.y - clearance;
    let anchors = [
        start,
        Point::new(bounds.right() + clearance, top),
        Point::new(bounds.x - clearance, top),
        end,
    ];
    route(&anchors, settings)
}
