//! Core data types for pipeview
//!
//! This module contains the small value types shared by the graph model,
//! the layout engine and the activity synchronizer.
//!
//! # Main Types
//!
//! - [`Point`] / [`Size`] / [`Rect`] - Layout geometry in node-local units
//! - [`Status`] - Activity status of a pipe or a node
//! - [`GraphItem`] - Either a node or a pipe, used by selection and events
//!
//! # Status Values
//!
//! Pipes carry handshake states decoded from the simulation:
//! `Empty`, `Active` (valid without ready), `Waited` (ready without valid)
//! and `Handshaked` (valid and ready). Nodes carry derived states:
//! `Empty`, `Stuck` and `Error`.

use crate::graph::{NodeId, PipeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Point in 2D layout space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            w: size.width,
            h: size.height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// True if the horizontal extents of the two rectangles intersect.
    pub fn overlaps_x(&self, other: &Rect) -> bool {
        self.x < other.right() && self.right() > other.x
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// Activity status of a pipe or a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// No activity
    #[default]
    Empty,
    /// Producer offers data, consumer not ready
    Active,
    /// Consumer ready, producer has no data
    Waited,
    /// Data transferred this cycle
    Handshaked,
    /// Node has active inputs but no progress on its outputs
    Stuck,
    /// Issue reported against the item
    Error,
}

impl Status {
    /// Decode a `"valid ready"` token pair returned by a waveform service.
    ///
    /// Anything other than a clean `0`/`1` pair (e.g. `x`, `z`, empty) decodes
    /// to [`Status::Empty`].
    pub fn from_handshake(valid: &str, ready: &str) -> Self {
        match (valid.trim(), ready.trim()) {
            ("1", "0") => Status::Active,
            ("0", "1") => Status::Waited,
            ("1", "1") => Status::Handshaked,
            _ => Status::Empty,
        }
    }

    /// True if the producer side is offering data.
    pub fn is_flowing(self) -> bool {
        matches!(self, Status::Active | Status::Handshaked)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Empty => "empty",
            Status::Active => "active",
            Status::Waited => "waited",
            Status::Handshaked => "handshaked",
            Status::Stuck => "stuck",
            Status::Error => "error",
        };
        f.write_str(s)
    }
}

/// A selectable / observable item of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphItem {
    Node(NodeId),
    Pipe(PipeId),
}

impl GraphItem {
    pub fn as_node(self) -> Option<NodeId> {
        match self {
            GraphItem::Node(id) => Some(id),
            GraphItem::Pipe(_) => None,
        }
    }

    pub fn as_pipe(self) -> Option<PipeId> {
        match self {
            GraphItem::Pipe(id) => Some(id),
            GraphItem::Node(_) => None,
        }
    }
}
