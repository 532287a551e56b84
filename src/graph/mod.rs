//! Graph model: the hierarchical tree of nodes, ports and pipes.
//!
//! The model mirrors the simulated circuit's hierarchy and is independent of
//! any visual layout. It is populated once from a [`CircuitHierarchy`] and
//! afterwards only mutated in its derived fields (collapse state, geometry,
//! status).

pub mod circuit;
pub mod error;
pub mod id;
pub mod model;
pub mod node;
pub mod pipe;
pub mod port;

pub use circuit::{CircuitHierarchy, CircuitNode, Endpoint, Interface};
pub use error::{GraphError, GraphResult};
pub use id::{NodeId, PipeId, PortId};
pub use model::{Ancestors, GraphModel};
pub use node::{KindHint, Node, NodeKind};
pub use pipe::Pipe;
pub use port::{Port, PortDirection};
