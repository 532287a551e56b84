//! Circuit hierarchy provider.
//!
//! The graph model is populated once by walking an already-elaborated
//! hierarchical netlist through the [`CircuitHierarchy`] trait. The crate
//! ships [`CircuitNode`], a serde implementation that can be loaded from JSON:
//!
//! ```json
//! {
//!   "name": "top",
//!   "inputs": ["din"],
//!   "outputs": ["dout"],
//!   "children": [
//!     { "name": "a", "inputs": ["din"], "outputs": ["dout"] },
//!     { "name": "b", "inputs": ["din"], "outputs": ["dout"] }
//!   ],
//!   "connections": [
//!     { "from": "din", "to": ["a.din"] },
//!     { "from": "a.dout", "to": ["b.din"] },
//!     { "from": "b.dout", "to": ["dout"] }
//!   ]
//! }
//! ```
//!
//! An endpoint is either `port` (a port of the enclosing node) or
//! `child.port` (a port of a direct child).

use crate::error::Result;
use crate::graph::error::GraphError;
use crate::graph::node::KindHint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One end of an interface, relative to the node that declares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint {
    /// Child short name, or `None` for a port of the declaring node itself.
    pub node: Option<String>,
    pub port: String,
}

impl Endpoint {
    pub fn own(port: impl Into<String>) -> Self {
        Self {
            node: None,
            port: port.into(),
        }
    }

    pub fn child(node: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            node: Some(node.into()),
            port: port.into(),
        }
    }
}

impl std::str::FromStr for Endpoint {
    type Err = GraphError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || GraphError::InvalidPortRef(s.to_string());
        match s.split_once('.') {
            Some((node, port)) => {
                if node.is_empty() || port.is_empty() || port.contains('.') {
                    return Err(invalid());
                }
                Ok(Endpoint::child(node, port))
            }
            None if s.is_empty() => Err(invalid()),
            None => Ok(Endpoint::own(s)),
        }
    }
}

impl TryFrom<String> for Endpoint {
    type Error = GraphError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Endpoint> for String {
    fn from(ep: Endpoint) -> String {
        ep.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Some(node) => write!(f, "{}.{}", node, self.port),
            None => f.write_str(&self.port),
        }
    }
}

/// A point-to-point or broadcast interface: one producer, one or more consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    #[serde(rename = "from")]
    pub producer: Endpoint,
    #[serde(rename = "to")]
    pub consumers: Vec<Endpoint>,
}

/// Tree walk over an elaborated circuit.
pub trait CircuitHierarchy {
    /// Short name of this unit.
    fn name(&self) -> &str;

    fn kind_hint(&self) -> KindHint {
        KindHint::Auto
    }

    /// Input interface names, in declared order.
    fn input_names(&self) -> Vec<&str>;

    /// Output interface names, in declared order.
    fn output_names(&self) -> Vec<&str>;

    fn children(&self) -> Vec<&dyn CircuitHierarchy>;

    /// Interfaces declared inside this unit, between its own ports and its children.
    fn interfaces(&self) -> Vec<Interface>;
}

/// Serde-backed circuit description.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CircuitNode {
    pub name: String,
    #[serde(default)]
    pub kind: KindHint,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub children: Vec<CircuitNode>,
    #[serde(default)]
    pub connections: Vec<Interface>,
}

impl CircuitNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load a description from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn with_kind(mut self, kind: KindHint) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_inputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_outputs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_child(mut self, child: CircuitNode) -> Self {
        self.children.push(child);
        self
    }

    /// Add an interface from `from` to every endpoint in `to`.
    ///
    /// Panics on a malformed endpoint string; intended for building fixtures.
    pub fn connect(mut self, from: &str, to: &[&str]) -> Self {
        let parse = |s: &str| {
            s.parse::<Endpoint>()
                .unwrap_or_else(|e| panic!("bad endpoint in fixture: {}", e))
        };
        self.connections.push(Interface {
            producer: parse(from),
            consumers: to.iter().map(|s| parse(s)).collect(),
        });
        self
    }
}

impl CircuitHierarchy for CircuitNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind_hint(&self) -> KindHint {
        self.kind
    }

    fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(String::as_str).collect()
    }

    fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(String::as_str).collect()
    }

    fn children(&self) -> Vec<&dyn CircuitHierarchy> {
        self.children
            .iter()
            .map(|c| c as &dyn CircuitHierarchy)
            .collect()
    }

    fn interfaces(&self) -> Vec<Interface> {
        self.connections.clone()
    }
}
