//! Test data builders for creating circuit descriptions

use pipeview::graph::{CircuitNode, KindHint};

/// Leaf unit with one `din` input and one `dout` output.
pub fn stage(name: &str) -> CircuitNode {
    CircuitNode::new(name)
        .with_inputs(["din"])
        .with_outputs(["dout"])
}

/// Builder for a block of stages wired in a line: `s0 -> s1 -> ...`
pub struct ChainBuilder {
    name: String,
    length: usize,
    ports: bool,
    kind: KindHint,
}

impl ChainBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            length: 2,
            ports: false,
            kind: KindHint::Auto,
        }
    }

    pub fn length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Give the block its own `din`/`dout` and wire them to the ends of the chain.
    pub fn with_ports(mut self) -> Self {
        self.ports = true;
        self
    }

    pub fn stage_kind(mut self, kind: KindHint) -> Self {
        self.kind = kind;
        self
    }

    pub fn build(self) -> CircuitNode {
        let mut block = CircuitNode::new(self.name.as_str());
        for i in 0..self.length {
            block = block.with_child(stage(&format!("s{}", i)).with_kind(self.kind));
        }
        for i in 1..self.length {
            let consumer = format!("s{}.din", i);
            block = block.connect(&format!("s{}.dout", i - 1), &[consumer.as_str()]);
        }
        if self.ports && self.length > 0 {
            let last = format!("s{}.dout", self.length - 1);
            block = block
                .with_inputs(["din"])
                .with_outputs(["dout"])
                .connect("din", &["s0.din"])
                .connect(&last, &["dout"]);
        }
        block
    }
}

/// `design` containing `top`, which contains `a -> b`.
pub fn two_level() -> CircuitNode {
    CircuitNode::new("design").with_child(
        CircuitNode::new("top")
            .with_child(stage("a"))
            .with_child(stage("b"))
            .connect("a.dout", &["b.din"]),
    )
}

/// `top` with `src` broadcasting to `c0`, `c1` and `c2`.
pub fn fan_out() -> CircuitNode {
    CircuitNode::new("top")
        .with_child(stage("src"))
        .with_child(stage("c0"))
        .with_child(stage("c1"))
        .with_child(stage("c2"))
        .connect("src.dout", &["c0.din", "c1.din", "c2.din"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_builder() {
        let chain = ChainBuilder::new("blk").length(3).with_ports().build();
        assert_eq!(chain.children.len(), 3);
        assert_eq!(chain.connections.len(), 4);
        assert_eq!(chain.inputs, ["din"]);
    }
}
