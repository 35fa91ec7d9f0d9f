//! Nodes
//!
//! - [`DdsNode`]: the identity (name + age) every node carries
//! - [`FunnyNode`]: demo node built from a `DdsNode` plus owned value types
//! - [`NodeKind`]: the closed set of nodes the sample loop knows how to drive

pub mod dds_node;
pub mod funny;

pub use dds_node::DdsNode;
pub use funny::FunnyNode;

/// Every node variant the sample loop can drive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Voltage + seed demo node
    Funny(FunnyNode),
}

impl NodeKind {
    /// Run the node's computation for one input
    pub fn compute(&self, input: i32) -> i32 {
        match self {
            NodeKind::Funny(node) => node.compute(input),
        }
    }

    /// Identity of the node
    pub fn base(&self) -> &DdsNode {
        match self {
            NodeKind::Funny(node) => node.base(),
        }
    }

    /// Node name
    pub fn name(&self) -> &str {
        self.base().name()
    }

    /// Short variant name for logs
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::Funny(_) => "funny",
        }
    }
}

impl From<FunnyNode> for NodeKind {
    fn from(node: FunnyNode) -> Self {
        NodeKind::Funny(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_delegates_to_variant() {
        let kind = NodeKind::from(FunnyNode::new(42));
        assert_eq!(kind.compute(0), 92);
        assert_eq!(kind.name(), "chochacho");
        assert_eq!(kind.base().age(), 11);
        assert_eq!(kind.kind_name(), "funny");
    }
}
