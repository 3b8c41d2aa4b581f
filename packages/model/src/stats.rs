//! Tree statistics: node totals, per-variant counts and depth.

use crate::node::{Node, NodeType};
use serde::{Deserialize, Serialize};

/// Per-variant node counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCounts {
    pub root: usize,
    pub object: usize,
    pub list: usize,
    pub data: usize,
}

impl NodeCounts {
    fn bump(&mut self, node_type: NodeType) {
        match node_type {
            NodeType::Root => self.root += 1,
            NodeType::Object => self.object += 1,
            NodeType::List => self.list += 1,
            NodeType::Data => self.data += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    pub total: usize,

    /// Depth of the deepest node, the top node being depth 1
    pub max_depth: usize,

    pub counts: NodeCounts,
}

pub fn calculate_stats(root: &Node) -> TreeStats {
    let mut counts = NodeCounts::default();
    let mut max_depth = 0;
    let mut total = 0;

    // Iterative, document depth is unbounded
    let mut stack = vec![(root, 1usize)];
    while let Some((node, depth)) = stack.pop() {
        total += 1;
        counts.bump(node.node_type());
        max_depth = max_depth.max(depth);

        if let Some(children) = node.children() {
            stack.extend(children.iter().map(|c| (c, depth + 1)));
        }
    }

    TreeStats {
        total,
        max_depth,
        counts,
    }
}
