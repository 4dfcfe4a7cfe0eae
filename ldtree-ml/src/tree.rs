//! Finished decision tree
//!
//! Nodes live in one arena and refer to their children by [`NodeId`]. Every
//! child sits at a higher index than its parent, which both the trainer and
//! the decoder guarantee, so depth is a single forward pass and evaluation
//! cannot loop.

use std::collections::VecDeque;

use ldtree_core::{CodecError, State, Table};
use serde::{Deserialize, Serialize};

use crate::node::{ActionNode, DecisionNode, Node, NodeId};
use crate::rng::RandomSource;
use crate::MLResult;

/// Trained tree over one table schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TreeParts")]
pub struct DecisionTree {
    nodes: Vec<Node>,
    root: NodeId,
}

/// Unchecked serde form of [`DecisionTree`]
#[derive(Deserialize)]
struct TreeParts {
    nodes: Vec<Node>,
    root: NodeId,
}

impl TryFrom<TreeParts> for DecisionTree {
    type Error = CodecError;

    fn try_from(parts: TreeParts) -> Result<Self, Self::Error> {
        Self::from_nodes(parts.nodes, parts.root).ok_or(CodecError::Inconsistent {
            reason: "tree links are not sound",
        })
    }
}

impl DecisionTree {
    /// Assemble a tree from an arena, checking that links are sound
    ///
    /// Returns `None` when the arena is empty, the root is out of range,
    /// or a child does not point strictly forward.
    pub(crate) fn from_nodes(nodes: Vec<Node>, root: NodeId) -> Option<Self> {
        if root.0 >= nodes.len() {
            return None;
        }
        for (index, node) in nodes.iter().enumerate() {
            if let Node::Decision(decision) = node {
                if decision.states.len() != decision.children.len() {
                    return None;
                }
                if decision
                    .children
                    .iter()
                    .any(|child| child.0 <= index || child.0 >= nodes.len())
                {
                    return None;
                }
            }
        }
        Some(Self { nodes, root })
    }

    /// Renumber nodes in breadth-first order from the root
    ///
    /// The trainer already allocates in this order; decoded trees arrive in
    /// pre-order and are normalized so equal trees compare equal.
    /// Unreachable nodes are dropped.
    pub(crate) fn into_breadth_first(self) -> Self {
        let mut new_ids: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([self.root]);
        while let Some(id) = queue.pop_front() {
            if new_ids[id.0].is_some() {
                continue;
            }
            new_ids[id.0] = Some(order.len());
            order.push(id);
            queue.extend(self.nodes[id.0].children().iter().copied());
        }

        let remap = |id: NodeId| NodeId(new_ids[id.0].unwrap_or(id.0));
        let nodes = order
            .iter()
            .map(|id| match &self.nodes[id.0] {
                Node::Decision(decision) => Node::Decision(DecisionNode {
                    states: decision.states.clone(),
                    column: decision.column,
                    children: decision.children.iter().map(|&child| remap(child)).collect(),
                }),
                Node::Action(leaf) => Node::Action(leaf.clone()),
            })
            .collect();

        Self {
            nodes,
            root: NodeId(0),
        }
    }

    /// Single-leaf tree
    pub fn leaf(leaf: ActionNode) -> Self {
        Self {
            nodes: vec![Node::Action(leaf)],
            root: NodeId(0),
        }
    }

    /// Train a tree on `table` with ID3
    pub fn fit(table: &Table) -> MLResult<Self> {
        crate::trainer::train(table)
    }

    /// Root node id
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node at `id`
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// All nodes in arena order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Root node
    pub fn root_node(&self) -> Option<&Node> {
        self.node(self.root)
    }

    /// Choose an action for `row`
    ///
    /// `row` holds the feature values in training column order, without the
    /// action column. `None` means no action: the row is too short or holds
    /// a value no branch was trained on.
    pub fn eval<R: RandomSource + ?Sized>(&self, row: &[State], rng: &mut R) -> Option<State> {
        self.leaf_for(row)?.sample(rng)
    }

    /// Leaf reached by `row`, without sampling
    pub fn leaf_for(&self, row: &[State]) -> Option<&ActionNode> {
        let mut current = self.root;
        let mut row = row.to_vec();
        loop {
            match self.node(current)? {
                Node::Action(leaf) => return Some(leaf),
                Node::Decision(decision) => {
                    let (child, next) = decision.route(&row)?;
                    current = child;
                    row = next;
                }
            }
        }
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of action leaves
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// Edges on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        let mut max_depth = 0;
        // Children always follow their parent, so one forward pass suffices
        for index in self.root.0..self.nodes.len() {
            let depth = depths[index];
            max_depth = max_depth.max(depth);
            for child in self.nodes[index].children() {
                depths[child.0] = depth + 1;
            }
        }
        max_depth
    }

    /// Summary statistics
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            node_count: self.node_count(),
            decision_count: self.node_count() - self.leaf_count(),
            leaf_count: self.leaf_count(),
            depth: self.depth(),
        }
    }

    /// Decision node at the root, if the tree split at all
    pub fn root_decision(&self) -> Option<&DecisionNode> {
        match self.root_node()? {
            Node::Decision(decision) => Some(decision),
            Node::Action(_) => None,
        }
    }
}

/// Tree statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    /// Total nodes
    pub node_count: usize,
    /// Interior nodes
    pub decision_count: usize,
    /// Action leaves
    pub leaf_count: usize,
    /// Longest root-to-leaf path in edges
    pub depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;

    fn leaf(action: State) -> Node {
        Node::Action(ActionNode::new(vec![action], vec![1]).unwrap())
    }

    /// Root splits column 0 on {0, 1}; branch 1 splits again on {5}
    fn two_level() -> DecisionTree {
        let nodes = vec![
            Node::Decision(DecisionNode {
                states: vec![0, 1],
                column: 0,
                children: vec![NodeId(1), NodeId(2)],
            }),
            leaf(100),
            Node::Decision(DecisionNode {
                states: vec![5],
                column: 0,
                children: vec![NodeId(3)],
            }),
            leaf(200),
        ];
        DecisionTree::from_nodes(nodes, NodeId(0)).unwrap()
    }

    #[test]
    fn test_eval_follows_branches() {
        let tree = two_level();
        let mut rng = Rng::default();
        assert_eq!(tree.eval(&[0, 9], &mut rng), Some(100));
        assert_eq!(tree.eval(&[1, 5], &mut rng), Some(200));
    }

    #[test]
    fn test_eval_no_action() {
        let tree = two_level();
        let mut rng = Rng::default();
        assert_eq!(tree.eval(&[2, 5], &mut rng), None);
        assert_eq!(tree.eval(&[1, 6], &mut rng), None);
        // Second split needs a value the row no longer has
        assert_eq!(tree.eval(&[1], &mut rng), None);
        assert_eq!(tree.eval(&[], &mut rng), None);
    }

    #[test]
    fn test_stats() {
        let stats = two_level().stats();
        assert_eq!(
            stats,
            TreeStats {
                node_count: 4,
                decision_count: 2,
                leaf_count: 2,
                depth: 2,
            }
        );

        let single = DecisionTree::leaf(ActionNode::new(vec![1], vec![1]).unwrap());
        assert_eq!(single.depth(), 0);
        assert_eq!(single.leaf_count(), 1);
        assert!(single.root_decision().is_none());
    }

    #[test]
    fn test_from_nodes_rejects_bad_links() {
        // Child pointing back at its parent
        let cyclic = vec![Node::Decision(DecisionNode {
            states: vec![0],
            column: 0,
            children: vec![NodeId(0)],
        })];
        assert!(DecisionTree::from_nodes(cyclic, NodeId(0)).is_none());

        // Dangling child
        let dangling = vec![Node::Decision(DecisionNode {
            states: vec![0],
            column: 0,
            children: vec![NodeId(4)],
        })];
        assert!(DecisionTree::from_nodes(dangling, NodeId(0)).is_none());

        // Misaligned states and children
        let misaligned = vec![
            Node::Decision(DecisionNode {
                states: vec![0, 1],
                column: 0,
                children: vec![NodeId(1)],
            }),
            leaf(1),
        ];
        assert!(DecisionTree::from_nodes(misaligned, NodeId(0)).is_none());

        assert!(DecisionTree::from_nodes(Vec::new(), NodeId(0)).is_none());
    }

    #[test]
    fn test_breadth_first_renumbering() {
        // Pre-order layout of the two-level tree: 0 -> (1, 2), 1 -> (3)
        let nodes = vec![
            Node::Decision(DecisionNode {
                states: vec![1, 0],
                column: 0,
                children: vec![NodeId(1), NodeId(3)],
            }),
            Node::Decision(DecisionNode {
                states: vec![5],
                column: 0,
                children: vec![NodeId(2)],
            }),
            leaf(200),
            leaf(100),
        ];
        let tree = DecisionTree::from_nodes(nodes, NodeId(0))
            .unwrap()
            .into_breadth_first();

        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.root_decision().unwrap().children(), &[NodeId(1), NodeId(2)]);
        assert_eq!(tree.node(NodeId(1)).unwrap().children(), &[NodeId(3)]);
        assert_eq!(tree.eval(&[1, 5], &mut Rng::default()), Some(200));
        assert_eq!(tree.clone().into_breadth_first(), tree);
    }

    #[test]
    fn test_json_round_trip() {
        let tree = two_level();
        let json = serde_json::to_string(&tree).unwrap();
        assert_eq!(serde_json::from_str::<DecisionTree>(&json).unwrap(), tree);
    }

    #[test]
    fn test_json_rejects_unsound_links() {
        let dangling = r#"{"nodes":[{"Decision":{"states":[0],"column":0,"children":[7]}}],"root":0}"#;
        assert!(serde_json::from_str::<DecisionTree>(dangling).is_err());

        let backward = r#"{"nodes":[{"Decision":{"states":[0],"column":0,"children":[0]}}],"root":0}"#;
        assert!(serde_json::from_str::<DecisionTree>(backward).is_err());

        let misaligned = r#"{"nodes":[{"Decision":{"states":[0,1],"column":0,"children":[1]}},{"Action":{"actions":[1],"weights":[1]}}],"root":0}"#;
        assert!(serde_json::from_str::<DecisionTree>(misaligned).is_err());

        let bad_root = r#"{"nodes":[{"Action":{"actions":[1],"weights":[1]}}],"root":3}"#;
        assert!(serde_json::from_str::<DecisionTree>(bad_root).is_err());

        let leaf = r#"{"nodes":[{"Action":{"actions":[1],"weights":[1]}}],"root":0}"#;
        let tree: DecisionTree = serde_json::from_str(leaf).unwrap();
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_leaf_for() {
        let tree = two_level();
        assert_eq!(tree.leaf_for(&[0, 0]).map(|l| l.actions().to_vec()), Some(vec![100]));
        assert!(tree.leaf_for(&[3, 0]).is_none());
    }
}
