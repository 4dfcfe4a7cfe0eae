//! Decision and action nodes of a finished tree
//!
//! A finished tree only ever contains these two shapes. The "table node" of
//! the construction phase lives in the trainer's builder arena and has no
//! representation here, so a half-built tree cannot be evaluated by
//! accident.

use ldtree_core::{CodecError, State};
use serde::{Deserialize, Serialize};

use crate::rng::RandomSource;

/// Index of a node inside its tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena slot of this node
    pub fn index(self) -> usize {
        self.0
    }
}

/// Interior node that routes on one feature column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNode {
    /// Split states, aligned with `children`
    pub(crate) states: Vec<State>,
    /// Column of the incoming row to read
    pub(crate) column: usize,
    /// Child for each entry of `states`
    pub(crate) children: Vec<NodeId>,
}

impl DecisionNode {
    /// States this node routes on
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Column index read from the incoming row
    pub fn column(&self) -> usize {
        self.column
    }

    /// Children aligned with [`states`](Self::states)
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Pick the child for `row` and the row it should see
    ///
    /// The child was trained on a table without this node's column, so the
    /// value is removed and later columns shift left. `None` when the row is
    /// too short or its value matches no branch.
    pub fn route(&self, row: &[State]) -> Option<(NodeId, Vec<State>)> {
        let value = *row.get(self.column)?;
        let branch = self.states.iter().position(|&s| s == value)?;
        let child = *self.children.get(branch)?;

        let mut next = Vec::with_capacity(row.len() - 1);
        next.extend_from_slice(&row[..self.column]);
        next.extend_from_slice(&row[self.column + 1..]);
        Some((child, next))
    }
}

/// Leaf holding the observed actions and how often each was seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LeafParts")]
pub struct ActionNode {
    pub(crate) actions: Vec<State>,
    pub(crate) weights: Vec<u32>,
}

#[derive(Deserialize)]
struct LeafParts {
    actions: Vec<State>,
    weights: Vec<u32>,
}

impl TryFrom<LeafParts> for ActionNode {
    type Error = CodecError;

    fn try_from(parts: LeafParts) -> Result<Self, Self::Error> {
        Self::new(parts.actions, parts.weights).ok_or(CodecError::Inconsistent {
            reason: "leaf actions and weights differ in length",
        })
    }
}

impl ActionNode {
    /// Build a leaf from aligned action and weight lists
    ///
    /// Returns `None` when the lists differ in length.
    pub fn new(actions: Vec<State>, weights: Vec<u32>) -> Option<Self> {
        if actions.len() != weights.len() {
            return None;
        }
        Some(Self { actions, weights })
    }

    /// Actions this leaf may return
    pub fn actions(&self) -> &[State] {
        &self.actions
    }

    /// Sample count for each action
    pub fn weights(&self) -> &[u32] {
        &self.weights
    }

    /// Sum of all weights
    pub fn total_weight(&self) -> u64 {
        self.weights.iter().map(|&w| w as u64).sum()
    }

    /// Weighted random pick among the leaf's actions
    ///
    /// Draws `r` in `[0, total)` and returns the first action whose running
    /// weight exceeds `r`. A zero total falls back to the first action. An
    /// empty leaf yields `None`.
    pub fn sample<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Option<State> {
        let first = *self.actions.first()?;
        let total = self.total_weight();
        if total == 0 {
            return Some(first);
        }

        let draw = rng.next_below(u32::try_from(total).unwrap_or(u32::MAX)) as u64;
        let mut cumulative = 0u64;
        for (&action, &weight) in self.actions.iter().zip(&self.weights) {
            cumulative += weight as u64;
            if cumulative > draw {
                return Some(action);
            }
        }
        Some(first)
    }
}

/// Node of a finished tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// Routes on a feature column
    Decision(DecisionNode),
    /// Returns an action
    Action(ActionNode),
}

impl Node {
    /// Whether this node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Action(_))
    }

    /// Children of a decision node, empty for leaves
    pub fn children(&self) -> &[NodeId] {
        match self {
            Node::Decision(decision) => decision.children(),
            Node::Action(_) => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;

    /// Replays a fixed sequence of draws
    struct Scripted(Vec<u32>);

    impl RandomSource for Scripted {
        fn next_below(&mut self, bound: u32) -> u32 {
            let value = self.0.remove(0);
            assert!(value < bound);
            value
        }
    }

    #[test]
    fn test_route_removes_split_column() {
        let node = DecisionNode {
            states: vec![3, 7],
            column: 1,
            children: vec![NodeId(1), NodeId(2)],
        };

        let (child, row) = node.route(&[10, 7, 20, 30]).unwrap();
        assert_eq!(child, NodeId(2));
        assert_eq!(row, vec![10, 20, 30]);
    }

    #[test]
    fn test_route_failures() {
        let node = DecisionNode {
            states: vec![0],
            column: 2,
            children: vec![NodeId(1)],
        };
        // Too short
        assert_eq!(node.route(&[0, 0]), None);
        // No matching state
        assert_eq!(node.route(&[0, 0, 5]), None);
    }

    #[test]
    fn test_sample_walks_cumulative_weights() {
        let leaf = ActionNode::new(vec![10, 20, 30], vec![1, 2, 3]).unwrap();
        // Thresholds: 10 below 1, 20 below 3, 30 below 6
        let mut rng = Scripted(vec![0, 1, 2, 3, 5]);
        let picks: Vec<_> = (0..5).map(|_| leaf.sample(&mut rng).unwrap()).collect();
        assert_eq!(picks, vec![10, 20, 20, 30, 30]);
    }

    #[test]
    fn test_sample_degenerate_leaves() {
        let mut rng = Rng::new(1);
        let zero = ActionNode::new(vec![4, 5], vec![0, 0]).unwrap();
        assert_eq!(zero.sample(&mut rng), Some(4));

        let empty = ActionNode::new(Vec::new(), Vec::new()).unwrap();
        assert_eq!(empty.sample(&mut rng), None);

        assert!(ActionNode::new(vec![1], vec![]).is_none());
    }

    #[test]
    fn test_json_leaf_must_be_aligned() {
        assert!(serde_json::from_str::<ActionNode>(r#"{"actions":[1,2],"weights":[3]}"#).is_err());
        let leaf: ActionNode = serde_json::from_str(r#"{"actions":[1,2],"weights":[3,4]}"#).unwrap();
        assert_eq!(leaf.total_weight(), 7);
    }

    #[test]
    fn test_single_action_is_deterministic() {
        let leaf = ActionNode::new(vec![9], vec![17]).unwrap();
        let mut rng = Rng::new(5);
        for _ in 0..50 {
            assert_eq!(leaf.sample(&mut rng), Some(9));
        }
    }
}
