//! ID3 tree construction
//!
//! ## Overview
//!
//! Training works on a builder arena whose slots start out as *pending*
//! tables. A FIFO queue holds the slots still to be expanded; expanding a
//! slot overwrites it in place with either a decision node (whose children
//! are new pending slots pushed onto the queue) or an action leaf.
//!
//! ```text
//! slot 0: Pending(full table)            queue: [0]
//!   expand 0 -> Decision(col a)          queue: [1, 2]
//! slot 1: Pending(a = 0)   slot 2: Pending(a = 1)
//!   expand 1 -> Action                   queue: [2]
//!   expand 2 -> Action                   queue: []
//! ```
//!
//! Once the queue drains, every slot is converted into a finished [`Node`].
//! A slot still pending at that point is a construction bug and surfaces as
//! [`MLError::IncompleteTree`] rather than a tree that cannot be evaluated.
//!
//! ## Split Selection
//!
//! The column with the strictly greatest positive information gain wins,
//! first column on ties. When no column has a positive gain, the first
//! feature column that still splits the rows into two or more groups is
//! used instead: parity-like targets such as XOR show zero gain on every
//! single column yet become pure one level down. A column with a single
//! state is never split on, so contradictory rows end in a mixed leaf.
//!
//! Every split drops its column from the child tables, so construction
//! finishes within `feature_count` levels.

use std::collections::VecDeque;

use ldtree_core::Table;
use log::{debug, trace};

use crate::entropy::{best_info_gain_column, column_entropy};
use crate::node::{ActionNode, DecisionNode, Node, NodeId};
use crate::tree::DecisionTree;
use crate::{MLError, MLResult};

/// Builder arena slot
#[derive(Debug)]
enum Slot {
    /// Table waiting to be expanded
    Pending(Table),
    /// Placeholder while a slot's table is being expanded
    Expanding,
    Decision(DecisionNode),
    Action(ActionNode),
}

/// In-progress tree
#[derive(Debug)]
struct TreeBuilder {
    slots: Vec<Slot>,
    queue: VecDeque<NodeId>,
}

impl TreeBuilder {
    fn new(table: Table) -> Self {
        let mut builder = Self {
            slots: Vec::new(),
            queue: VecDeque::new(),
        };
        let root = builder.push(table);
        debug_assert_eq!(root, NodeId(0));
        builder
    }

    /// Add a pending slot and schedule it
    fn push(&mut self, table: Table) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot::Pending(table));
        self.queue.push_back(id);
        id
    }

    /// Expand queued slots until none remain
    fn run(&mut self) -> MLResult<()> {
        while let Some(id) = self.queue.pop_front() {
            self.expand(id)?;
        }
        Ok(())
    }

    /// Replace a pending slot with its decision node or leaf
    fn expand(&mut self, id: NodeId) -> MLResult<()> {
        let Some(slot) = self.slots.get_mut(id.0) else {
            return Err(MLError::IncompleteTree);
        };
        let table = match std::mem::replace(slot, Slot::Expanding) {
            Slot::Pending(table) => table,
            other => {
                *slot = other;
                return Ok(());
            }
        };

        let resolved = self.resolve(id, &table)?;
        self.slots[id.0] = resolved;
        Ok(())
    }

    fn resolve(&mut self, id: NodeId, table: &Table) -> MLResult<Slot> {
        let Some(action) = table.action_column() else {
            return Ok(Slot::Action(leaf_from(table)));
        };

        let entropy = column_entropy(table, action);
        if entropy == 0.0 || table.feature_count() == 0 {
            trace!(
                "Node {}: leaf (entropy {:.4}, {} features left)",
                id.0,
                entropy,
                table.feature_count()
            );
            return Ok(Slot::Action(leaf_from(table)));
        }

        let Some(column) = select_split_column(table) else {
            trace!("Node {}: no column separates the rows, leaf", id.0);
            return Ok(Slot::Action(leaf_from(table)));
        };

        let states = table.column_states(column);
        trace!(
            "Node {}: split on '{}' into {} branches",
            id.0,
            table.column_name(column).unwrap_or("?"),
            states.len()
        );

        let mut children = Vec::with_capacity(states.len());
        for &state in &states {
            let subset = table.filter_by_state(column, state)?;
            children.push(self.push(subset));
        }

        Ok(Slot::Decision(DecisionNode {
            states,
            column,
            children,
        }))
    }

    /// Convert every slot into a finished node
    fn finish(self) -> MLResult<DecisionTree> {
        let nodes = self
            .slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Decision(decision) => Ok(Node::Decision(decision)),
                Slot::Action(leaf) => Ok(Node::Action(leaf)),
                Slot::Pending(_) | Slot::Expanding => Err(MLError::IncompleteTree),
            })
            .collect::<MLResult<Vec<_>>>()?;

        DecisionTree::from_nodes(nodes, NodeId(0)).ok_or(MLError::IncompleteTree)
    }
}

/// Leaf listing the action column's states and their sample counts
fn leaf_from(table: &Table) -> ActionNode {
    let Some(action) = table.action_column() else {
        return ActionNode {
            actions: Vec::new(),
            weights: Vec::new(),
        };
    };
    let actions = table.column_states(action);
    let weights = actions
        .iter()
        .map(|&state| table.state_count(action, state))
        .collect();
    ActionNode { actions, weights }
}

/// Column to split `table` on, if any
///
/// Best positive information gain first, otherwise the first feature column
/// with two or more states.
pub fn select_split_column(table: &Table) -> Option<usize> {
    best_info_gain_column(table)
        .or_else(|| (0..table.feature_count()).find(|&column| table.number_of_states(column) > 1))
}

/// Train a decision tree on `table`
///
/// The table needs at least one feature column plus the action column.
/// Training reads `table` only; callers keep their existing tree when this
/// fails.
pub fn train(table: &Table) -> MLResult<DecisionTree> {
    let columns = table.column_count();
    if columns < 2 {
        return Err(MLError::InsufficientSchema { columns });
    }

    let mut builder = TreeBuilder::new(table.clone());
    builder.run()?;
    let tree = builder.finish()?;

    let stats = tree.stats();
    debug!(
        "Trained tree on {} samples ({} unique): {} nodes, {} leaves, depth {}",
        table.total_row_count(),
        table.table_row_count(),
        stats.node_count,
        stats.leaf_count,
        stats.depth
    );
    Ok(tree)
}
