//! Learning Decision Trees for Game Agents
//!
//! ## Overview
//!
//! An agent records what it did in each situation as a row of categorical
//! states. This crate turns that history into an ID3 decision tree and asks
//! the tree what to do next. Leaves keep every action seen for their
//! situation together with its frequency, so evaluation reproduces the
//! agent's habits instead of always returning a single majority answer.
//!
//! ## Why ID3?
//!
//! 1. **Categorical by nature**: game state is mostly enums and small counts
//! 2. **No tuning**: no depth limits, learning rates or thresholds
//! 3. **Cheap to retrain**: small tables train in microseconds
//! 4. **Readable**: each decision node is one column and its observed states
//!
//! ## Pipeline
//!
//! ```text
//! add_row(...) ──► Table (compacted, weighted)
//!                    │
//!                    ├── create_decision_tree()   (caller thread)
//!                    └── train_async()            (worker thread, snapshot)
//!                    ▼
//!               DecisionTree (arena of Decision / Action nodes)
//!                    │
//! refresh_states() ──► eval() ──► weighted action sample
//! ```
//!
//! ## Training
//!
//! Splits maximize information gain over frequency-weighted counts. Each
//! split removes its column from the child tables, so the tree never gets
//! deeper than the number of feature columns. See [`trainer`] for the
//! construction loop and the zero-gain fallback.
//!
//! ## Evaluation Rows
//!
//! Rows passed to evaluation contain the feature columns in declaration
//! order and no action value. A decision node removes the column it read
//! before handing the row to its child, mirroring how training filtered the
//! table.
//!
//! ## Example
//!
//! ```
//! use ldtree_ml::{LearningTree, TreeConfig};
//!
//! let mut agent = LearningTree::new(TreeConfig::default());
//! agent.add_column("enemy_near").unwrap();
//! agent.add_column("action").unwrap();
//! agent.add_row(&[0, 1]).unwrap(); // calm: patrol
//! agent.add_row(&[1, 2]).unwrap(); // enemy: attack
//!
//! agent.create_decision_tree().unwrap();
//! agent.refresh_states(&[1]);
//! assert_eq!(agent.eval(), Some(2));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod coordinator;
pub mod entropy;
pub mod errors;
pub mod learning_tree;
pub mod node;
pub mod persist;
pub mod rng;
pub mod trainer;
pub mod tree;

// Public API
pub use config::TreeConfig;
pub use coordinator::TrainingJob;
pub use entropy::{best_info_gain_column, column_entropy, info_gain, weighted_entropy};
pub use errors::{MLError, MLResult};
pub use learning_tree::LearningTree;
pub use node::{ActionNode, DecisionNode, Node, NodeId};
pub use persist::{decode_tree, encode_tree};
pub use rng::{RandomSource, Rng};
pub use trainer::train;
pub use tree::{DecisionTree, TreeStats};

#[cfg(feature = "rand")]
pub use rng::RandSource;

pub use ldtree_core::{EvictionPolicy, RowLimit, State, Table};

/// Integer returned in place of an action when evaluation has no answer
pub const NO_ACTION: State = -1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_action_sentinel() {
        assert_eq!(NO_ACTION, -1);
        assert!(LearningTree::default().eval().is_none());
    }
}
