//! Host-facing learning tree
//!
//! `LearningTree` bundles a training table, the current decision tree, the
//! feature vector used by the next evaluation and an optional background
//! training run. It is the object a game or simulation owns: rows are
//! recorded as the agent acts, a tree is (re)trained from time to time and
//! `eval` answers "what would we usually do here?".
//!
//! ## Threading
//!
//! `LearningTree` itself is single-owner. Evaluation and mutation both take
//! `&mut self` and nothing inside synchronizes them; wrap the whole value in
//! a lock if several threads must share it. Background
//! training runs on its own thread over a snapshot of the table, and its
//! result is only applied from [`poll_training`](LearningTree::poll_training)
//! or [`wait_for_training`](LearningTree::wait_for_training).

use std::path::{Path, PathBuf};

use ldtree_core::{ByteReader, ByteWriter, CodecError, State, Table};
use log::{debug, info, warn};

use crate::config::TreeConfig;
use crate::coordinator::TrainingJob;
use crate::persist::{decode_tree, encode_tree};
use crate::rng::Rng;
use crate::tree::{DecisionTree, TreeStats};
use crate::{trainer, MLError, MLResult, NO_ACTION};

/// Extension of saved tables
pub const TABLE_EXTENSION: &str = "dat";
/// Extension of saved trees
pub const TREE_EXTENSION: &str = "tree";

/// Table, tree and training state owned by one agent
#[derive(Debug)]
pub struct LearningTree {
    config: TreeConfig,
    table: Table,
    tree: Option<DecisionTree>,
    states: Vec<State>,
    rng: Rng,
    training: Option<TrainingJob>,
}

impl Default for LearningTree {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

impl LearningTree {
    /// Create an empty learning tree
    pub fn new(config: TreeConfig) -> Self {
        let mut table = Table::new();
        table.set_row_limit(config.row_limit);
        Self {
            rng: Rng::new(config.seed),
            config,
            table,
            tree: None,
            states: Vec::new(),
            training: None,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Training table
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Current tree, if one has been trained or loaded
    pub fn tree(&self) -> Option<&DecisionTree> {
        self.tree.as_ref()
    }

    /// Feature values used by the next [`eval`](Self::eval)
    pub fn states(&self) -> &[State] {
        &self.states
    }

    // ===== Table =====

    /// Declare a column (the newest column is the action column)
    pub fn add_column(&mut self, name: &str) -> MLResult<()> {
        Ok(self.table.add_column(name)?)
    }

    /// Record a row; the last value is the action taken
    pub fn add_row(&mut self, values: &[State]) -> MLResult<()> {
        Ok(self.table.add_row(values)?)
    }

    /// Remove a physical row and all of its duplicates
    pub fn remove_row(&mut self, index: usize) -> MLResult<()> {
        Ok(self.table.remove_row(index)?)
    }

    /// Remove a column by name
    pub fn remove_column(&mut self, name: &str) -> MLResult<()> {
        Ok(self.table.remove_column(name)?)
    }

    /// Remove a column by index
    pub fn remove_column_at(&mut self, index: usize) -> MLResult<()> {
        Ok(self.table.remove_column_at(index)?)
    }

    /// Declared columns
    pub fn column_count(&self) -> usize {
        self.table.column_count()
    }

    /// Distinct physical rows
    pub fn table_row_count(&self) -> usize {
        self.table.table_row_count()
    }

    /// Logical samples
    pub fn total_row_count(&self) -> u32 {
        self.table.total_row_count()
    }

    /// Log the table at debug level
    pub fn debug_table(&self) {
        self.table.debug_table();
    }

    // ===== Evaluation =====

    /// Set the feature values for the next evaluation
    pub fn refresh_states(&mut self, states: &[State]) {
        self.states.clear();
        self.states.extend_from_slice(states);
    }

    /// Pick an action for the current feature values
    ///
    /// `None` when no tree is loaded or the tree has no branch for the
    /// current values.
    pub fn eval(&mut self) -> Option<State> {
        let Some(tree) = self.tree.as_ref() else {
            debug!("Eval called before any tree was trained");
            return None;
        };
        tree.eval(&self.states, &mut self.rng)
    }

    /// [`eval`](Self::eval) with [`NO_ACTION`] in place of `None`
    pub fn eval_action_id(&mut self) -> State {
        self.eval().unwrap_or(NO_ACTION)
    }

    // ===== Training =====

    /// Train on the current table in the calling thread
    ///
    /// On failure the previous tree is kept.
    pub fn create_decision_tree(&mut self) -> MLResult<TreeStats> {
        let tree = trainer::train(&self.table)?;
        Ok(self.install(tree))
    }

    /// Start training on a snapshot of the current table
    ///
    /// Returns immediately. Only one run may be in flight; a second request
    /// is rejected rather than queued.
    pub fn train_async(&mut self) -> MLResult<()> {
        if self.training.is_some() {
            warn!("Training already in progress; request ignored");
            return Err(MLError::AlreadyTraining);
        }
        self.training = Some(TrainingJob::spawn(self.table.clone())?);
        Ok(())
    }

    /// Whether a background run has been started and not yet applied
    ///
    /// Stays true after the worker finishes: completion is applied only by
    /// [`poll_training`](Self::poll_training) or
    /// [`wait_for_training`](Self::wait_for_training). Use
    /// [`is_result_ready`](Self::is_result_ready) to learn that a poll will
    /// not block.
    pub fn is_training(&self) -> bool {
        self.training.is_some()
    }

    /// Whether the background worker has stopped and its result is waiting
    ///
    /// False when no run is in flight.
    pub fn is_result_ready(&self) -> bool {
        self.training.as_ref().is_some_and(TrainingJob::is_finished)
    }

    /// Apply the background result if it is ready
    ///
    /// `WouldBlock` while the worker runs. On success the new tree replaces
    /// the old one in a single assignment. On failure the old tree is kept
    /// and the training slot is freed either way.
    pub fn poll_training(&mut self) -> nb::Result<TreeStats, MLError> {
        let Some(job) = self.training.as_mut() else {
            return Err(nb::Error::Other(MLError::NotTraining));
        };
        let tree = match job.poll() {
            Err(nb::Error::WouldBlock) => return Err(nb::Error::WouldBlock),
            Err(nb::Error::Other(err)) => {
                self.training = None;
                return Err(nb::Error::Other(err));
            }
            Ok(tree) => tree,
        };
        self.training = None;
        Ok(self.install(tree))
    }

    /// Block until the background run finishes and apply its result
    pub fn wait_for_training(&mut self) -> MLResult<TreeStats> {
        let job = self.training.take().ok_or(MLError::NotTraining)?;
        let tree = job.wait()?;
        Ok(self.install(tree))
    }

    fn install(&mut self, tree: DecisionTree) -> TreeStats {
        let stats = tree.stats();
        info!(
            "Installed tree: {} nodes, {} leaves, depth {}",
            stats.node_count, stats.leaf_count, stats.depth
        );
        self.tree = Some(tree);
        stats
    }

    // ===== Persistence =====

    /// Write the table to `<folder>/<name>.dat`
    pub fn save_table(&self, folder: impl AsRef<Path>, name: &str) -> MLResult<PathBuf> {
        let path = file_path(folder.as_ref(), name, TABLE_EXTENSION);
        std::fs::write(&path, self.table.to_bytes())?;
        debug!("Saved table to {}", path.display());
        Ok(path)
    }

    /// Replace the table with `<folder>/<name>.dat`
    ///
    /// The configured row limit applies to the loaded table. On failure the
    /// current table is kept.
    pub fn load_table(&mut self, folder: impl AsRef<Path>, name: &str) -> MLResult<()> {
        let path = file_path(folder.as_ref(), name, TABLE_EXTENSION);
        let bytes = std::fs::read(&path)?;
        let mut table = Table::from_bytes(&bytes)?;
        table.set_row_limit(self.config.row_limit);
        self.table = table;
        debug!(
            "Loaded table from {} ({} rows)",
            path.display(),
            self.table.table_row_count()
        );
        Ok(())
    }

    /// Write the current tree to `<folder>/<name>.tree`
    ///
    /// Without a tree an empty root container is written.
    pub fn save_decision_tree(&self, folder: impl AsRef<Path>, name: &str) -> MLResult<PathBuf> {
        let path = file_path(folder.as_ref(), name, TREE_EXTENSION);
        let mut writer = ByteWriter::new();
        encode_tree(self.tree.as_ref(), &mut writer);
        std::fs::write(&path, writer.into_bytes())?;
        debug!("Saved tree to {}", path.display());
        Ok(path)
    }

    /// Replace the tree with `<folder>/<name>.tree`
    ///
    /// An empty container clears the tree. On failure the current tree is
    /// kept.
    pub fn load_decision_tree(&mut self, folder: impl AsRef<Path>, name: &str) -> MLResult<()> {
        let path = file_path(folder.as_ref(), name, TREE_EXTENSION);
        let bytes = std::fs::read(&path)?;
        let mut reader = ByteReader::new(&bytes);
        let tree = decode_tree(&mut reader)?;
        if !reader.is_exhausted() {
            return Err(CodecError::Inconsistent {
                reason: "trailing bytes after tree",
            }
            .into());
        }
        self.tree = tree;
        debug!("Loaded tree from {}", path.display());
        Ok(())
    }
}

fn file_path(folder: &Path, name: &str, extension: &str) -> PathBuf {
    folder.join(format!("{}.{}", name, extension))
}
