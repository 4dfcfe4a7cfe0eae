//! Error types for training, evaluation plumbing and persistence
//!
//! Nothing here is fatal to the process. The worst outcome of any failure
//! is "no decision produced": the previous tree stays in place and
//! evaluation keeps answering from it.
//!
//! ## Categories
//!
//! - **Schema**: `Table` errors bubbling up from the data layer
//! - **Training not possible**: `InsufficientSchema`, `IncompleteTree`
//! - **Concurrency misuse**: `AlreadyTraining`, `NotTraining`
//! - **Worker failure**: `WorkerPanicked`
//! - **Persistence**: `Codec`, `Io`, `Config`

use ldtree_core::{CodecError, TableError};
use thiserror_no_std::Error;

/// Result type for learning operations
pub type MLResult<T> = Result<T, MLError>;

/// Errors raised by the learning layer
#[derive(Error, Debug)]
pub enum MLError {
    /// Training needs at least one feature column and the action column
    #[error("Insufficient schema: need at least 2 columns, have {columns}")]
    InsufficientSchema {
        /// Columns declared in the table
        columns: usize,
    },

    /// A construction slot was never resolved to a decision or action node
    #[error("Tree construction stopped with unresolved table nodes")]
    IncompleteTree,

    /// A background training run is already in flight
    #[error("Training already in progress")]
    AlreadyTraining,

    /// No background training run to poll
    #[error("No training in progress")]
    NotTraining,

    /// The background worker panicked before publishing a tree
    #[error("Training worker panicked")]
    WorkerPanicked,

    /// Schema error from the table layer
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Malformed persisted data
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// File or thread I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}
