//! Error Types for Table Maintenance and Persistence
//!
//! ## Design Philosophy
//!
//! Nothing in the table layer is fatal. Every failure is a *schema error*
//! reported back to the caller, and the table is left exactly as it was
//! before the call:
//!
//! 1. **Copy Semantics**: Errors are small `Copy` values so they can be
//!    returned from hot paths (row insertion runs once per observed sample)
//!    without allocation.
//!
//! 2. **No Names Inside**: Column names are not carried in the error. The
//!    offending name is logged at warn level where the error is raised, which
//!    keeps the enum allocation-free for `no_std` builds.
//!
//! 3. **Actionable Information**: Length and index errors carry the expected
//!    and actual values so the caller can fix the offending row.
//!
//! ## Error Categories
//!
//! ### Schema Errors (`TableError`)
//! - `DuplicateColumn`: a column with that name already exists
//! - `RowLength`: row width does not match the column count
//! - `RowIndexOutOfRange` / `ColumnIndexOutOfRange`: bad index
//! - `UnknownColumn`: no column with that name
//! - `RowLimitReached`: row cap met and the policy rejects new rows
//!
//! ### Persistence Errors (`CodecError`)
//! - `UnexpectedEof`: buffer ended inside a field
//! - `InvalidUtf8`: a column name is not valid UTF-8
//! - `InvalidNodeTag` / `TableNodeNotPersistable`: bad tree encoding
//! - `Inconsistent`: decoded data violates the table invariants
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use ldtree_core::{Table, TableError};
//!
//! let mut table = Table::new();
//! table.add_column("feature").unwrap();
//! table.add_column("action").unwrap();
//!
//! match table.add_row(&[1]) {
//!     Ok(()) => {}
//!     Err(TableError::RowLength { expected, actual }) => {
//!         assert_eq!((expected, actual), (2, 1));
//!     }
//!     Err(_) => unreachable!(),
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

/// Result type for binary encoding and decoding
pub type CodecResult<T> = Result<T, CodecError>;

/// Schema errors raised by [`Table`](crate::Table) operations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// A column with the requested name already exists
    #[error("Column already exists")]
    DuplicateColumn,

    /// No column with the requested name
    #[error("Unknown column")]
    UnknownColumn,

    /// Row width does not match the number of columns
    #[error("Row has {actual} values, table has {expected} columns")]
    RowLength {
        /// Number of columns in the table
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// Physical row index outside the table
    #[error("Row index {index} out of range (rows: {rows})")]
    RowIndexOutOfRange {
        /// Requested physical row
        index: usize,
        /// Current physical row count
        rows: usize,
    },

    /// Column index outside the table
    #[error("Column index {index} out of range (columns: {columns})")]
    ColumnIndexOutOfRange {
        /// Requested column
        index: usize,
        /// Current column count
        columns: usize,
    },

    /// The physical row cap is met and the policy rejects new rows
    #[error("Row limit of {max_rows} physical rows reached")]
    RowLimitReached {
        /// Configured maximum physical row count
        max_rows: usize,
    },
}

/// Errors raised while encoding or decoding persisted data
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended in the middle of a field
    #[error("Unexpected end of input: need {needed} bytes, have {available}")]
    UnexpectedEof {
        /// Bytes required by the field being read
        needed: usize,
        /// Bytes left in the input
        available: usize,
    },

    /// A persisted string is not valid UTF-8
    #[error("Invalid UTF-8 in persisted string")]
    InvalidUtf8,

    /// Node type tag outside the known range
    #[error("Invalid node tag {0}")]
    InvalidNodeTag(u8),

    /// Table nodes exist only during construction and are never persisted
    #[error("Table nodes cannot be persisted")]
    TableNodeNotPersistable,

    /// Decoded data violates a structural invariant
    #[error("Inconsistent data: {reason}")]
    Inconsistent {
        /// Which invariant failed
        reason: &'static str,
    },
}
