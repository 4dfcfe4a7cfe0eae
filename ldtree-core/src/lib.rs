//! Core data model for LDTree
//!
//! Holds categorical training data for ID3 decision trees in a compact,
//! frequency-weighted form. Identical rows are never stored twice: the table
//! keeps one physical row and a duplicate count, so a history of thousands
//! of observed situations usually fits in a handful of rows.
//!
//! Key constraints:
//! - The last declared column is always the action (label) column
//! - Every column has one entry per physical row
//! - `total_row_count()` is the sum of all duplicate counts
//!
//! ```
//! use ldtree_core::Table;
//!
//! let mut table = Table::new();
//! table.add_column("enemy_near").unwrap();
//! table.add_column("action").unwrap();
//!
//! table.add_row(&[1, 5]).unwrap();
//! table.add_row(&[1, 5]).unwrap();
//!
//! assert_eq!(table.table_row_count(), 1);
//! assert_eq!(table.total_row_count(), 2);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

// Macros for optional logging
#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

pub mod codec;
pub mod errors;
pub mod limit;
pub mod table;

// Public API
pub use codec::{ByteReader, ByteWriter};
pub use errors::{CodecError, CodecResult, TableError, TableResult};
pub use limit::{EvictionPolicy, RowLimit};
pub use table::{Column, Table};

/// Integer-coded categorical value stored in a column.
pub type State = i32;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
