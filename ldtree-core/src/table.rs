//! Frequency-Compressed Categorical Table
//!
//! ## Overview
//!
//! `Table` is the training set of a decision tree. It is column oriented:
//! every column is a named sequence of integer-coded states with one entry
//! per *physical* row, and the last declared column is always the action
//! (label) column the tree learns to predict.
//!
//! ## Duplicate Compaction
//!
//! Game-style data collection produces the same situation over and over.
//! Rather than storing each sample, the table stores each distinct row once
//! and counts how often it was seen:
//!
//! ```text
//! add_row([1, 0, 2])          physical rows        duplicates
//! add_row([0, 0, 1])   ──→    [1, 0, 2]            3
//! add_row([1, 0, 2])          [0, 0, 1]            1
//! add_row([1, 0, 2])
//!                             total_row_count = 4
//! ```
//!
//! Every statistic the learner needs (state counts, probabilities, entropy)
//! is *frequency weighted*: a physical row contributes its duplicate count,
//! never just 1.
//!
//! ## Invariants
//!
//! - every column holds exactly `table_row_count()` values
//! - `duplicates().len() == table_row_count()`
//! - `total_row_count() == duplicates().iter().sum()`
//! - every duplicate count is at least 1
//! - no two physical rows are equal across all columns after `add_row`,
//!   `refresh_table`, `remove_column` or `filter_by_state`
//!
//! Decoding (binary or serde) rejects data that breaks any of these.
//!
//! ## Cost Model
//!
//! Duplicate detection compares the new row against every physical row,
//! O(rows × columns) per insertion. Compaction keeps the physical row count
//! small for the intended data (a few categorical features with a bounded
//! number of states), so a linear scan beats maintaining a hash index.
//!
//! ## Thread Safety
//!
//! `Table` is plain data (`Send + Sync`). It has no interior locking; a
//! background trainer works on a clone, never on the live table.

use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::codec::{ByteReader, ByteWriter};
use crate::errors::{CodecError, CodecResult, TableError, TableResult};
use crate::limit::{EvictionPolicy, RowLimit};
use crate::State;

/// A named column of integer-coded states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: Vec<State>,
}

impl Column {
    fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            values: Vec::new(),
        }
    }

    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One state per physical row
    pub fn values(&self) -> &[State] {
        &self.values
    }
}

/// Column-oriented dataset with automatic duplicate-row compaction
///
/// ## Example
///
/// ```rust
/// use ldtree_core::Table;
///
/// let mut table = Table::with_columns(["A", "B", "Action"]).unwrap();
/// table.add_row(&[0, 1, 1]).unwrap();
/// table.add_row(&[0, 1, 1]).unwrap();
/// table.add_row(&[1, 1, 0]).unwrap();
///
/// assert_eq!(table.table_row_count(), 2);
/// assert_eq!(table.total_row_count(), 3);
/// assert_eq!(table.state_count(2, 1), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TableParts")]
pub struct Table {
    /// Columns in declaration order; the last one is the action column
    columns: Vec<Column>,
    /// Duplicate count for each physical row
    duplicates: Vec<u32>,
    /// Logical sample count (sum of `duplicates`)
    total_rows: u32,
    /// Optional cap on physical rows
    #[serde(skip)]
    row_limit: Option<RowLimit>,
}

/// Unchecked serde form of [`Table`]
#[derive(Deserialize)]
struct TableParts {
    columns: Vec<Column>,
    duplicates: Vec<u32>,
    total_rows: u32,
}

impl TryFrom<TableParts> for Table {
    type Error = CodecError;

    fn try_from(parts: TableParts) -> CodecResult<Self> {
        Table::from_parts(parts.columns, parts.duplicates, parts.total_rows)
    }
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with a physical row cap
    pub fn with_row_limit(limit: RowLimit) -> Self {
        Self {
            row_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Create a table and declare its columns in order
    pub fn with_columns<I, S>(names: I) -> TableResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for name in names {
            table.add_column(name.as_ref())?;
        }
        Ok(table)
    }

    /// Current row cap, if any
    pub fn row_limit(&self) -> Option<RowLimit> {
        self.row_limit
    }

    /// Set or clear the row cap
    ///
    /// Tightening the cap does not evict existing rows; it only affects
    /// later insertions.
    pub fn set_row_limit(&mut self, limit: Option<RowLimit>) {
        self.row_limit = limit;
    }

    // ===== Shape =====

    /// Number of declared columns (features plus action)
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of feature columns (all but the last)
    pub fn feature_count(&self) -> usize {
        self.columns.len().saturating_sub(1)
    }

    /// Index of the action column, `None` for a table without columns
    pub fn action_column(&self) -> Option<usize> {
        self.columns.len().checked_sub(1)
    }

    /// Number of physical (distinct) rows
    pub fn table_row_count(&self) -> usize {
        self.duplicates.len()
    }

    /// Number of logical rows, counting duplicates
    pub fn total_row_count(&self) -> u32 {
        self.total_rows
    }

    /// Duplicate count of a physical row
    pub fn duplicate_count(&self, row: usize) -> Option<u32> {
        self.duplicates.get(row).copied()
    }

    /// Duplicate counts of all physical rows
    pub fn duplicates(&self) -> &[u32] {
        &self.duplicates
    }

    /// All columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column by index
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Name of the column at `index`
    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(Column::name)
    }

    /// Index of the column called `name`
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Copy of a physical row across all columns
    pub fn row(&self, index: usize) -> Option<Vec<State>> {
        if index >= self.table_row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[index]).collect())
    }

    // ===== Mutation =====

    /// Declare a new column at the end of the column order
    ///
    /// The new column becomes the action column. If physical rows already
    /// exist they read state 0 in the new column.
    pub fn add_column(&mut self, name: &str) -> TableResult<()> {
        if self.column_index(name).is_some() {
            log_warn!("Column '{}' already exists", name);
            return Err(TableError::DuplicateColumn);
        }

        let mut column = Column::new(name);
        column.values.resize(self.table_row_count(), 0);
        self.columns.push(column);
        Ok(())
    }

    /// Add one observed sample
    ///
    /// `values` holds one state per column, action last. A row equal to an
    /// existing physical row only increments that row's duplicate count.
    /// A new physical row is subject to the row cap.
    pub fn add_row(&mut self, values: &[State]) -> TableResult<()> {
        let expected = self.column_count();
        if expected == 0 || values.len() != expected {
            log_warn!(
                "Rejected row with {} values for a table with {} columns",
                values.len(),
                expected
            );
            return Err(TableError::RowLength {
                expected,
                actual: values.len(),
            });
        }

        if let Some(existing) = self.find_row(values) {
            self.duplicates[existing] = self.duplicates[existing].saturating_add(1);
            self.total_rows = self.total_rows.saturating_add(1);
            return Ok(());
        }

        if let Some(limit) = self.row_limit {
            if limit.is_full(self.table_row_count()) {
                match limit.policy {
                    EvictionPolicy::Reject => {
                        log_warn!("Row limit {} reached, row rejected", limit.max_rows);
                        return Err(TableError::RowLimitReached {
                            max_rows: limit.max_rows,
                        });
                    }
                    EvictionPolicy::EvictOldest => {
                        while limit.is_full(self.table_row_count()) {
                            self.remove_row(0)?;
                        }
                        log_debug!("Row limit {} reached, evicted oldest row", limit.max_rows);
                    }
                }
            }
        }

        for (column, &value) in self.columns.iter_mut().zip(values) {
            column.values.push(value);
        }
        self.duplicates.push(1);
        self.total_rows = self.total_rows.saturating_add(1);
        Ok(())
    }

    /// Remove a physical row together with all of its duplicates
    pub fn remove_row(&mut self, index: usize) -> TableResult<()> {
        let rows = self.table_row_count();
        if index >= rows {
            return Err(TableError::RowIndexOutOfRange { index, rows });
        }

        self.total_rows = self.total_rows.saturating_sub(self.duplicates[index]);
        self.remove_physical_row(index);
        Ok(())
    }

    /// Remove a column by name, then merge rows that became identical
    pub fn remove_column(&mut self, name: &str) -> TableResult<()> {
        match self.column_index(name) {
            Some(index) => self.remove_column_at(index),
            None => {
                log_warn!("Cannot remove unknown column '{}'", name);
                Err(TableError::UnknownColumn)
            }
        }
    }

    /// Remove a column by index, then merge rows that became identical
    pub fn remove_column_at(&mut self, index: usize) -> TableResult<()> {
        let columns = self.column_count();
        if index >= columns {
            return Err(TableError::ColumnIndexOutOfRange { index, columns });
        }

        self.columns.remove(index);
        self.refresh_table();
        Ok(())
    }

    /// Merge physical rows that are equal across all columns
    ///
    /// Duplicate counts of merged rows are summed into the first occurrence,
    /// so `total_row_count()` is unchanged.
    pub fn refresh_table(&mut self) {
        let mut selected = 0;
        while selected < self.table_row_count() {
            let mut candidate = selected + 1;
            while candidate < self.table_row_count() {
                if self.rows_equal(selected, candidate) {
                    self.duplicates[selected] =
                        self.duplicates[selected].saturating_add(self.duplicates[candidate]);
                    self.remove_physical_row(candidate);
                } else {
                    candidate += 1;
                }
            }
            selected += 1;
        }
    }

    // ===== Statistics =====

    /// Distinct states of a column in first-seen order
    ///
    /// Empty for an out-of-range column.
    pub fn column_states(&self, column: usize) -> Vec<State> {
        let mut states = Vec::new();
        if let Some(column) = self.columns.get(column) {
            for &state in &column.values {
                if !states.contains(&state) {
                    states.push(state);
                }
            }
        }
        states
    }

    /// Distinct states of a named column in first-seen order
    pub fn column_states_by_name(&self, name: &str) -> Vec<State> {
        self.column_index(name)
            .map(|index| self.column_states(index))
            .unwrap_or_default()
    }

    /// Number of distinct states in a column
    pub fn number_of_states(&self, column: usize) -> usize {
        self.column_states(column).len()
    }

    /// Frequency-weighted count of rows where `column == state`
    pub fn state_count(&self, column: usize, state: State) -> u32 {
        let Some(column) = self.columns.get(column) else {
            return 0;
        };
        column
            .values
            .iter()
            .zip(&self.duplicates)
            .filter(|&(&value, _)| value == state)
            .fold(0u32, |acc, (_, &dups)| acc.saturating_add(dups))
    }

    /// Frequency-weighted count of rows where the named column equals `state`
    pub fn state_count_by_name(&self, name: &str, state: State) -> u32 {
        self.column_index(name)
            .map(|index| self.state_count(index, state))
            .unwrap_or(0)
    }

    /// Probability of `state` in `column`; 0 for an empty table
    pub fn individual_state_probability(&self, column: usize, state: State) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        self.state_count(column, state) as f64 / self.total_rows as f64
    }

    /// Probability of `state` in the named column; 0 for an empty table
    pub fn individual_state_probability_by_name(&self, name: &str, state: State) -> f64 {
        self.column_index(name)
            .map(|index| self.individual_state_probability(index, state))
            .unwrap_or(0.0)
    }

    // ===== Splitting =====

    /// Rows where `column == state`, with `column` itself removed
    ///
    /// The result is a new, compacted table: once every row shares the same
    /// state in `column`, the column carries no information, and dropping it
    /// can make rows identical, so they are merged. The row cap is not
    /// carried over.
    pub fn filter_by_state(&self, column: usize, state: State) -> TableResult<Table> {
        let columns = self.column_count();
        if column >= columns {
            return Err(TableError::ColumnIndexOutOfRange {
                index: column,
                columns,
            });
        }

        let keep: Vec<usize> = self.columns[column]
            .values
            .iter()
            .enumerate()
            .filter(|&(_, &value)| value == state)
            .map(|(row, _)| row)
            .collect();

        let mut filtered = Table::new();
        for (index, source) in self.columns.iter().enumerate() {
            if index == column {
                continue;
            }
            filtered.columns.push(Column {
                name: source.name.clone(),
                values: keep.iter().map(|&row| source.values[row]).collect(),
            });
        }
        filtered.duplicates = keep.iter().map(|&row| self.duplicates[row]).collect();
        filtered.total_rows = filtered
            .duplicates
            .iter()
            .fold(0u32, |acc, &dups| acc.saturating_add(dups));
        filtered.refresh_table();

        Ok(filtered)
    }

    /// Rows where the named column equals `state`, with that column removed
    pub fn filter_by_state_named(&self, name: &str, state: State) -> TableResult<Table> {
        match self.column_index(name) {
            Some(index) => self.filter_by_state(index, state),
            None => {
                log_warn!("Cannot filter on unknown column '{}'", name);
                Err(TableError::UnknownColumn)
            }
        }
    }

    /// Log the header and every physical row at debug level
    pub fn debug_table(&self) {
        #[cfg(feature = "log")]
        {
            use core::fmt::Write;

            let mut header = String::new();
            for column in &self.columns {
                let _ = write!(header, "{} ", column.name);
            }
            log::debug!("{}dups", header);

            for row in 0..self.table_row_count() {
                let mut line = String::new();
                for column in &self.columns {
                    let _ = write!(line, "{} : {}|", column.name, column.values[row]);
                }
                log::debug!("{} x{}", line, self.duplicates[row]);
            }
        }
    }

    // ===== Persistence =====

    /// Append the binary form of this table
    ///
    /// ```text
    /// u32       total row count
    /// u32       column name count, then each name as a string
    /// u32       column count, then per column: name, [i32] values
    /// [u32]     duplicate counts
    /// ```
    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.total_rows);

        writer.write_len(self.columns.len());
        for column in &self.columns {
            writer.write_str(&column.name);
        }

        writer.write_len(self.columns.len());
        for column in &self.columns {
            writer.write_str(&column.name);
            writer.write_i32_slice(&column.values);
        }

        writer.write_u32_slice(&self.duplicates);
    }

    /// Binary form of this table as a fresh buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.encode(&mut writer);
        writer.into_bytes()
    }

    /// Read a table written by [`Table::encode`]
    ///
    /// The decoded table is checked against the structural invariants; a
    /// table that would violate them is rejected rather than repaired.
    pub fn decode(reader: &mut ByteReader<'_>) -> CodecResult<Table> {
        let total_rows = reader.read_u32()?;

        let name_count = reader.read_len(4)?;
        let mut names: Vec<String> = Vec::with_capacity(name_count);
        for _ in 0..name_count {
            names.push(reader.read_string()?);
        }

        let data_count = reader.read_len(8)?;
        if data_count != name_count {
            return Err(CodecError::Inconsistent {
                reason: "column data count differs from column name count",
            });
        }
        let mut data: Vec<(String, Vec<State>)> = Vec::with_capacity(data_count);
        for _ in 0..data_count {
            let name = reader.read_string()?;
            let values = reader.read_i32_vec()?;
            data.push((name, values));
        }

        let duplicates = reader.read_u32_vec()?;

        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let position = data
                .iter()
                .position(|(data_name, _)| *data_name == name)
                .ok_or(CodecError::Inconsistent {
                    reason: "column data missing for declared column",
                })?;
            let (name, values) = data.swap_remove(position);
            columns.push(Column { name, values });
        }

        Self::from_parts(columns, duplicates, total_rows)
    }

    /// Assemble a table from raw parts, enforcing every structural invariant
    ///
    /// Shared by the binary decoder and serde deserialization. Rejects
    /// repeated column names, ragged columns, zero duplicate counts, a total
    /// that differs from the duplicate sum and physical rows that repeat.
    fn from_parts(
        columns: Vec<Column>,
        duplicates: Vec<u32>,
        total_rows: u32,
    ) -> CodecResult<Table> {
        for (index, column) in columns.iter().enumerate() {
            if columns[..index].iter().any(|earlier| earlier.name == column.name) {
                return Err(CodecError::Inconsistent {
                    reason: "duplicate column name",
                });
            }
            if column.values.len() != duplicates.len() {
                return Err(CodecError::Inconsistent {
                    reason: "column length differs from row count",
                });
            }
        }

        if duplicates.contains(&0) {
            return Err(CodecError::Inconsistent {
                reason: "physical row with zero duplicate count",
            });
        }
        let sum: u64 = duplicates.iter().map(|&d| d as u64).sum();
        if sum != total_rows as u64 {
            return Err(CodecError::Inconsistent {
                reason: "total row count differs from duplicate sum",
            });
        }

        let table = Table {
            columns,
            duplicates,
            total_rows,
            row_limit: None,
        };
        for a in 0..table.table_row_count() {
            if (a + 1..table.table_row_count()).any(|b| table.rows_equal(a, b)) {
                return Err(CodecError::Inconsistent {
                    reason: "repeated physical row",
                });
            }
        }
        Ok(table)
    }

    /// Decode a table from a complete buffer
    pub fn from_bytes(bytes: &[u8]) -> CodecResult<Table> {
        let mut reader = ByteReader::new(bytes);
        Self::decode(&mut reader)
    }

    // ===== Internals =====

    fn find_row(&self, values: &[State]) -> Option<usize> {
        (0..self.table_row_count()).find(|&row| {
            self.columns
                .iter()
                .zip(values)
                .all(|(column, &value)| column.values[row] == value)
        })
    }

    fn rows_equal(&self, a: usize, b: usize) -> bool {
        self.columns
            .iter()
            .all(|column| column.values[a] == column.values[b])
    }

    /// Drop a physical row without touching `total_rows`
    fn remove_physical_row(&mut self, index: usize) {
        for column in &mut self.columns {
            column.values.remove(index);
        }
        self.duplicates.remove(index);
    }
}
