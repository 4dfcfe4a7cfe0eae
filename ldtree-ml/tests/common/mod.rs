//! Shared fixtures for LDTree integration tests
//!
//! This module provides:
//! - Canonical tables (XOR, contradictory rows, guard behaviour)
//! - A `RandomSource` backed by a seeded `rand::rngs::StdRng`
//! - Helpers for building tables from literal rows

#![allow(dead_code)]

use ldtree_ml::{RandomSource, State, Table};
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng};

/// Seed shared by every statistical test
pub const TEST_SEED: u64 = 0x1D7E_E5EE;

/// `RandomSource` over the standard library-quality `StdRng`
pub struct StdSource(pub StdRng);

impl StdSource {
    /// Seeded source
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for StdSource {
    fn next_below(&mut self, bound: u32) -> u32 {
        self.0.gen_range(0..bound.max(1))
    }
}

/// Build a table from column names and literal rows
pub fn table_of(names: &[&str], rows: &[&[State]]) -> Table {
    let mut table = Table::with_columns(names.iter().copied()).expect("distinct column names");
    for row in rows {
        table.add_row(row).expect("row matches schema");
    }
    table
}

/// A, B -> A xor B
pub fn xor_table() -> Table {
    table_of(
        &["a", "b", "action"],
        &[&[0, 0, 0], &[0, 1, 1], &[1, 0, 1], &[1, 1, 0]],
    )
}

/// Same feature state, different actions, nothing left to split on
pub fn contradictory_table() -> Table {
    table_of(&["x", "action"], &[&[0, 0], &[0, 1]])
}

/// Guard agent: health (0 low, 1 high) and enemy distance (0 near, 1 mid, 2 far)
///
/// Action 0 flee, 1 attack, 2 patrol. Far enemies always mean patrol; near
/// enemies depend on health; mid-range with high health is a 3:1 mix of
/// attack and patrol.
pub fn guard_table() -> Table {
    let mut table = Table::with_columns(["health", "distance", "action"]).expect("distinct");
    let observations: [([State; 3], u32); 7] = [
        ([0, 0, 0], 4),
        ([1, 0, 1], 5),
        ([0, 1, 0], 2),
        ([1, 1, 1], 6),
        ([1, 1, 2], 2),
        ([0, 2, 2], 3),
        ([1, 2, 2], 3),
    ];
    for (row, times) in observations {
        for _ in 0..times {
            table.add_row(&row).expect("row matches schema");
        }
    }
    table
}
