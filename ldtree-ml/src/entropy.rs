//! Shannon entropy and information gain over compacted tables
//!
//! Every quantity here is frequency-weighted: a physical row with a
//! duplicate count of 5 contributes 5 samples, exactly as if it had been
//! stored five times. Counting physical rows instead would bias every split
//! toward whatever happened to be recorded as distinct rows.
//!
//! ## Definitions
//!
//! ```text
//! H(X)       = -Σ p(x) · log2 p(x)              (0 · log2 0 := 0)
//! Gain(T, A) = H(action) - Σ P(A = s) · H(action | A = s)
//! ```

use ldtree_core::{State, Table};

/// Entropy (bits) of a discrete distribution given as per-state counts
///
/// Returns 0 for an empty distribution. Zero counts are skipped.
pub fn weighted_entropy(counts: &[u32], total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let mut entropy = 0.0;
    for &count in counts {
        if count == 0 {
            continue;
        }
        let p = count as f64 / total;
        entropy -= p * libm::log2(p);
    }
    entropy
}

/// Entropy of one column, weighted by duplicate counts
///
/// Exactly 0 when the column holds a single state. Out-of-range columns and
/// empty tables also yield 0.
pub fn column_entropy(table: &Table, column: usize) -> f64 {
    let mut entropy = 0.0;
    for state in table.column_states(column) {
        let p = table.individual_state_probability(column, state);
        if p > 0.0 {
            entropy -= p * libm::log2(p);
        }
    }
    entropy
}

/// Action-column entropy restricted to rows where `column == state`
///
/// Returns the entropy together with the subset's logical row count.
fn conditional_entropy(
    table: &Table,
    column: usize,
    state: State,
    action: usize,
    action_states: &[State],
) -> (f64, u32) {
    let (Some(feature), Some(actions)) = (table.column(column), table.column(action)) else {
        return (0.0, 0);
    };

    let mut counts = vec![0u32; action_states.len()];
    let mut subset_total = 0u32;
    let rows = feature
        .values()
        .iter()
        .zip(actions.values())
        .zip(table.duplicates());
    for ((&value, &action_value), &weight) in rows {
        if value != state {
            continue;
        }
        subset_total = subset_total.saturating_add(weight);
        if let Some(slot) = action_states.iter().position(|&s| s == action_value) {
            counts[slot] = counts[slot].saturating_add(weight);
        }
    }

    (weighted_entropy(&counts, subset_total), subset_total)
}

/// Information gain of splitting on `column`
///
/// Returns 0 when the table has no action column, is empty, or `column` is
/// out of range.
pub fn info_gain(table: &Table, column: usize) -> f64 {
    let Some(action) = table.action_column() else {
        return 0.0;
    };
    let total = table.total_row_count();
    if total == 0 || column >= table.column_count() {
        return 0.0;
    }

    let action_states = table.column_states(action);
    let mut gain = column_entropy(table, action);
    for state in table.column_states(column) {
        let (entropy, subset_total) =
            conditional_entropy(table, column, state, action, &action_states);
        gain -= (subset_total as f64 / total as f64) * entropy;
    }
    gain
}

/// Feature column with the strictly greatest positive information gain
///
/// Scans feature columns in declaration order. Ties keep the first column
/// seen. `None` when no column has a gain above zero.
pub fn best_info_gain_column(table: &Table) -> Option<usize> {
    let mut best_gain = 0.0;
    let mut best = None;
    for column in 0..table.feature_count() {
        let gain = info_gain(table, column);
        if gain > best_gain {
            best_gain = gain;
            best = Some(column);
        }
    }
    best
}
