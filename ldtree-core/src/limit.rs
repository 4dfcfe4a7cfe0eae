//! Physical row cap for long-running data collection
//!
//! A table that keeps learning from live play grows by one physical row for
//! every previously unseen situation. `RowLimit` bounds that growth. Only new
//! physical rows count against the limit: a row that duplicates an existing
//! one just bumps its duplicate count and is always accepted.

use serde::{Deserialize, Serialize};

/// What to do when a new physical row would exceed the cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Drop the oldest physical row (with all of its duplicates) to make room
    #[default]
    EvictOldest,
    /// Refuse the new row and leave the table unchanged
    Reject,
}

/// Maximum number of distinct physical rows a table may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLimit {
    /// Maximum physical row count (values below 1 are treated as 1)
    pub max_rows: usize,
    /// Behaviour once the cap is met
    #[serde(default)]
    pub policy: EvictionPolicy,
}

impl RowLimit {
    /// Cap with the default eviction policy
    pub fn new(max_rows: usize) -> Self {
        Self {
            max_rows: max_rows.max(1),
            policy: EvictionPolicy::default(),
        }
    }

    /// Cap that rejects rows once full
    pub fn rejecting(max_rows: usize) -> Self {
        Self {
            max_rows: max_rows.max(1),
            policy: EvictionPolicy::Reject,
        }
    }

    /// Whether a table holding `rows` physical rows is at the cap
    pub fn is_full(&self, rows: usize) -> bool {
        rows >= self.max_rows.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_evicts() {
        let limit = RowLimit::new(4);
        assert_eq!(limit.policy, EvictionPolicy::EvictOldest);
        assert!(!limit.is_full(3));
        assert!(limit.is_full(4));
    }

    #[test]
    fn test_zero_cap_is_one() {
        let limit = RowLimit::rejecting(0);
        assert_eq!(limit.max_rows, 1);
        assert!(!limit.is_full(0));
        assert!(limit.is_full(1));
    }
}
