//! Learning tree configuration
//!
//! ```json
//! { "seed": 7, "row_limit": { "max_rows": 500, "policy": "reject" } }
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use std::path::Path;

use ldtree_core::RowLimit;
use serde::{Deserialize, Serialize};

use crate::MLResult;

/// Configuration for a [`LearningTree`](crate::LearningTree)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Seed for leaf sampling
    pub seed: u32,
    /// Cap on physical rows in the training table
    pub row_limit: Option<RowLimit>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            row_limit: None,
        }
    }
}

impl TreeConfig {
    /// Parse from JSON text
    pub fn from_json_str(json: &str) -> MLResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> MLResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Same configuration with a row cap
    pub fn with_row_limit(mut self, limit: RowLimit) -> Self {
        self.row_limit = Some(limit);
        self
    }
}
