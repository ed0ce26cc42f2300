// Tracker settings. Deserialized from the `tracker` section of settings.json;
// every field falls back to its default when absent.

use linestat_diff::DEFAULT_MAX_CELLS;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerSettings {
    /// Widen the reconciliation window across neighbouring blank pages so
    /// blank-line churn doesn't make hunks flap between positions.
    #[serde(default = "default_skip_blank_lines")]
    pub skip_blank_lines: bool,
    /// Page size, in lines, for the blank-line widening.
    #[serde(default = "default_blank_page_lines")]
    pub blank_page_lines: usize,
    /// Largest LCS table the default diff will build before giving up.
    #[serde(default = "default_max_diff_cells")]
    pub max_diff_cells: usize,
    /// Map lines inside uneven hunks to the nearest base line instead of
    /// reporting no mapping.
    #[serde(default)]
    pub approximate_transfer: bool,
}

fn default_skip_blank_lines() -> bool {
    true
}

fn default_blank_page_lines() -> usize {
    8
}

fn default_max_diff_cells() -> usize {
    DEFAULT_MAX_CELLS
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            skip_blank_lines: default_skip_blank_lines(),
            blank_page_lines: default_blank_page_lines(),
            max_diff_cells: default_max_diff_cells(),
            approximate_transfer: false,
        }
    }
}
