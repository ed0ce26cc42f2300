// Line diff over a longest-common-subsequence table.

use crate::{DiffError, Hunk, LineDiff};

/// Default cap on LCS table cells, roughly a 4000x4000 changed block.
pub const DEFAULT_MAX_CELLS: usize = 16_000_000;

/// A single step of the edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiffOp {
    /// Line exists in both base and current (unchanged).
    Equal,
    /// Line exists only in current (added).
    Insert,
    /// Line exists only in base (deleted).
    Delete,
}

/// LCS table diff with common prefix/suffix stripping. Refuses inputs whose
/// table would exceed `max_cells`.
#[derive(Debug, Clone)]
pub struct LcsDiff {
    pub max_cells: usize,
}

impl Default for LcsDiff {
    fn default() -> Self {
        Self {
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

impl LcsDiff {
    pub fn new(max_cells: usize) -> Self {
        Self { max_cells }
    }
}

impl LineDiff for LcsDiff {
    fn diff_lines(&self, base: &[String], current: &[String]) -> Result<Vec<Hunk>, DiffError> {
        let prefix = base
            .iter()
            .zip(current)
            .take_while(|(a, b)| a == b)
            .count();
        let max_suffix = base.len().min(current.len()) - prefix;
        let suffix = base[prefix..]
            .iter()
            .rev()
            .zip(current[prefix..].iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        let base_mid = &base[prefix..base.len() - suffix];
        let current_mid = &current[prefix..current.len() - suffix];

        if base_mid.is_empty() && current_mid.is_empty() {
            return Ok(Vec::new());
        }
        if base_mid.is_empty() || current_mid.is_empty() {
            return Ok(vec![Hunk {
                base_start: prefix,
                current_start: prefix,
                deleted: base_mid.len(),
                inserted: current_mid.len(),
            }]);
        }

        let cells = (base_mid.len() + 1).saturating_mul(current_mid.len() + 1);
        if cells > self.max_cells {
            return Err(DiffError::TooLarge {
                cells,
                limit: self.max_cells,
            });
        }

        let ops = compute_ops(base_mid, current_mid);
        Ok(group_hunks(&ops, prefix))
    }
}

/// Compute the edit script turning `base` into `current`.
///
/// `common[i * w + j]` holds the LCS length of `base[i..]` and `current[j..]`,
/// so the script can be read off front to back.
fn compute_ops(base: &[String], current: &[String]) -> Vec<DiffOp> {
    let (n, m) = (base.len(), current.len());
    let w = m + 1;
    let mut common = vec![0u32; (n + 1) * w];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            common[i * w + j] = if base[i] == current[j] {
                common[(i + 1) * w + j + 1] + 1
            } else {
                common[(i + 1) * w + j].max(common[i * w + j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n || j < m {
        if i < n && j < m && base[i] == current[j] {
            ops.push(DiffOp::Equal);
            i += 1;
            j += 1;
        } else if i < n && (j == m || common[(i + 1) * w + j] >= common[i * w + j + 1]) {
            // deletions first within a hunk
            ops.push(DiffOp::Delete);
            i += 1;
        } else {
            ops.push(DiffOp::Insert);
            j += 1;
        }
    }
    ops
}

/// Fold runs of non-equal ops into hunks. `offset` is the stripped prefix.
fn group_hunks(ops: &[DiffOp], offset: usize) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut base_pos = offset;
    let mut current_pos = offset;
    let mut pending: Option<Hunk> = None;

    for op in ops {
        match op {
            DiffOp::Equal => {
                if let Some(h) = pending.take() {
                    hunks.push(h);
                }
                base_pos += 1;
                current_pos += 1;
            }
            DiffOp::Insert => {
                pending
                    .get_or_insert(Hunk::empty_at(base_pos, current_pos))
                    .inserted += 1;
                current_pos += 1;
            }
            DiffOp::Delete => {
                pending
                    .get_or_insert(Hunk::empty_at(base_pos, current_pos))
                    .deleted += 1;
                base_pos += 1;
            }
        }
    }
    if let Some(h) = pending {
        hunks.push(h);
    }
    hunks
}
