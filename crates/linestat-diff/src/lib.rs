// linestat-diff: line diff primitive and the hunk builder on top of it.

mod lcs;

use linestat_core::{Range, RangeType};
use thiserror::Error;

pub use lcs::{LcsDiff, DEFAULT_MAX_CELLS};

/// One contiguous difference block. `deleted` lines start at `base_start`,
/// `inserted` lines at `current_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hunk {
    pub base_start: usize,
    pub current_start: usize,
    pub deleted: usize,
    pub inserted: usize,
}

impl Hunk {
    pub(crate) fn empty_at(base_start: usize, current_start: usize) -> Self {
        Self {
            base_start,
            current_start,
            deleted: 0,
            inserted: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum DiffError {
    /// The primitive refuses to diff this input.
    #[error("diff input too large: {cells} cells exceeds limit of {limit}")]
    TooLarge { cells: usize, limit: usize },

    /// The primitive produced a hunk that changes nothing.
    #[error("hunk {index} has neither inserted nor deleted lines")]
    EmptyHunk { index: usize },
}

// ──────────────────────────────────────────────
// Trait: LineDiff
// ──────────────────────────────────────────────

/// A deterministic line diff. Hunks come back ordered and non-overlapping.
pub trait LineDiff: Send + Sync {
    fn diff_lines(&self, base: &[String], current: &[String]) -> Result<Vec<Hunk>, DiffError>;
}

// ──────────────────────────────────────────────
// Hunk builder
// ──────────────────────────────────────────────

/// Diff `current` against `base` and turn every hunk into a [`Range`].
/// The offsets place a windowed diff back at absolute line numbers.
pub fn compute_ranges(
    diff: &dyn LineDiff,
    current: &[String],
    base: &[String],
    current_offset: usize,
    base_offset: usize,
) -> Result<Vec<Range>, DiffError> {
    let hunks = diff.diff_lines(base, current)?;
    let mut ranges = Vec::with_capacity(hunks.len());

    for (index, hunk) in hunks.iter().enumerate() {
        let kind = RangeType::classify(hunk.inserted, hunk.deleted)
            .ok_or(DiffError::EmptyHunk { index })?;
        let line1 = current_offset + hunk.current_start;
        let base_line1 = base_offset + hunk.base_start;
        ranges.push(Range::new(
            line1,
            line1 + hunk.inserted,
            base_line1,
            base_line1 + hunk.deleted,
            kind,
        ));
    }

    log::trace!(
        "built {} ranges over {} current / {} base lines",
        ranges.len(),
        current.len(),
        base.len()
    );
    Ok(ranges)
}
