use std::path::Path;

// ──────────────────────────────────────────────
// Identity
// ──────────────────────────────────────────────

/// Stable identity of an installed range. Assigned by the tracker, never reused
/// within one tracker's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RangeId(pub u64);

impl RangeId {
    /// Ranges fresh out of the hunk builder carry this until installed.
    pub const UNASSIGNED: Self = Self(0);

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

/// Opaque handle to a marker owned by the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

// ──────────────────────────────────────────────
// Range
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeType {
    Inserted,
    Deleted,
    Modified,
}

impl RangeType {
    /// Classify a hunk by its side lengths. `None` for an empty hunk.
    pub fn classify(inserted: usize, deleted: usize) -> Option<Self> {
        match (inserted > 0, deleted > 0) {
            (true, true) => Some(RangeType::Modified),
            (true, false) => Some(RangeType::Inserted),
            (false, true) => Some(RangeType::Deleted),
            (false, false) => None,
        }
    }
}

/// One change hunk: `[line1, line2)` in the current document against
/// `[base_line1, base_line2)` in the base revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub id: RangeId,
    pub line1: usize,
    pub line2: usize,
    pub base_line1: usize,
    pub base_line2: usize,
    pub kind: RangeType,
}

impl Range {
    pub fn new(line1: usize, line2: usize, base_line1: usize, base_line2: usize, kind: RangeType) -> Self {
        Self {
            id: RangeId::UNASSIGNED,
            line1,
            line2,
            base_line1,
            base_line2,
            kind,
        }
    }

    pub fn with_id(mut self, id: RangeId) -> Self {
        self.id = id;
        self
    }

    pub fn current_len(&self) -> usize {
        self.line2 - self.line1
    }

    pub fn base_len(&self) -> usize {
        self.base_line2 - self.base_line1
    }

    /// Interval invariants hold and the kind agrees with the side lengths.
    pub fn is_valid(&self) -> bool {
        self.line2 >= self.line1
            && self.base_line2 >= self.base_line1
            && RangeType::classify(self.current_len(), self.base_len()) == Some(self.kind)
    }

    /// Translate the current-side interval. The base interval never moves.
    pub fn shift(&mut self, delta: isize) {
        debug_assert!(self.line1 as isize + delta >= 0, "range shifted above line 0");
        self.line1 = self.line1.saturating_add_signed(delta);
        self.line2 = self.line2.saturating_add_signed(delta);
    }

    pub fn can_be_merged_with(&self, other: &Range) -> bool {
        self.line2 == other.line1
    }

    /// Span both ranges. Mixed kinds widen to `Modified`.
    pub fn merge_with(&self, other: &Range) -> Range {
        let kind = if self.kind == other.kind {
            self.kind
        } else {
            RangeType::Modified
        };
        Range::new(
            self.line1.min(other.line1),
            self.line2.max(other.line2),
            self.base_line1.min(other.base_line1),
            self.base_line2.max(other.base_line2),
            kind,
        )
    }

    /// A deleted range sits on the boundary before `line1`, so it is found
    /// from its anchor line.
    pub fn contains_line(&self, line: usize) -> bool {
        if self.line1 == self.line2 {
            return line == self.line1;
        }
        self.line1 <= line && line < self.line2
    }

    /// The range lies strictly below `line`.
    pub fn is_after(&self, line: usize) -> bool {
        self.line1 > line
    }

    /// The range lies strictly above `line`.
    pub fn is_before(&self, line: usize) -> bool {
        self.line2 <= line && !self.contains_line(line)
    }

    /// Same intervals and kind, ignoring identity.
    pub fn same_span(&self, other: &Range) -> bool {
        self.line1 == other.line1
            && self.line2 == other.line2
            && self.base_line1 == other.base_line1
            && self.base_line2 == other.base_line2
            && self.kind == other.kind
    }

    /// Overlap with `[line1, line2)`, counting a deleted range as covering
    /// its anchor line.
    pub fn intersects(&self, line1: usize, line2: usize) -> bool {
        if self.line1 == self.line2 {
            return line1 <= self.line1 && self.line1 < line2.max(line1 + 1);
        }
        self.line1 < line2 && line1 < self.line2
    }
}

/// Whole-list comparison that ignores identity.
pub fn same_spans(a: &[Range], b: &[Range]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_span(y))
}

// ──────────────────────────────────────────────
// Summary
// ──────────────────────────────────────────────

/// Aggregate line counts for a status display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub changed_ranges: usize,
    pub added_lines: usize,
    pub removed_lines: usize,
}

impl ChangeSummary {
    pub fn from_ranges(ranges: &[Range]) -> Self {
        ranges.iter().fold(Self::default(), |mut acc, r| {
            acc.changed_ranges += 1;
            acc.added_lines += r.current_len();
            acc.removed_lines += r.base_len();
            acc
        })
    }
}

// ──────────────────────────────────────────────
// Trait: RangeRenderer
// ──────────────────────────────────────────────

/// The rendering collaborator. Markers are created and disposed exactly once
/// per installed range; the tracker keeps the handles in its own side table.
pub trait RangeRenderer: Send + Sync {
    fn create_marker(&self, range: &Range) -> MarkerHandle;
    fn dispose_marker(&self, handle: MarkerHandle);
    /// Fired once per list change, after markers are settled.
    fn ranges_replaced(&self, _removed: &[RangeId], _added: &[RangeId]) {}
    /// Tracking was switched off (or back on) because the diff was infeasible.
    fn tracking_suppressed(&self, _suppressed: bool) {}
}

/// Renderer that draws nothing.
pub struct NoopRenderer;

impl RangeRenderer for NoopRenderer {
    fn create_marker(&self, range: &Range) -> MarkerHandle {
        MarkerHandle(range.id.0)
    }

    fn dispose_marker(&self, _handle: MarkerHandle) {}
}

// ──────────────────────────────────────────────
// Trait: DirtyNotifier
// ──────────────────────────────────────────────

/// VCS status collaborator, told when a tracked file stops differing from its
/// base revision.
pub trait DirtyNotifier: Send + Sync {
    fn file_dirty(&self, path: &Path);
}

pub struct NoopNotifier;

impl DirtyNotifier for NoopNotifier {
    fn file_dirty(&self, _path: &Path) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deleted_at(line: usize) -> Range {
        Range::new(line, line, 1, 2, RangeType::Deleted)
    }

    #[test]
    fn deleted_range_contains_its_anchor_line() {
        let r = deleted_at(1);
        assert!(r.contains_line(1));
        assert!(!r.contains_line(0));
        assert!(!r.contains_line(2));
    }

    #[test]
    fn modified_range_is_half_open() {
        let r = Range::new(2, 4, 2, 3, RangeType::Modified);
        assert!(!r.contains_line(1));
        assert!(r.contains_line(2));
        assert!(r.contains_line(3));
        assert!(!r.contains_line(4));
    }

    #[test]
    fn is_after_excludes_containing_range() {
        let r = Range::new(3, 5, 3, 3, RangeType::Inserted);
        assert!(r.is_after(2));
        assert!(!r.is_after(3));
        assert!(deleted_at(4).is_after(3));
        assert!(!deleted_at(4).is_after(4));
    }

    #[test]
    fn is_before_excludes_deleted_anchor() {
        let r = Range::new(1, 3, 1, 2, RangeType::Modified);
        assert!(r.is_before(3));
        assert!(!r.is_before(2));
        assert!(deleted_at(2).is_before(3));
        assert!(!deleted_at(3).is_before(3));
    }

    #[test]
    fn shift_moves_current_side_only() {
        let mut r = Range::new(3, 5, 7, 8, RangeType::Modified);
        r.shift(2);
        assert_eq!((r.line1, r.line2, r.base_line1, r.base_line2), (5, 7, 7, 8));
        r.shift(-5);
        assert_eq!((r.line1, r.line2), (0, 2));
    }

    #[test]
    fn merge_widens_mixed_kinds_to_modified() {
        let a = Range::new(1, 2, 1, 1, RangeType::Inserted);
        let b = Range::new(2, 2, 1, 3, RangeType::Deleted);
        assert!(a.can_be_merged_with(&b));
        let m = a.merge_with(&b);
        assert_eq!(m.kind, RangeType::Modified);
        assert_eq!((m.line1, m.line2, m.base_line1, m.base_line2), (1, 2, 1, 3));
    }

    #[test]
    fn merge_keeps_common_kind() {
        let a = Range::new(1, 2, 1, 1, RangeType::Inserted);
        let b = Range::new(2, 4, 1, 1, RangeType::Inserted);
        assert_eq!(a.merge_with(&b).kind, RangeType::Inserted);
        assert!(!b.can_be_merged_with(&a));
    }

    #[test]
    fn classify_rejects_empty_hunk() {
        assert_eq!(RangeType::classify(0, 0), None);
        assert_eq!(RangeType::classify(2, 0), Some(RangeType::Inserted));
        assert_eq!(RangeType::classify(0, 1), Some(RangeType::Deleted));
        assert_eq!(RangeType::classify(1, 1), Some(RangeType::Modified));
    }

    #[test]
    fn validity_checks_kind_against_lengths() {
        assert!(Range::new(1, 2, 1, 2, RangeType::Modified).is_valid());
        assert!(!Range::new(1, 2, 1, 1, RangeType::Modified).is_valid());
        assert!(!Range::new(1, 1, 1, 1, RangeType::Deleted).is_valid());
    }

    #[test]
    fn intersects_counts_deleted_anchor() {
        let r = deleted_at(3);
        assert!(r.intersects(3, 4));
        assert!(r.intersects(3, 3));
        assert!(!r.intersects(4, 6));
        let m = Range::new(2, 4, 2, 4, RangeType::Modified);
        assert!(m.intersects(3, 10));
        assert!(!m.intersects(4, 10));
    }

    #[test]
    fn summary_counts_both_sides() {
        let ranges = vec![
            Range::new(0, 2, 0, 1, RangeType::Modified),
            Range::new(5, 5, 4, 7, RangeType::Deleted),
        ];
        let s = ChangeSummary::from_ranges(&ranges);
        assert_eq!(s, ChangeSummary { changed_ranges: 2, added_lines: 2, removed_lines: 4 });
    }

    #[test]
    fn same_span_ignores_id() {
        let a = Range::new(1, 2, 1, 2, RangeType::Modified).with_id(RangeId(4));
        let b = Range::new(1, 2, 1, 2, RangeType::Modified).with_id(RangeId(9));
        assert!(a.same_span(&b));
        assert_ne!(a, b);
        assert!(same_spans(&[a], &[b]));
    }
}
