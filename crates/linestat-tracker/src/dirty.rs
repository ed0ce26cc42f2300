// Dirty window: the not-yet-reconciled span of edits.

/// Lines `[line1, line2)` are in the coordinates the document had before the
/// first edit of the batch. After the batch the same region spans
/// `[line1, line2 + shift)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRange {
    pub line1: usize,
    pub line2: usize,
    pub shift: isize,
    pub before_total_lines: usize,
}

impl DirtyRange {
    pub fn new(line1: usize, line2: usize, shift: isize, before_total_lines: usize) -> Self {
        Self {
            line1,
            line2,
            shift,
            before_total_lines,
        }
    }

    /// Fold in another edit touching `[line1, line2)` in current coordinates.
    pub fn widen(self, line1: usize, line2: usize, shift: isize) -> Self {
        let new_line1 = self.line1.min(line1);
        let new_line2 = (self.line2 as isize)
            .max(line2 as isize - self.shift)
            .max(new_line1 as isize) as usize;
        Self {
            line1: new_line1,
            line2: new_line2,
            shift: self.shift + shift,
            before_total_lines: self.before_total_lines,
        }
    }

    /// End of the window after the batch.
    pub fn current_line2(&self) -> usize {
        (self.line2 as isize + self.shift).max(self.line1 as isize) as usize
    }
}
