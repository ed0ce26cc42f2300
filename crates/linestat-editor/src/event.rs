// Edit notifications delivered to document listeners.

use crate::document::{Document, Position};

/// Identifies a registered listener so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// One text replacement. Byte offsets and lengths describe the change in the
/// pre-edit text; the positions give the same change in line coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditEvent {
    pub offset: usize,
    pub old_length: usize,
    pub new_length: usize,
    pub old_text: String,
    pub new_text: String,
    /// Start of the replaced region.
    pub start: Position,
    /// End of the replaced region before the edit.
    pub old_end: Position,
    /// End of the inserted text after the edit.
    pub new_end: Position,
}

impl EditEvent {
    /// Lines touched before the edit, `[start.line, old_end.line + 1)`.
    pub fn old_line_span(&self) -> (usize, usize) {
        (self.start.line, self.old_end.line + 1)
    }

    /// Net change in line count.
    pub fn line_delta(&self) -> isize {
        self.new_end.line as isize - self.old_end.line as isize
    }
}

/// Observer of document edits. Callbacks run on the editing thread and
/// receive the document itself, pre-edit in `before_change` and post-edit
/// afterwards.
pub trait DocumentListener: Send + Sync {
    fn before_change(&self, _event: &EditEvent, _doc: &Document) {}
    fn after_change(&self, _event: &EditEvent, _doc: &Document) {}
    /// The outermost transaction ended (or a bare edit completed).
    fn transaction_finished(&self, _doc: &Document) {}
}
