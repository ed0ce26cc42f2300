// Document: line-based text storage that reports every edit to its listeners.

use std::sync::Arc;

use thiserror::Error;

use crate::event::{DocumentListener, EditEvent, ListenerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("line {line} out of bounds (line count {line_count})")]
    LineOutOfBounds { line: usize, line_count: usize },

    #[error("column {col} is not a char boundary of line {line}")]
    ColumnOutOfBounds { line: usize, col: usize },

    #[error("offset {offset} out of bounds (length {len})")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("range start {start:?} is after end {end:?}")]
    InvalidRange { start: Position, end: Position },
}

/// Split text into lines on `\n`, normalizing `\r\n`. Always yields at least
/// one line, and a trailing newline yields a trailing empty line.
pub fn split_lines(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    normalized.split('\n').map(String::from).collect()
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "")
}

pub struct Document {
    lines: Vec<String>,
    generation: u64,
    transaction_depth: usize,
    listeners: Vec<(ListenerId, Arc<dyn DocumentListener>)>,
    next_listener: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::from_lines(vec![String::new()])
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_lines(split_lines(text))
    }

    fn from_lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            generation: 0,
            transaction_depth: 0,
            listeners: Vec::new(),
            next_listener: 1,
        }
    }

    // ── Read access ──

    pub fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(|s| s.as_str())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Total length in bytes, counting one byte per line separator.
    pub fn len(&self) -> usize {
        self.lines.iter().map(|l| l.len()).sum::<usize>() + self.lines.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Byte offset at which `line` starts.
    pub fn line_start_offset(&self, line: usize) -> Result<usize, EditError> {
        self.check_line(line)?;
        Ok(self.lines[..line].iter().map(|l| l.len() + 1).sum())
    }

    /// Line containing byte `offset`. A separator belongs to the line it ends.
    pub fn line_number(&self, offset: usize) -> Result<usize, EditError> {
        let len = self.len();
        if offset > len {
            return Err(EditError::OffsetOutOfBounds { offset, len });
        }
        let mut line_start = 0;
        for (i, line) in self.lines.iter().enumerate() {
            let line_end = line_start + line.len();
            if offset <= line_end {
                return Ok(i);
            }
            line_start = line_end + 1;
        }
        Ok(self.lines.len() - 1)
    }

    pub fn position_of(&self, offset: usize) -> Result<Position, EditError> {
        let line = self.line_number(offset)?;
        let col = offset - self.line_start_offset(line)?;
        let pos = Position::new(line, col);
        self.check_position(pos)?;
        Ok(pos)
    }

    pub fn offset_of(&self, pos: Position) -> Result<usize, EditError> {
        self.check_position(pos)?;
        Ok(self.line_start_offset(pos.line)? + pos.col)
    }

    /// Text between two positions, separators included.
    pub fn text_between(&self, start: Position, end: Position) -> Result<String, EditError> {
        self.check_span(start, end)?;
        if start.line == end.line {
            return Ok(self.lines[start.line][start.col..end.col].to_string());
        }
        let mut out = String::new();
        out.push_str(&self.lines[start.line][start.col..]);
        for line in &self.lines[start.line + 1..end.line] {
            out.push('\n');
            out.push_str(line);
        }
        out.push('\n');
        out.push_str(&self.lines[end.line][..end.col]);
        Ok(out)
    }

    // ── Listeners and transactions ──

    pub fn add_listener(&mut self, listener: Arc<dyn DocumentListener>) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns false if `id` was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn begin_transaction(&mut self) {
        self.transaction_depth += 1;
    }

    pub fn end_transaction(&mut self) {
        if self.transaction_depth == 0 {
            log::warn!("end_transaction without matching begin");
            return;
        }
        self.transaction_depth -= 1;
        if self.transaction_depth == 0 {
            self.notify_transaction_finished();
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction_depth > 0
    }

    /// Run `f` inside a transaction. Listeners see one `transaction_finished`
    /// once `f` returns.
    pub fn transaction<R>(&mut self, f: impl FnOnce(&mut Document) -> R) -> R {
        self.begin_transaction();
        let result = f(self);
        self.end_transaction();
        result
    }

    // ── Edits ──

    /// Replace the text between `start` and `end`, returning the end
    /// position of the inserted text.
    pub fn replace(&mut self, start: Position, end: Position, text: &str) -> Result<Position, EditError> {
        self.check_span(start, end)?;
        let new_text = normalize(text);
        let old_text = self.text_between(start, end)?;

        let pieces: Vec<&str> = new_text.split('\n').collect();
        let new_end = if pieces.len() == 1 {
            Position::new(start.line, start.col + pieces[0].len())
        } else {
            Position::new(start.line + pieces.len() - 1, pieces[pieces.len() - 1].len())
        };

        let event = EditEvent {
            offset: self.offset_of(start)?,
            old_length: old_text.len(),
            new_length: new_text.len(),
            old_text,
            new_text: new_text.clone(),
            start,
            old_end: end,
            new_end,
        };

        let listeners = self.listener_snapshot();
        for listener in &listeners {
            listener.before_change(&event, self);
        }

        let prefix = &self.lines[start.line][..start.col];
        let suffix = &self.lines[end.line][end.col..];
        let mut replacement: Vec<String> = pieces.iter().map(|p| p.to_string()).collect();
        replacement[0] = format!("{}{}", prefix, pieces[0]);
        if let Some(last) = replacement.last_mut() {
            last.push_str(suffix);
        }
        self.lines.splice(start.line..=end.line, replacement);
        self.generation += 1;

        for listener in &listeners {
            listener.after_change(&event, self);
        }
        if self.transaction_depth == 0 {
            self.notify_transaction_finished();
        }
        Ok(new_end)
    }

    pub fn insert_text(&mut self, pos: Position, text: &str) -> Result<Position, EditError> {
        self.replace(pos, pos, text)
    }

    pub fn delete_range(&mut self, start: Position, end: Position) -> Result<Position, EditError> {
        self.replace(start, end, "")
    }

    /// Offset-based replacement of `[start, end)`.
    pub fn replace_offsets(&mut self, start: usize, end: usize, text: &str) -> Result<Position, EditError> {
        let start = self.position_of(start)?;
        let end = self.position_of(end)?;
        self.replace(start, end, text)
    }

    /// Replace whole lines `[line1, line2)` with `new_lines`. Either side may
    /// be empty. `line1 == line_count()` appends.
    pub fn replace_lines(&mut self, line1: usize, line2: usize, new_lines: &[String]) -> Result<(), EditError> {
        let count = self.lines.len();
        if line1 > line2 {
            return Err(EditError::InvalidRange {
                start: Position::new(line1, 0),
                end: Position::new(line2, 0),
            });
        }
        if line2 > count {
            return Err(EditError::LineOutOfBounds { line: line2, line_count: count });
        }

        let joined = new_lines.join("\n");
        match (line1 < line2, new_lines.is_empty()) {
            (false, true) => {}
            (true, false) => {
                let end = Position::new(line2 - 1, self.lines[line2 - 1].len());
                self.replace(Position::new(line1, 0), end, &joined)?;
            }
            (false, false) => {
                if line1 < count {
                    self.insert_text(Position::new(line1, 0), &format!("{}\n", joined))?;
                } else {
                    let end = Position::new(count - 1, self.lines[count - 1].len());
                    self.insert_text(end, &format!("\n{}", joined))?;
                }
            }
            (true, true) => {
                if line2 < count {
                    self.delete_range(Position::new(line1, 0), Position::new(line2, 0))?;
                } else if line1 > 0 {
                    let start = Position::new(line1 - 1, self.lines[line1 - 1].len());
                    let end = Position::new(line2 - 1, self.lines[line2 - 1].len());
                    self.delete_range(start, end)?;
                } else {
                    let end = Position::new(count - 1, self.lines[count - 1].len());
                    self.delete_range(Position::new(0, 0), end)?;
                }
            }
        }
        Ok(())
    }

    /// Replace the whole text.
    pub fn set_text(&mut self, text: &str) -> Result<(), EditError> {
        let last = self.lines.len() - 1;
        let end = Position::new(last, self.lines[last].len());
        self.replace(Position::new(0, 0), end, text)?;
        Ok(())
    }

    // ── Helpers ──

    fn listener_snapshot(&self) -> Vec<Arc<dyn DocumentListener>> {
        self.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
    }

    fn notify_transaction_finished(&self) {
        for listener in self.listener_snapshot() {
            listener.transaction_finished(self);
        }
    }

    fn check_line(&self, line: usize) -> Result<(), EditError> {
        if line >= self.lines.len() {
            return Err(EditError::LineOutOfBounds {
                line,
                line_count: self.lines.len(),
            });
        }
        Ok(())
    }

    fn check_position(&self, pos: Position) -> Result<(), EditError> {
        self.check_line(pos.line)?;
        let line = &self.lines[pos.line];
        if pos.col > line.len() || !line.is_char_boundary(pos.col) {
            return Err(EditError::ColumnOutOfBounds {
                line: pos.line,
                col: pos.col,
            });
        }
        Ok(())
    }

    fn check_span(&self, start: Position, end: Position) -> Result<(), EditError> {
        self.check_position(start)?;
        self.check_position(end)?;
        if start > end {
            return Err(EditError::InvalidRange { start, end });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn lines(s: &[&str]) -> Vec<String> {
        s.iter().map(|l| l.to_string()).collect()
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl DocumentListener for Recorder {
        fn before_change(&self, event: &EditEvent, doc: &Document) {
            self.events
                .lock()
                .unwrap()
                .push(format!("before {} lines={}", event.new_text, doc.line_count()));
        }

        fn after_change(&self, event: &EditEvent, doc: &Document) {
            self.events
                .lock()
                .unwrap()
                .push(format!("after {} lines={}", event.new_text, doc.line_count()));
        }

        fn transaction_finished(&self, _doc: &Document) {
            self.events.lock().unwrap().push("finished".to_string());
        }
    }

    #[test]
    fn new_document_has_one_empty_line() {
        let doc = Document::new();
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.line(0), Some(""));
        assert!(doc.is_empty());
    }

    #[test]
    fn from_text_keeps_trailing_empty_line() {
        let doc = Document::from_text("a\r\nb\n");
        assert_eq!(doc.lines(), lines(&["a", "b", ""]).as_slice());
        assert_eq!(doc.text(), "a\nb\n");
    }

    #[test]
    fn offsets_and_line_numbers_agree() {
        let doc = Document::from_text("ab\ncde\n\nf");
        assert_eq!(doc.line_start_offset(1), Ok(3));
        assert_eq!(doc.line_start_offset(3), Ok(8));
        assert_eq!(doc.line_number(0), Ok(0));
        assert_eq!(doc.line_number(2), Ok(0));
        assert_eq!(doc.line_number(3), Ok(1));
        assert_eq!(doc.line_number(7), Ok(2));
        assert_eq!(doc.line_number(9), Ok(3));
        assert!(doc.line_number(10).is_err());
        assert_eq!(doc.position_of(5), Ok(Position::new(1, 2)));
        assert_eq!(doc.offset_of(Position::new(3, 1)), Ok(9));
    }

    #[test]
    fn insert_multiline_text() {
        let mut doc = Document::from_text("hello world");
        let end = doc.insert_text(Position::new(0, 5), ",\nnew\nline").unwrap();
        assert_eq!(end, Position::new(2, 4));
        assert_eq!(doc.lines(), lines(&["hello,", "new", "line world"]).as_slice());
    }

    #[test]
    fn delete_across_lines_merges() {
        let mut doc = Document::from_text("AB\nCD\nEF");
        doc.delete_range(Position::new(0, 1), Position::new(2, 1)).unwrap();
        assert_eq!(doc.lines(), lines(&["AF"]).as_slice());
    }

    #[test]
    fn edit_event_describes_change() {
        let mut doc = Document::from_text("one\ntwo\nthree");
        let rec = Arc::new(Recorder::default());
        doc.add_listener(rec.clone());
        doc.replace(Position::new(1, 0), Position::new(2, 2), "X").unwrap();
        assert_eq!(doc.lines(), lines(&["one", "Xree"]).as_slice());
        let events = rec.events.lock().unwrap().clone();
        assert_eq!(events, vec!["before X lines=3", "after X lines=2", "finished"]);
    }

    #[test]
    fn event_line_span_and_delta() {
        let event = EditEvent {
            offset: 0,
            old_length: 0,
            new_length: 0,
            old_text: String::new(),
            new_text: String::new(),
            start: Position::new(2, 0),
            old_end: Position::new(4, 1),
            new_end: Position::new(2, 3),
        };
        assert_eq!(event.old_line_span(), (2, 5));
        assert_eq!(event.line_delta(), -2);
    }

    #[test]
    fn transaction_defers_finished_notification() {
        let mut doc = Document::from_text("a");
        let rec = Arc::new(Recorder::default());
        doc.add_listener(rec.clone());
        doc.transaction(|doc| {
            doc.insert_text(Position::new(0, 1), "b").unwrap();
            doc.begin_transaction();
            doc.insert_text(Position::new(0, 2), "c").unwrap();
            doc.end_transaction();
            assert!(doc.in_transaction());
        });
        let events = rec.events.lock().unwrap().clone();
        assert_eq!(events.iter().filter(|e| *e == "finished").count(), 1);
        assert_eq!(events.last().map(String::as_str), Some("finished"));
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn removed_listener_hears_nothing() {
        let mut doc = Document::new();
        let rec = Arc::new(Recorder::default());
        let id = doc.add_listener(rec.clone());
        assert!(doc.remove_listener(id));
        assert!(!doc.remove_listener(id));
        doc.insert_text(Position::new(0, 0), "x").unwrap();
        assert!(rec.events.lock().unwrap().is_empty());
    }

    #[test]
    fn replace_lines_handles_every_shape() {
        let mut doc = Document::from_text("a\nb\nc");
        doc.replace_lines(1, 2, &lines(&["B1", "B2"])).unwrap();
        assert_eq!(doc.lines(), lines(&["a", "B1", "B2", "c"]).as_slice());

        doc.replace_lines(1, 3, &[]).unwrap();
        assert_eq!(doc.lines(), lines(&["a", "c"]).as_slice());

        doc.replace_lines(1, 1, &lines(&["b"])).unwrap();
        assert_eq!(doc.lines(), lines(&["a", "b", "c"]).as_slice());

        doc.replace_lines(3, 3, &lines(&["d"])).unwrap();
        assert_eq!(doc.lines(), lines(&["a", "b", "c", "d"]).as_slice());

        doc.replace_lines(2, 4, &[]).unwrap();
        assert_eq!(doc.lines(), lines(&["a", "b"]).as_slice());

        doc.replace_lines(0, 2, &[]).unwrap();
        assert_eq!(doc.lines(), lines(&[""]).as_slice());
    }

    #[test]
    fn out_of_bounds_edits_are_rejected() {
        let mut doc = Document::from_text("abc");
        assert_eq!(
            doc.insert_text(Position::new(1, 0), "x"),
            Err(EditError::LineOutOfBounds { line: 1, line_count: 1 })
        );
        assert!(doc.insert_text(Position::new(0, 4), "x").is_err());
        assert!(doc.delete_range(Position::new(0, 2), Position::new(0, 1)).is_err());
        assert!(doc.replace_lines(0, 2, &[]).is_err());
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn multibyte_columns_must_be_char_boundaries() {
        let mut doc = Document::from_text("가나");
        assert!(doc.insert_text(Position::new(0, 1), "x").is_err());
        doc.insert_text(Position::new(0, 3), "A").unwrap();
        assert_eq!(doc.text(), "가A나");
    }

    #[test]
    fn generation_increments_on_edits() {
        let mut doc = Document::new();
        let g0 = doc.generation();
        doc.set_text("x\ny").unwrap();
        assert!(doc.generation() > g0);
        assert_eq!(doc.line_count(), 2);
    }
}
