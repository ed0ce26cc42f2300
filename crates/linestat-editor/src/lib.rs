// linestat-editor: line-addressable document that reports edits to listeners.

pub mod document;
pub mod event;

pub use document::{split_lines, Document, EditError, Position};
pub use event::{DocumentListener, EditEvent, ListenerId};
