//! Restartable traversal over the keys of a document.

use thiserror::Error;

use crate::document::Document;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("cursor is past the last key")]
    OutOfRange,
}

/// A position in a document's key order, or the end sentinel.
///
/// The cursor only stores an index; the document is passed in on every call
/// so it can stay owned elsewhere and immutable while the cursor walks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyCursor {
    position: usize,
    len: usize,
}

impl KeyCursor {
    /// Starts at the first key of `doc`, or at the end if it has none.
    pub fn start(doc: &Document) -> Self {
        Self {
            position: 0,
            len: doc.len(),
        }
    }

    /// Moves back to the first key.
    pub fn restart(&mut self) {
        self.position = 0;
    }

    /// The key and value under the cursor, or `OutOfRange` at the end.
    pub fn current<'d>(&self, doc: &'d Document) -> Result<(&'d str, &'d Value), CursorError> {
        if self.at_end() {
            return Err(CursorError::OutOfRange);
        }
        doc.get_index(self.position).ok_or(CursorError::OutOfRange)
    }

    /// Steps to the next key. Stepping past the last key lands on the end
    /// sentinel, where further calls do nothing.
    pub fn advance(&mut self) {
        if !self.at_end() {
            self.position += 1;
        }
    }

    /// True once every key has been visited.
    pub fn at_end(&self) -> bool {
        self.position >= self.len
    }

    #[cfg(test)]
    pub fn position(&self) -> usize {
        self.position
    }
}
