//! Cursor protocol: rewindable forward iteration over a [`LineStore`].
//!
//! `position` follows the scanner convention: `0` means not started, `-1`
//! means invalidated (the next `has_next` performs an implicit rewind),
//! and `1..=N` is the 1-based index of the current line. The store sits
//! behind an `Rc`, so cloning a cursor gives an independently advanceable
//! copy positioned at the same logical line.

use crate::error::ScanError;
use crate::store::{Line, LineStore};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct LineCursor {
    store: Rc<LineStore>,
    position: i32,
}

impl LineCursor {
    pub fn new(store: Rc<LineStore>) -> Self {
        LineCursor { store, position: 0 }
    }

    pub fn store(&self) -> &LineStore {
        &self.store
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    /// Original line number of the current line, or 0 when not on a line.
    pub fn line_number(&self) -> usize {
        self.current().map(|l| l.number).unwrap_or(0)
    }

    /// Whether another line exists. Recovers from an invalidated cursor
    /// with an implicit rewind.
    pub fn has_next(&mut self) -> bool {
        if self.position < 0 {
            self.rewind();
        }
        (self.position as usize) < self.store.len()
    }

    /// Advance and return the new current line.
    pub fn next(&mut self) -> Result<&Line, ScanError> {
        if !self.has_next() {
            return Err(ScanError::PastEnd(self.state()));
        }
        self.position += 1;
        Ok(self.store.get(self.position as usize - 1).unwrap())
    }

    /// Non-throwing advance; `None` past the end.
    pub fn try_next(&mut self) -> Option<&Line> {
        if !self.has_next() {
            return None;
        }
        self.position += 1;
        self.store.get(self.position as usize - 1)
    }

    /// Re-read the current line without advancing.
    pub fn current(&self) -> Option<&Line> {
        if self.position < 1 {
            return None;
        }
        self.store.get(self.position as usize - 1)
    }

    /// Preview the line at `position + 1` without mutating anything.
    pub fn peek(&self) -> Option<&Line> {
        let at = self.position.max(0) as usize;
        self.store.get(at)
    }

    /// Back to "not started" with a fresh iteration.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Mark the cursor invalid; the next `has_next` rewinds it.
    pub fn invalidate(&mut self) {
        self.position = -1;
    }

    /// Diagnostic string: source identifier, 1-based original line number
    /// and line content.
    pub fn state(&self) -> String {
        match self.current() {
            Some(line) => format!("{}: line {}: {}", self.store.source(), line.number, line.text),
            None if self.position == 0 => format!("{}: (not started)", self.store.source()),
            None if self.position < 0 => format!("{}: (invalid)", self.store.source()),
            None => format!("{}: (end)", self.store.source()),
        }
    }
}
