//! Scan position.
//!
//! The cursor splits the query into consumed and unconsumed text. It only
//! moves forward, and only when a rule captures text.

use crate::Position;

#[derive(Debug, Clone)]
pub(crate) struct Cursor<'q> {
    input: &'q str,
    position: Position,
}

impl<'q> Cursor<'q> {
    pub(crate) fn new(input: &'q str) -> Self {
        Cursor { input, position: Position::START }
    }

    /// Unconsumed suffix of the query.
    pub(crate) fn rest(&self) -> &'q str {
        &self.input[self.position.offset..]
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.position.offset >= self.input.len()
    }

    pub(crate) fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn offset(&self) -> usize {
        self.position.offset
    }

    /// Consume `len` bytes. Line breaks are only looked for when the rule
    /// declared that its matches may span lines.
    pub(crate) fn advance(&mut self, len: usize, spans_lines: bool) {
        let consumed = &self.rest()[..len];
        self.position.offset += len;

        if spans_lines {
            if let Some(last_break) = consumed.rfind('\n') {
                self.position.line += consumed.matches('\n').count();
                self.position.column = consumed[last_break + 1..].chars().count() + 1;
                return;
            }
        }
        self.position.column += consumed.chars().count();
    }
}
