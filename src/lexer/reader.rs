use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use serde::Serialize;

/// A 1-based line/column position within source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cursor {
    pub line: usize,
    pub column: usize,
}

impl Cursor {
    pub const START: Cursor = Cursor { line: 1, column: 1 };
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor::START
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Character reader that keeps the cursor in step with every consumed char.
pub(crate) struct SourceReader<'a> {
    chars: Peekable<Chars<'a>>,
    cursor: Cursor,
}

impl<'a> SourceReader<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        SourceReader {
            chars: source.chars().peekable(),
            cursor: Cursor::START,
        }
    }

    pub(crate) fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub(crate) fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    pub(crate) fn take(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.cursor.line += 1;
            self.cursor.column = 1;
        } else {
            self.cursor.column += 1;
        }
        Some(ch)
    }

    /// Consumes the next char only if `pred` accepts it.
    pub(crate) fn take_if(&mut self, pred: impl FnOnce(char) -> bool) -> Option<char> {
        match self.peek() {
            Some(ch) if pred(ch) => self.take(),
            _ => None,
        }
    }
}
