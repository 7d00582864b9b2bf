//! One-line lookahead over a fallible line source.
//!
//! The decoder's sheet loop and row loop share one stream: the row loop must stop *at*
//! the next sentinel line without swallowing it, so the sheet loop can see it. Holding
//! that line here keeps the hand-off explicit instead of threading a "next line"
//! variable between the two loops.

use std::io;

pub struct Lookahead<I> {
    lines: I,
    peeked: Option<String>,
    line_number: usize,
}

impl<I> Lookahead<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            peeked: None,
            line_number: 0,
        }
    }

    /// The next line, without consuming it.
    pub fn peek(&mut self) -> io::Result<Option<&str>> {
        if self.peeked.is_none() {
            self.peeked = self.lines.next().transpose()?;
        }
        Ok(self.peeked.as_deref())
    }

    /// Take the next line.
    pub fn consume(&mut self) -> io::Result<Option<String>> {
        let line = match self.peeked.take() {
            Some(line) => Some(line),
            None => self.lines.next().transpose()?,
        };
        if line.is_some() {
            self.line_number += 1;
        }
        Ok(line)
    }

    /// Take the next line only if `accept` returns true for it; otherwise leave it
    /// in place.
    pub fn next_if(&mut self, accept: impl FnOnce(&str) -> bool) -> io::Result<Option<String>> {
        let accepted = self.peek()?.is_some_and(accept);
        if accepted {
            self.consume()
        } else {
            Ok(None)
        }
    }

    /// 1-based number of the most recently consumed line (0 before the first).
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}
