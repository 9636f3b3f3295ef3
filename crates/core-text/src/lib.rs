//! Line-structured text primitives.
//!
//! Positions are [`Point`]s: a line index plus a character index within that line. Everything in
//! this crate is independent of the owning document; navigation works against any [`LineTable`].

use std::borrow::Cow;

pub mod encoding;
pub mod line;
pub mod mode;
pub mod motion;
pub mod selection;
pub mod width;
pub mod wordbreak;

pub use encoding::{Charset, TextEncoding};
pub use line::{Line, LineEnding, LineSource, Offload, SourceError};
pub use mode::TextMode;
pub use motion::Motion;
pub use selection::{Direction, Selection};
pub use wordbreak::WordBreak;

/// A document position: line index and character index within the line.
///
/// Ordering is by line, then index. Operations producing points clamp them into the document;
/// only block-mode moves may carry an index past the end of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Point {
    pub line: usize,
    pub index: usize,
}

impl Point {
    pub const fn new(line: usize, index: usize) -> Self {
        Self { line, index }
    }

    pub const fn origin() -> Self {
        Self { line: 0, index: 0 }
    }

    /// Clamp into `table`, pulling the index back to the line length.
    pub fn clamp_to<T: LineTable + ?Sized>(self, table: &T) -> Self {
        let count = table.line_count();
        if count == 0 {
            return Self::origin();
        }
        let line = self.line.min(count - 1);
        let index = self.index.min(table.line_len(line));
        Self { line, index }
    }
}

/// Read access to an ordered sequence of lines (without terminators).
pub trait LineTable {
    fn line_count(&self) -> usize;

    /// Text of line `idx`; out-of-range lines read as empty.
    fn line_text(&self, idx: usize) -> Cow<'_, str>;

    fn line_len(&self, idx: usize) -> usize {
        self.line_text(idx).chars().count()
    }

    /// Last position in the table.
    fn end_point(&self) -> Point {
        let last = self.line_count().saturating_sub(1);
        Point::new(last, self.line_len(last))
    }
}

impl LineTable for [String] {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line_text(&self, idx: usize) -> Cow<'_, str> {
        self.get(idx).map_or(Cow::Borrowed(""), |s| Cow::Borrowed(s))
    }
}

impl LineTable for Vec<String> {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line_text(&self, idx: usize) -> Cow<'_, str> {
        self.as_slice().line_text(idx)
    }
}

impl LineTable for [&str] {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line_text(&self, idx: usize) -> Cow<'_, str> {
        Cow::Borrowed(self.get(idx).copied().unwrap_or(""))
    }
}

/// Substring of `s` between two character indices, clamped to the string.
pub fn char_slice(s: &str, start: usize, end: usize) -> &str {
    let from = byte_offset(s, start);
    let to = byte_offset(s, end.max(start));
    &s[from..to]
}

/// Byte offset of character `index`, or `s.len()` past the end.
pub fn byte_offset(s: &str, index: usize) -> usize {
    s.char_indices().nth(index).map_or(s.len(), |(b, _)| b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_order_by_line_then_index() {
        let mut pts = vec![Point::new(1, 0), Point::new(0, 5), Point::new(0, 2)];
        pts.sort();
        assert_eq!(pts, vec![Point::new(0, 2), Point::new(0, 5), Point::new(1, 0)]);
    }

    #[test]
    fn clamp_pulls_points_inside() {
        let lines = ["abc", "de"];
        assert_eq!(Point::new(9, 9).clamp_to(&lines[..]), Point::new(1, 2));
        assert_eq!(Point::new(0, 9).clamp_to(&lines[..]), Point::new(0, 3));
        assert_eq!(lines[..].end_point(), Point::new(1, 2));
    }

    #[test]
    fn char_slices_respect_multibyte_text() {
        assert_eq!(char_slice("añb", 1, 2), "ñ");
        assert_eq!(char_slice("añb", 2, 10), "b");
        assert_eq!(char_slice("añb", 5, 1), "");
        assert_eq!(byte_offset("añb", 2), 3);
    }
}
