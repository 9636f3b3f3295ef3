//! Anchor/cursor selections, linear or rectangular.

use std::ops::RangeInclusive;

use crate::width::{BLOCK_SELECTION_SUB_X, column_from_index, index_from_column};
use crate::{LineTable, Point};

/// Which end of the selection the cursor sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Empty selection.
    #[default]
    None,
    /// Cursor at `right`.
    Forward,
    /// Cursor at `left`.
    Backward,
}

/// A normalized selection: `left <= right` always, `direction` says where the cursor is.
///
/// In block mode the selection covers the column range between the two ends on every line from
/// `left.line` to `right.line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub left: Point,
    pub right: Point,
    pub direction: Direction,
    pub block_mode: bool,
}

impl Selection {
    pub fn caret(at: Point) -> Self {
        Self::new(at, at, false)
    }

    pub fn new(anchor: Point, cursor: Point, block_mode: bool) -> Self {
        let mut selection = Self {
            block_mode,
            ..Self::default()
        };
        selection.set(anchor, cursor);
        selection
    }

    /// Move both ends, keeping the block flag.
    pub fn set(&mut self, anchor: Point, cursor: Point) {
        use std::cmp::Ordering::*;
        (self.left, self.right, self.direction) = match anchor.cmp(&cursor) {
            Less => (anchor, cursor, Direction::Forward),
            Greater => (cursor, anchor, Direction::Backward),
            Equal => (anchor, cursor, Direction::None),
        };
    }

    pub fn cursor(&self) -> Point {
        match self.direction {
            Direction::Forward => self.right,
            _ => self.left,
        }
    }

    pub fn anchor(&self) -> Point {
        match self.direction {
            Direction::Forward => self.left,
            _ => self.right,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.direction == Direction::None
    }

    pub fn rows(&self) -> RangeInclusive<usize> {
        self.left.line..=self.right.line
    }
}

/// Column range `[lo, hi)` a block selection between `left` and `right` covers.
pub fn block_columns<T: LineTable + ?Sized>(
    lines: &T,
    left: Point,
    right: Point,
    tab_width: usize,
) -> (usize, usize) {
    let a = column_from_index(&lines.line_text(left.line), left.index, tab_width);
    let b = column_from_index(&lines.line_text(right.line), right.index, tab_width);
    (a.min(b), a.max(b))
}

/// Character span `[start, end)` of `text` inside the block column range.
pub fn block_row_span(text: &str, columns: (usize, usize), tab_width: usize) -> (usize, usize) {
    let start = index_from_column(text, columns.0, BLOCK_SELECTION_SUB_X, tab_width, false);
    let end = index_from_column(text, columns.1, BLOCK_SELECTION_SUB_X, tab_width, false);
    (start, end.max(start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_normalizes_direction() {
        let a = Point::new(2, 1);
        let b = Point::new(0, 4);
        let sel = Selection::new(a, b, false);
        assert_eq!((sel.left, sel.right), (b, a));
        assert_eq!(sel.direction, Direction::Backward);
        assert_eq!(sel.cursor(), b);
        assert_eq!(sel.anchor(), a);

        let fwd = Selection::new(b, a, true);
        assert_eq!(fwd.cursor(), a);
        assert_eq!(fwd.anchor(), b);
        assert!(fwd.block_mode);
        assert!(Selection::caret(a).is_empty());
    }

    #[test]
    fn block_rows_map_columns_per_line() {
        let lines = ["0123456", "\tabc", "ab"];
        let cols = block_columns(&lines[..], Point::new(0, 2), Point::new(2, 5), 4);
        assert_eq!(cols, (2, 5));
        assert_eq!(block_row_span(lines[0], cols, 4), (2, 5));
        assert_eq!(block_row_span(lines[1], cols, 4), (1, 2));
        assert_eq!(block_row_span(lines[2], cols, 4), (2, 2));
    }
}
