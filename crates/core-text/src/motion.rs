//! Cursor motion over a [`LineTable`].
//!
//! Every operation takes a [`Point`] and returns a new one; nothing here mutates the table.
//! Vertical moves work from an ideal column tracked by the caller so that passing through short or
//! tab-indented lines does not drift the cursor.

use crate::width::{column_from_index, index_from_column};
use crate::{LineTable, Point, TextMode};

/// Lines scanned by [`Motion::corresponding_bracket`] before giving up.
pub const BRACKET_SCAN_LINES: usize = 1000;

pub struct Motion<'a, T: LineTable + ?Sized> {
    lines: &'a T,
    mode: &'a TextMode,
}

impl<'a, T: LineTable + ?Sized> Motion<'a, T> {
    pub fn new(lines: &'a T, mode: &'a TextMode) -> Self {
        Self { lines, mode }
    }

    fn len(&self, line: usize) -> usize {
        self.lines.line_len(line)
    }

    fn last_line(&self) -> usize {
        self.lines.line_count().saturating_sub(1)
    }

    fn chars(&self, line: usize) -> Vec<char> {
        self.lines.line_text(line).chars().collect()
    }

    pub fn document_begin(&self) -> Point {
        Point::origin()
    }

    pub fn document_end(&self) -> Point {
        self.lines.end_point()
    }

    /// Display column of `p`; indices past the end count one column each.
    pub fn column_of(&self, p: Point) -> usize {
        column_from_index(&self.lines.line_text(p.line), p.index, self.mode.tab_width)
    }

    pub fn index_at_column(&self, line: usize, column: usize, sub_x: f64, block_mode: bool) -> usize {
        index_from_column(
            &self.lines.line_text(line),
            column,
            sub_x,
            self.mode.tab_width,
            block_mode,
        )
    }

    /// One character left; wraps to the previous line end unless in block mode.
    pub fn left(&self, p: Point, block_mode: bool) -> Point {
        if p.index > 0 {
            Point::new(p.line, p.index - 1)
        } else if !block_mode && p.line > 0 {
            Point::new(p.line - 1, self.len(p.line - 1))
        } else {
            p
        }
    }

    /// One character right; block mode may move past the line end instead of wrapping.
    pub fn right(&self, p: Point, block_mode: bool) -> Point {
        if block_mode || p.index < self.len(p.line) {
            Point::new(p.line, p.index + 1)
        } else if p.line < self.last_line() {
            Point::new(p.line + 1, 0)
        } else {
            p
        }
    }

    pub fn word_left(&self, p: Point, strong_only: bool) -> Point {
        let wb = &self.mode.word_break;
        if p.index > 0 {
            let chars = self.chars(p.line);
            Point::new(p.line, wb.next_break(&chars, p.index.min(chars.len()), false, strong_only))
        } else if p.line > 0 {
            let chars = self.chars(p.line - 1);
            Point::new(p.line - 1, wb.next_break(&chars, chars.len(), false, strong_only))
        } else {
            p
        }
    }

    pub fn word_right(&self, p: Point, strong_only: bool) -> Point {
        let wb = &self.mode.word_break;
        let chars = self.chars(p.line);
        if p.index < chars.len() {
            Point::new(p.line, wb.next_break(&chars, p.index, true, strong_only))
        } else if p.line < self.last_line() {
            let chars = self.chars(p.line + 1);
            Point::new(p.line + 1, wb.next_break(&chars, 0, true, strong_only))
        } else {
            p
        }
    }

    /// Back to the previous tab stop.
    pub fn tab_left(&self, p: Point) -> Point {
        let tab = self.mode.tab_width.max(1);
        let column = self.column_of(p).saturating_sub(1) / tab * tab;
        Point::new(p.line, self.index_at_column(p.line, column, 0.0, false))
    }

    pub fn up(&self, p: Point, step: usize, ideal_column: usize, block_mode: bool) -> Point {
        if p.line >= step {
            let line = p.line - step;
            Point::new(line, self.index_at_column(line, ideal_column, 0.0, block_mode))
        } else {
            self.document_begin()
        }
    }

    pub fn down(&self, p: Point, step: usize, ideal_column: usize, block_mode: bool) -> Point {
        let line = p.line + step;
        if line <= self.last_line() {
            Point::new(line, self.index_at_column(line, ideal_column, 0.0, block_mode))
        } else {
            self.document_end()
        }
    }

    pub fn line_begin(&self, p: Point) -> Point {
        Point::new(p.line, 0)
    }

    pub fn line_end(&self, p: Point) -> Point {
        Point::new(p.line, self.len(p.line))
    }

    /// First non-blank character of the line, or its end when the line is blank.
    pub fn line_first_graph(&self, p: Point) -> Point {
        let chars = self.chars(p.line);
        let index = chars
            .iter()
            .position(|c| !matches!(c, ' ' | '\t'))
            .unwrap_or(chars.len());
        Point::new(p.line, index)
    }

    /// Matching bracket for a bracket adjacent to `p`.
    ///
    /// Forward matches land after the closing bracket when starting before the opening one and
    /// before it when starting just inside; backward matches mirror this. Returns `p` unchanged
    /// when no bracket is adjacent, the document edge is reached, or more than
    /// [`BRACKET_SCAN_LINES`] lines were scanned.
    pub fn corresponding_bracket(&self, p: Point) -> Point {
        let chars = self.chars(p.line);
        let at = |i: usize| chars.get(i).copied();
        let before = |i: usize| i.checked_sub(1).and_then(|j| chars.get(j).copied());

        let mut point = p;
        let mut found = None;
        for &(open, close) in &self.mode.brackets {
            if at(p.index) == Some(open) {
                point = self.right(p, false);
                found = Some((open, close, true, false));
            } else if at(p.index) == Some(close) {
                found = Some((open, close, false, true));
            } else if before(p.index) == Some(open) {
                found = Some((open, close, true, true));
            } else if before(p.index) == Some(close) {
                point = self.left(p, false);
                found = Some((open, close, false, false));
            }
            if found.is_some() {
                break;
            }
        }
        let Some((open, close, forward, inside)) = found else {
            return p;
        };

        let mut depth: i64 = 1;
        let mut checked = 0;
        loop {
            let chars = self.chars(point.line);
            let (pos_open, pos_close) = if forward {
                let from = point.index.min(chars.len());
                let find = |ch| chars[from..].iter().position(|&c| c == ch).map(|i| i + from);
                (find(open), find(close))
            } else {
                let upto = point.index.min(chars.len());
                let rfind = |ch| chars[..upto].iter().rposition(|&c| c == ch);
                (rfind(open), rfind(close))
            };
            // nearer of the two in scan direction
            let take_open = match (pos_open, pos_close) {
                (Some(o), Some(c)) => (o < c) == forward,
                (Some(_), None) => true,
                _ => false,
            };
            let hit = match (take_open, pos_open, pos_close) {
                (true, Some(o), _) => {
                    depth += if forward { 1 } else { -1 };
                    Some(o)
                }
                (false, _, Some(c)) => {
                    depth -= if forward { 1 } else { -1 };
                    Some(c)
                }
                _ => None,
            };
            match hit {
                Some(index) => point.index = index,
                None => {
                    point = if forward {
                        self.line_end(point)
                    } else {
                        self.line_begin(point)
                    };
                    checked += 1;
                    if checked > BRACKET_SCAN_LINES {
                        return p;
                    }
                }
            }
            if depth <= 0 {
                break;
            }
            // backward scans search strictly before `point.index`, so a hit needs no step
            if !forward && hit.is_some() {
                continue;
            }
            let next = if forward {
                self.right(point, false)
            } else {
                self.left(point, false)
            };
            if next == point {
                return p;
            }
            point = next;
        }
        if forward != inside {
            point = self.right(point, false);
        }
        point
    }
}
