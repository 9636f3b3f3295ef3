//! Bookmarks and line seeking.

use core_text::{Line, LineTable};
use tracing::debug;

use crate::document::Document;
use crate::watch::WatcherId;

/// A bookmarked line as reported by [`Document::bookmarks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub line: usize,
    pub tag: u8,
    pub text: String,
}

impl Document {
    /// Step `line`'s tag to the entry after its current one in `cycle`, wrapping around. A tag
    /// not in the cycle jumps to the first entry. Returns the new tag.
    pub fn toggle_bookmark(&mut self, line: usize, cycle: &[u8], origin: Option<WatcherId>) -> Option<u8> {
        let current = self.lines.get(line)?.bookmark;
        let first = *cycle.first()?;
        let next = cycle
            .iter()
            .position(|&t| t == current)
            .map_or(first, |i| cycle.get(i + 1).copied().unwrap_or(first));
        self.lines[line].bookmark = next;
        debug!(target: "state.edit", line, tag = next, "bookmark_set");
        self.watchers.notify_bookmark(origin, line, next);
        Some(next)
    }

    pub fn bookmarks(&self) -> Vec<Bookmark> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.bookmark != 0)
            .map(|(i, l)| Bookmark {
                line: i,
                tag: l.bookmark,
                text: self.line_text(i).into_owned(),
            })
            .collect()
    }

    /// Replace all bookmarks with `marks` (`(line, tag)`); entries past the end are ignored.
    pub fn set_bookmarks(&mut self, marks: &[(usize, u8)], origin: Option<WatcherId>) {
        let mut tags = vec![0u8; self.lines.len()];
        for &(line, tag) in marks {
            if let Some(slot) = tags.get_mut(line) {
                *slot = tag;
            }
        }
        let mut changed = Vec::new();
        for (i, (line, tag)) in self.lines.iter_mut().zip(tags).enumerate() {
            if line.bookmark != tag {
                line.bookmark = tag;
                changed.push((i, tag));
            }
        }
        for (line, tag) in changed {
            self.watchers.notify_bookmark(origin, line, tag);
        }
    }

    /// Nearest line after (or before) `from` satisfying `pred`.
    pub fn seek_line(&mut self, from: usize, forward: bool, mut pred: impl FnMut(&Line) -> bool) -> Option<usize> {
        let len = self.lines.len();
        let mut line = from;
        loop {
            if forward {
                line += 1;
                if line >= len {
                    return None;
                }
            } else {
                line = line.checked_sub(1)?.min(len - 1);
            }
            if pred(&self.lines[line]) {
                return Some(line);
            }
            self.memory_checkpoint(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EditRequest;
    use core_text::Point;

    #[test]
    fn toggle_cycles_through_tags() {
        let mut doc = Document::from_text("a\nb\nc");
        let cycle = [1, 2, 0];
        assert_eq!(doc.toggle_bookmark(1, &cycle, None), Some(1));
        assert_eq!(doc.toggle_bookmark(1, &cycle, None), Some(2));
        assert_eq!(doc.toggle_bookmark(1, &cycle, None), Some(0));
        assert_eq!(doc.toggle_bookmark(9, &cycle, None), None);
        assert_eq!(doc.toggle_bookmark(0, &[], None), None);
    }

    #[test]
    fn bookmark_list_round_trips() {
        let mut doc = Document::from_text("a\nb\nc");
        doc.set_bookmarks(&[(0, 1), (2, 3), (7, 1)], None);
        let marks = doc.bookmarks();
        assert_eq!(
            marks.iter().map(|b| (b.line, b.tag)).collect::<Vec<_>>(),
            vec![(0, 1), (2, 3)]
        );
        assert_eq!(marks[1].text, "c");
    }

    #[test]
    fn seek_finds_modified_and_bookmarked_lines() {
        let mut doc = Document::from_text("a\nb\nc\nd\n");
        doc.modify_text(EditRequest::insert(Point::new(2, 0), "x"))
            .unwrap();
        doc.toggle_bookmark(0, &[1, 0], None);
        assert_eq!(doc.seek_line(0, true, |l| l.modified), Some(2));
        assert_eq!(doc.seek_line(2, true, |l| l.modified), None);
        assert_eq!(doc.seek_line(3, false, |l| l.bookmark != 0), Some(0));
        assert_eq!(doc.seek_line(0, false, |_| true), None);
    }
}
