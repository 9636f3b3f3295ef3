//! The edit engine: every text mutation, undo replay included, goes through
//! [`Document::modify_text`].

use core_text::selection::{block_columns, block_row_span};
use core_text::width::{BLOCK_SELECTION_SUB_X, index_from_column};
use core_text::{Line, LineEnding, LineTable, Point, byte_offset, char_slice};
use thiserror::Error;
use tracing::{debug, trace};

use crate::document::{Document, ModCount};
use crate::undo::{Anchors, CapturedText, EditRecord, UndoRecord};
use crate::watch::WatcherId;

/// Why an edit was not applied. The document is unchanged in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditRefusal {
    #[error("document is read-only")]
    ReadOnly,
    /// Block-shaped text into a linear selection (`block_text = true`) or linear text into a
    /// block selection.
    #[error("text shape does not match the selection")]
    BlockShapeMismatch { block_text: bool },
}

/// Parameters of one call to [`Document::modify_text`].
#[derive(Debug, Clone, Copy)]
pub struct EditRequest<'a> {
    pub anchor: Point,
    pub cursor: Point,
    pub text: &'a str,
    /// The text is rectangular (one row per line).
    pub text_block_mode: bool,
    /// The span being replaced is a block selection.
    pub selection_block_mode: bool,
    pub selection_empty: bool,
    pub record_undo: bool,
    /// Undo restores the whole selection instead of just the caret.
    pub select_on_undo: bool,
    pub notify: bool,
    pub ignore_readonly: bool,
    pub origin: Option<WatcherId>,
    /// Undo replay: insert these pieces, breaks included, instead of `text`.
    replayed: Option<&'a CapturedText>,
    modstep: i64,
}

impl<'a> EditRequest<'a> {
    /// Replace the linear span between `anchor` and `cursor` with `text`.
    pub fn replace(anchor: Point, cursor: Point, text: &'a str) -> Self {
        Self {
            anchor,
            cursor,
            text,
            text_block_mode: false,
            selection_block_mode: false,
            selection_empty: anchor == cursor,
            record_undo: true,
            select_on_undo: false,
            notify: true,
            ignore_readonly: false,
            origin: None,
            replayed: None,
            modstep: 1,
        }
    }

    pub fn insert(at: Point, text: &'a str) -> Self {
        Self::replace(at, at, text)
    }

    /// Replace the contents of `selection`, honoring its block flag.
    pub fn selection(selection: &core_text::Selection, text: &'a str) -> Self {
        Self {
            selection_block_mode: selection.block_mode,
            selection_empty: selection.is_empty(),
            ..Self::replace(selection.anchor(), selection.cursor(), text)
        }
    }

    pub fn block_text(mut self) -> Self {
        self.text_block_mode = true;
        self
    }

    pub fn without_undo(mut self) -> Self {
        self.record_undo = false;
        self
    }

    pub fn select_on_undo(mut self) -> Self {
        self.select_on_undo = true;
        self
    }

    pub fn silent(mut self) -> Self {
        self.notify = false;
        self
    }

    pub fn ignore_readonly(mut self) -> Self {
        self.ignore_readonly = true;
        self
    }

    pub fn with_origin(mut self, origin: Option<WatcherId>) -> Self {
        self.origin = origin;
        self
    }

    fn replay(span: (Point, Point), text: &'a CapturedText, modstep: i64) -> Self {
        Self {
            record_undo: false,
            ignore_readonly: true,
            replayed: Some(text),
            modstep,
            ..Self::replace(span.0, span.1, "")
        }
    }
}

/// What changed: text from `left` to `old_right` now ends at `new_right`. `cursor` is where the
/// caret belongs after the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
    pub left: Point,
    pub old_right: Point,
    pub new_right: Point,
    pub cursor: Point,
}

/// Per-line metadata handed to [`Document::filter_lines`] predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo {
    pub bookmark: u8,
    pub modified: bool,
}

/// Split `text` after every CRLF, CR, or LF. A trailing break produces no empty piece.
pub(crate) fn split_breaks(text: &str) -> Vec<(&str, Option<LineEnding>)> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let (mut start, mut i) = (0, 0);
    while i < bytes.len() {
        let (ending, width) = match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => (LineEnding::Crlf, 2),
            b'\r' => (LineEnding::Cr, 1),
            b'\n' => (LineEnding::Lf, 1),
            _ => {
                i += 1;
                continue;
            }
        };
        out.push((&text[start..i], Some(ending)));
        i += width;
        start = i;
    }
    if start < bytes.len() {
        out.push((&text[start..], None));
    }
    out
}

impl Document {
    /// Replace text and run all follow-up bookkeeping.
    pub fn modify_text(&mut self, req: EditRequest<'_>) -> Result<EditOutcome, EditRefusal> {
        if self.readonly && !req.ignore_readonly {
            debug!(target: "state.edit", "edit_refused_readonly");
            return Err(EditRefusal::ReadOnly);
        }
        if !req.selection_block_mode && !req.selection_empty && req.text_block_mode {
            debug!(target: "state.edit", "edit_refused_block_text");
            return Err(EditRefusal::BlockShapeMismatch { block_text: true });
        }
        if req.selection_block_mode && !req.text_block_mode && !req.text.is_empty() {
            debug!(target: "state.edit", "edit_refused_linear_text");
            return Err(EditRefusal::BlockShapeMismatch { block_text: false });
        }
        let block_mode = req.selection_block_mode || req.text_block_mode;

        let outcome = if block_mode {
            self.modify_block(&req)
        } else {
            self.modify_linear(&req)
        };

        let stepped = self.mod_count.step(req.modstep);
        if stepped == ModCount::Clean && self.mod_count != ModCount::Clean {
            self.clear_modified_flags();
        }
        self.mod_count = stepped;

        self.mark_syntax_dirty(outcome.left.line);

        trace!(
            target: "state.edit",
            left = outcome.left.line,
            old_right = outcome.old_right.line,
            new_right = outcome.new_right.line,
            block = block_mode,
            lines = self.lines.len(),
            "text_modified"
        );
        if req.notify {
            self.watchers
                .notify_text(req.origin, outcome.left, outcome.old_right, outcome.new_right);
        }
        Ok(outcome)
    }

    fn modify_linear(&mut self, req: &EditRequest<'_>) -> EditOutcome {
        let anchor = req.anchor.clamp_to(self);
        let cursor = req.cursor.clamp_to(self);
        let (left, right) = (anchor.min(cursor), anchor.max(cursor));

        let old_text = req.record_undo.then(|| self.capture(left, right));
        if left != right {
            self.delete_span(left, right);
        }
        let end = match req.replayed {
            Some(captured) => self.insert_at(left, captured.pieces(), true),
            None => self.insert_at(left, split_breaks(req.text), false),
        };
        for line in &mut self.lines[left.line..=end.line] {
            line.tokens = None;
        }

        if let Some(old_text) = old_text {
            let (before, after) = if req.select_on_undo {
                (Anchors::new(anchor, cursor), Anchors::new(left, end))
            } else {
                (Anchors::at(cursor), Anchors::at(end))
            };
            self.record_edit(EditRecord {
                old_text,
                old_span: (left, right),
                new_text: self.capture(left, end),
                new_span: (left, end),
                before,
                after,
            });
        }
        EditOutcome {
            left,
            old_right: right,
            new_right: end,
            cursor: end,
        }
    }

    fn modify_block(&mut self, req: &EditRequest<'_>) -> EditOutcome {
        let last = self.lines.len() - 1;
        let anchor = Point::new(req.anchor.line.min(last), req.anchor.index);
        let cursor = Point::new(req.cursor.line.min(last), req.cursor.index);
        let (left, right) = (anchor.min(cursor), anchor.max(cursor));
        let tab = self.mode.tab_width;

        let rows: Vec<&str> = split_breaks(req.text).into_iter().map(|(s, _)| s).collect();
        let count = rows.len().max(right.line - left.line + 1);
        let columns = block_columns(self, left, right, tab);
        let caret = Point::new(
            left.line,
            index_from_column(&self.line_text(left.line), columns.0, BLOCK_SELECTION_SUB_X, tab, false),
        );

        let span_left = Point::new(left.line, 0);
        let span_end = |doc: &Document| Point::new(left.line + count, 0).min(doc.end_point());
        let old_right = span_end(self);
        let old_text = req.record_undo.then(|| self.capture(span_left, old_right));

        for (i, lineno) in (left.line..left.line + count).enumerate() {
            let insert = rows.get(i).copied().unwrap_or("");
            if lineno < self.lines.len() {
                let text = self.line_text(lineno).into_owned();
                let (start, end) = if lineno <= right.line {
                    block_row_span(&text, columns, tab)
                } else {
                    let at = index_from_column(&text, columns.0, 0.0, tab, false);
                    (at, at)
                };
                let spliced = format!(
                    "{}{}{}",
                    char_slice(&text, 0, start),
                    insert,
                    char_slice(&text, end, usize::MAX)
                );
                let line = &mut self.lines[lineno];
                line.set_text(spliced);
                line.modified = true;
            } else {
                let default = self.line_ending;
                if let Some(prev) = self.lines.last_mut()
                    && prev.ending.is_none()
                {
                    prev.ending = default;
                }
                let mut line = Line::new(insert, LineEnding::None);
                line.modified = true;
                self.lines.push(line);
            }
        }

        let touched = (left.line + count).min(self.lines.len());
        for line in &mut self.lines[left.line..touched] {
            line.tokens = None;
        }
        for line in self.lines.iter_mut().take(touched + 1).skip(left.line + 1) {
            line.lex_context = None;
        }

        let new_right = span_end(self);
        if let Some(old_text) = old_text {
            let new_text = self.capture(span_left, new_right);
            self.record_edit(EditRecord {
                old_text,
                old_span: (span_left, old_right),
                new_text,
                new_span: (span_left, new_right),
                before: Anchors::at(caret),
                after: Anchors::at(caret),
            });
        }
        EditOutcome {
            left: span_left,
            old_right,
            new_right,
            cursor: caret,
        }
    }

    /// Remove `[left, right)`, merging the boundary lines into `left.line`.
    fn delete_span(&mut self, left: Point, right: Point) {
        let head = self.line_text(left.line).into_owned();
        let tail = if left.line == right.line {
            head.clone()
        } else {
            self.line_text(right.line).into_owned()
        };
        let s1 = char_slice(&head, 0, left.index);
        let s2 = char_slice(&tail, right.index, usize::MAX);

        let (l1, l2) = (&self.lines[left.line], &self.lines[right.line]);
        let background = if !s1.trim().is_empty() && l1.background.is_some() {
            l1.background
        } else {
            l2.background
        };
        let bookmark = if left.index > 0 || left.line == right.line {
            l1.bookmark
        } else if right.index == 0 {
            l2.bookmark
        } else {
            0
        };
        let modified = left.index > 0 || right.index > 0 || l2.modified;
        let ending = l2.ending;

        let merged = format!("{s1}{s2}");
        let line = &mut self.lines[left.line];
        line.set_text(merged);
        line.ending = ending;
        line.background = background;
        line.bookmark = bookmark;
        line.modified = modified;
        if left.line != right.line {
            self.lines.drain(left.line + 1..=right.line);
        }
    }

    /// Insert `text` at `at`, splitting lines on embedded breaks. Returns the end of the
    /// inserted text.
    fn insert_at<'t>(
        &mut self,
        at: Point,
        pieces: impl IntoIterator<Item = (&'t str, Option<LineEnding>)>,
        verbatim_breaks: bool,
    ) -> Point {
        let mut cursor = at;
        for (piece, brk) in pieces {
            let current = self.line_text(cursor.line).into_owned();
            let split = byte_offset(&current, cursor.index);
            let mut head = String::with_capacity(current.len() + piece.len());
            head.push_str(&current[..split]);
            head.push_str(piece);
            cursor.index += piece.chars().count();
            let idx = cursor.line;

            let Some(brk) = brk else {
                head.push_str(&current[split..]);
                let line = &mut self.lines[idx];
                line.set_text(head);
                line.modified = true;
                continue;
            };

            let default = self.line_ending;
            let line = &mut self.lines[idx];
            let mut next = Line::new(&current[split..], line.ending);
            next.background = line.background;
            next.modified = line.modified || cursor.index > 0;
            if head.trim().is_empty() {
                line.background = None;
            }
            line.set_text(head);
            line.ending = if verbatim_breaks { brk } else { default };
            line.modified = true;
            self.lines.insert(idx + 1, next);
            cursor = Point::new(idx + 1, 0);
        }

        if at.line != cursor.line && at.index == 0 {
            let tag = std::mem::take(&mut self.lines[at.line].bookmark);
            self.lines[cursor.line].bookmark = tag;
        }
        cursor
    }

    fn record_edit(&mut self, record: EditRecord) {
        if let ModCount::Dirty(c) = self.mod_count
            && c < 0
        {
            self.mod_count = ModCount::DirtyUnknown;
        }
        self.history.record(record);
    }

    /// Start an atomic undo group; edits until the matching [`Document::end_atomic`] undo as one.
    pub fn begin_atomic(&mut self, anchor: Point, cursor: Point) {
        self.history.begin_group(Anchors::new(anchor, cursor));
    }

    pub fn end_atomic(&mut self, anchor: Point, cursor: Point) {
        self.history.end_group(Anchors::new(anchor, cursor));
    }

    /// Revert the most recent record. Returns the anchors to restore, or `None` when there was
    /// nothing to undo.
    pub fn undo(&mut self, origin: Option<WatcherId>) -> Result<Option<Anchors>, EditRefusal> {
        if self.readonly {
            return Err(EditRefusal::ReadOnly);
        }
        let Some(record) = self.history.pop_undo() else {
            return Ok(None);
        };
        match &record {
            UndoRecord::Edit(e) => {
                let req = EditRequest::replay(e.new_span, &e.old_text, -1);
                self.modify_text(req.with_origin(origin))?;
            }
            UndoRecord::Group(g) => {
                for item in g.items.iter().rev() {
                    let req = EditRequest::replay(item.new_span, &item.old_text, -1);
                    self.modify_text(req.silent())?;
                }
                self.watchers
                    .notify_text(origin, g.after.left(), g.after.right(), g.before.right());
            }
        }
        let restore = record.before();
        self.history.push_redo(record);
        Ok(Some(restore))
    }

    /// Reapply the most recently undone record.
    pub fn redo(&mut self, origin: Option<WatcherId>) -> Result<Option<Anchors>, EditRefusal> {
        if self.readonly {
            return Err(EditRefusal::ReadOnly);
        }
        let Some(record) = self.history.pop_redo() else {
            return Ok(None);
        };
        match &record {
            UndoRecord::Edit(e) => {
                let req = EditRequest::replay(e.old_span, &e.new_text, 1);
                self.modify_text(req.with_origin(origin))?;
            }
            UndoRecord::Group(g) => {
                for item in &g.items {
                    let req = EditRequest::replay(item.old_span, &item.new_text, 1);
                    self.modify_text(req.silent())?;
                }
                self.watchers
                    .notify_text(origin, g.before.left(), g.before.right(), g.after.right());
            }
        }
        let restore = record.after();
        self.history.push_undo_from_redo(record);
        Ok(Some(restore))
    }

    /// Whole-line span covering `[left, right]`: from the start of `left`'s line to the start of
    /// the line after `right` (or the document end).
    fn whole_line_span(&self, left: Point, right: Point) -> (Point, Point) {
        let left = Point::new(left.line, 0);
        let right = if right.index > 0 {
            if right.line + 1 < self.lines.len() {
                Point::new(right.line + 1, 0)
            } else {
                self.end_point()
            }
        } else {
            right
        };
        (left, right)
    }

    /// Where a whole-line span's right edge lands after its lines were rewritten. A span that
    /// ends inside the last line (`at_end`) still ends at the document end; any other span ends
    /// at a line start shifted by the change in line count.
    fn span_right_after(&self, right: Point, at_end: bool, old_count: usize) -> Point {
        if at_end {
            self.end_point()
        } else {
            let line = (right.line + self.lines.len()).saturating_sub(old_count);
            Point::new(line, 0)
        }
    }

    /// Rewrite every line touched by `[left, right]` through `f`, as one undo group. Returns the
    /// whole-line span after the rewrite.
    pub fn replace_lines(
        &mut self,
        left: Point,
        right: Point,
        mut f: impl FnMut(&str) -> String,
        origin: Option<WatcherId>,
    ) -> Result<(Point, Point), EditRefusal> {
        if self.readonly {
            return Err(EditRefusal::ReadOnly);
        }
        let (left, old_right) = self.whole_line_span(left.clamp_to(self), right.clamp_to(self));
        let at_end = old_right.index > 0;
        let old_count = self.lines.len();
        let stop = if at_end { old_count } else { old_right.line };
        self.begin_atomic(left, old_right);
        let mut line = left.line;
        let mut result = Ok(());
        while line < stop {
            let start = Point::new(line, 0);
            let end = Point::new(line, self.line_len(line));
            let old = self.get_text(start, end, false);
            let new = f(&old);
            if new != old
                && let Err(refusal) = self.modify_text(EditRequest::replace(start, end, &new).silent())
            {
                result = Err(refusal);
                break;
            }
            line += 1;
            self.memory_checkpoint(line);
        }
        let new_right = self.span_right_after(old_right, at_end, old_count);
        self.end_atomic(left, new_right);
        result?;
        debug!(target: "state.edit", from = left.line, to = new_right.line, "lines_replaced");
        self.watchers.notify_text(origin, left, old_right, new_right);
        Ok((left, new_right))
    }

    /// Keep only the lines touched by `[left, right]` for which `keep` returns `true`, as one undo
    /// group. Returns the span of the surviving lines.
    ///
    /// Dropping the document's last line also drops the break before it.
    pub fn filter_lines(
        &mut self,
        left: Point,
        right: Point,
        mut keep: impl FnMut(&str, &LineInfo) -> bool,
        origin: Option<WatcherId>,
    ) -> Result<(Point, Point), EditRefusal> {
        if self.readonly {
            return Err(EditRefusal::ReadOnly);
        }
        let (left, old_right) = self.whole_line_span(left.clamp_to(self), right.clamp_to(self));
        let at_end = old_right.index > 0;
        let old_count = self.lines.len();
        let mut stop = if at_end { old_count } else { old_right.line };
        self.begin_atomic(left, old_right);
        let mut line = left.line;
        let mut result = Ok(());
        while line < stop {
            let info = LineInfo {
                bookmark: self.lines[line].bookmark,
                modified: self.lines[line].modified,
            };
            let start = Point::new(line, 0);
            let end = Point::new(line, self.line_len(line));
            let text = self.get_text(start, end, false);
            if keep(&text, &info) {
                line += 1;
            } else {
                let (from, through) = if line + 1 < self.lines.len() {
                    (start, Point::new(line + 1, 0))
                } else if line > 0 {
                    (Point::new(line - 1, self.line_len(line - 1)), end)
                } else {
                    (start, end)
                };
                if let Err(refusal) = self.modify_text(EditRequest::replace(from, through, "").silent()) {
                    result = Err(refusal);
                    break;
                }
                stop -= 1;
            }
            self.memory_checkpoint(line);
        }
        let new_right = self.span_right_after(old_right, at_end, old_count);
        let left = left.clamp_to(self);
        self.end_atomic(left, new_right);
        result?;
        debug!(target: "state.edit", from = left.line, to = new_right.line, "lines_filtered");
        self.watchers.notify_text(origin, left, old_right, new_right);
        Ok((left, new_right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(doc: &Document) -> Vec<String> {
        (0..doc.line_count())
            .map(|i| format!("{}{}", doc.line_text(i), doc.lines()[i].ending.as_str()))
            .collect()
    }

    #[test]
    fn split_breaks_recognizes_all_terminators() {
        let pieces = split_breaks("a\r\nb\rc\nd");
        assert_eq!(
            pieces,
            vec![
                ("a", Some(LineEnding::Crlf)),
                ("b", Some(LineEnding::Cr)),
                ("c", Some(LineEnding::Lf)),
                ("d", None),
            ]
        );
        assert_eq!(split_breaks("x\n"), vec![("x", Some(LineEnding::Lf))]);
        assert!(split_breaks("").is_empty());
    }

    #[test]
    fn insert_and_undo_restore_lines_and_caret() {
        let mut doc = Document::from_text("abc\ndef\n");
        let out = doc
            .modify_text(EditRequest::insert(Point::new(0, 1), "X"))
            .unwrap();
        assert_eq!(out.cursor, Point::new(0, 2));
        assert_eq!(texts(&doc), vec!["aXbc\n", "def\n", ""]);
        assert_eq!(doc.mod_count(), ModCount::Dirty(1));

        let restore = doc.undo(None).unwrap().unwrap();
        assert_eq!(texts(&doc), vec!["abc\n", "def\n", ""]);
        assert_eq!(restore, Anchors::at(Point::new(0, 1)));
        assert_eq!(doc.mod_count(), ModCount::Clean);
        assert!(doc.lines().iter().all(|l| !l.modified));

        let after = doc.redo(None).unwrap().unwrap();
        assert_eq!(texts(&doc), vec!["aXbc\n", "def\n", ""]);
        assert_eq!(after, Anchors::at(Point::new(0, 2)));
        assert_eq!(doc.undo(None).unwrap(), Some(restore));
        assert_eq!(doc.undo(None).unwrap(), None);
    }

    #[test]
    fn multi_line_insert_uses_default_ending_and_keeps_tail_ending() {
        let mut doc = Document::from_text("head\r\ntail");
        doc.modify_text(EditRequest::insert(Point::new(1, 2), "1\n2\n"))
            .unwrap();
        assert_eq!(texts(&doc), vec!["head\r\n", "ta1\r\n", "2\r\n", "il"]);
    }

    #[test]
    fn delete_across_lines_keeps_tail_ending() {
        let mut doc = Document::from_text("one\ntwo\r\nthree");
        doc.modify_text(EditRequest::replace(Point::new(0, 1), Point::new(1, 2), ""))
            .unwrap();
        assert_eq!(texts(&doc), vec!["oo\r\n", "three"]);
        doc.modify_text(EditRequest::replace(Point::origin(), doc.end_point(), ""))
            .unwrap();
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.text(), "");
    }

    #[test]
    fn bookmark_follows_line_pushed_down_by_insert() {
        let mut doc = Document::from_text("a\nb\n");
        doc.toggle_bookmark(0, &[1, 0], None);
        doc.modify_text(EditRequest::insert(Point::new(0, 0), "new\n"))
            .unwrap();
        assert_eq!(doc.lines()[0].bookmark, 0);
        assert_eq!(doc.lines()[1].bookmark, 1);
    }

    #[test]
    fn block_paste_replaces_columns_and_clears_extra_rows() {
        let mut doc = Document::from_text("0123456\nabcdefg\nABCDEFG\n");
        let sel = core_text::Selection::new(Point::new(0, 2), Point::new(2, 5), true);
        let out = doc
            .modify_text(EditRequest::selection(&sel, "XY\nZ").block_text())
            .unwrap();
        assert_eq!(texts(&doc), vec!["01XY56\n", "abZfg\n", "ABFG\n", ""]);
        assert_eq!(out.cursor, Point::new(0, 2));

        doc.undo(None).unwrap();
        assert_eq!(doc.text(), "0123456\nabcdefg\nABCDEFG\n");
    }

    #[test]
    fn block_paste_past_end_appends_terminated_rows() {
        let mut doc = Document::from_text("ab\ncd");
        doc.modify_text(EditRequest::insert(Point::new(1, 1), "1\n2\n3").block_text())
            .unwrap();
        assert_eq!(texts(&doc), vec!["ab\n", "c1d\n", "2\n", "3"]);
        doc.undo(None).unwrap();
        assert_eq!(doc.text(), "ab\ncd");
    }

    #[test]
    fn shape_mismatches_and_readonly_are_refused() {
        let mut doc = Document::from_text("abc");
        let linear = core_text::Selection::new(Point::new(0, 0), Point::new(0, 2), false);
        assert_eq!(
            doc.modify_text(EditRequest::selection(&linear, "x").block_text()),
            Err(EditRefusal::BlockShapeMismatch { block_text: true })
        );
        let block = core_text::Selection::new(Point::new(0, 0), Point::new(0, 2), true);
        assert_eq!(
            doc.modify_text(EditRequest::selection(&block, "x")),
            Err(EditRefusal::BlockShapeMismatch { block_text: false })
        );
        doc.set_readonly(true);
        assert_eq!(
            doc.modify_text(EditRequest::insert(Point::origin(), "x")),
            Err(EditRefusal::ReadOnly)
        );
        assert_eq!(doc.text(), "abc");
        assert_eq!(doc.mod_count(), ModCount::Clean);
        assert!(
            doc.modify_text(EditRequest::insert(Point::origin(), "x").ignore_readonly())
                .is_ok()
        );
    }

    #[test]
    fn edit_after_undoing_past_save_is_sticky_unknown() {
        let mut doc = Document::from_text("abc");
        doc.modify_text(EditRequest::insert(Point::new(0, 3), "d"))
            .unwrap();
        doc.mark_saved(None);
        doc.undo(None).unwrap();
        assert_eq!(doc.mod_count(), ModCount::Dirty(-1));
        doc.modify_text(EditRequest::insert(Point::new(0, 0), "z"))
            .unwrap();
        assert_eq!(doc.mod_count(), ModCount::DirtyUnknown);
        doc.undo(None).unwrap();
        assert_eq!(doc.mod_count(), ModCount::DirtyUnknown);
    }

    #[test]
    fn replace_lines_is_one_undo_step() {
        let mut doc = Document::from_text("a\nb\nc\n");
        let span = doc
            .replace_lines(Point::new(0, 0), Point::new(1, 1), |s| format!("  {s}"), None)
            .unwrap();
        assert_eq!(span, (Point::new(0, 0), Point::new(2, 0)));
        assert_eq!(doc.text(), "  a\n  b\nc\n");
        assert_eq!(doc.history().undo_depth(), 1);
        let restore = doc.undo(None).unwrap().unwrap();
        assert_eq!(doc.text(), "a\nb\nc\n");
        assert_eq!(restore, Anchors::new(Point::new(0, 0), Point::new(2, 0)));
        doc.redo(None).unwrap();
        assert_eq!(doc.text(), "  a\n  b\nc\n");
    }

    #[test]
    fn filter_lines_drops_rejected_lines() {
        let mut doc = Document::from_text("keep\ndrop\nkeep too\ndrop\ntail");
        let span = doc
            .filter_lines(Point::new(0, 0), Point::new(3, 2), |s, _| !s.starts_with("drop"), None)
            .unwrap();
        assert_eq!(doc.text(), "keep\nkeep too\ntail");
        assert_eq!(span, (Point::new(0, 0), Point::new(2, 0)));
        doc.undo(None).unwrap();
        assert_eq!(doc.text(), "keep\ndrop\nkeep too\ndrop\ntail");
    }

    #[derive(Default)]
    struct Changes(std::cell::RefCell<Vec<(Point, Point, Point)>>);

    impl crate::DocumentWatcher for Changes {
        fn on_text_changed(&self, _origin: Option<crate::WatcherId>, l: Point, o: Point, n: Point) {
            self.0.borrow_mut().push((l, o, n));
        }
    }

    fn watched(doc: &mut Document) -> std::rc::Rc<Changes> {
        let changes = std::rc::Rc::new(Changes::default());
        let dyn_changes: std::rc::Rc<dyn crate::DocumentWatcher> = changes.clone();
        doc.attach_watcher(std::rc::Rc::downgrade(&dyn_changes));
        changes
    }

    #[test]
    fn replace_lines_through_last_line_reports_the_new_edge() {
        let mut doc = Document::from_text("\ta\n\tbbbb");
        let changes = watched(&mut doc);
        let span = doc
            .replace_lines(Point::new(0, 0), Point::new(1, 5), |s| s.trim_start_matches('\t').to_string(), None)
            .unwrap();
        assert_eq!(doc.text(), "a\nbbbb");
        assert_eq!(span, (Point::new(0, 0), Point::new(1, 4)));
        doc.undo(None).unwrap();
        doc.redo(None).unwrap();
        assert_eq!(
            *changes.0.borrow(),
            vec![
                (Point::new(0, 0), Point::new(1, 5), Point::new(1, 4)),
                (Point::new(0, 0), Point::new(1, 4), Point::new(1, 5)),
                (Point::new(0, 0), Point::new(1, 5), Point::new(1, 4)),
            ]
        );
    }

    #[test]
    fn filter_lines_dropping_the_last_line_removes_its_break() {
        let mut doc = Document::from_text("a\nb\nzap");
        let changes = watched(&mut doc);
        let span = doc
            .filter_lines(Point::new(1, 0), Point::new(2, 3), |s, _| s != "zap", None)
            .unwrap();
        assert_eq!(doc.text(), "a\nb");
        assert_eq!(doc.line_count(), 2);
        assert_eq!(span, (Point::new(1, 0), Point::new(1, 1)));
        assert_eq!(
            *changes.0.borrow(),
            vec![(Point::new(1, 0), Point::new(2, 3), Point::new(1, 1))]
        );
        doc.undo(None).unwrap();
        assert_eq!(doc.text(), "a\nb\nzap");
    }

    #[test]
    fn undo_restores_mixed_endings_exactly() {
        let mut doc = Document::from_text("a\r\nb\rc\nd");
        doc.modify_text(EditRequest::replace(Point::new(0, 0), Point::new(3, 1), ""))
            .unwrap();
        assert_eq!(doc.text(), "");
        doc.undo(None).unwrap();
        assert_eq!(doc.text(), "a\r\nb\rc\nd");
    }
}
