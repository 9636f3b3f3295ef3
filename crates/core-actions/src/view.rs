//! A view onto a shared document: selection, ideal column, and the notices a front end shows.
//!
//! Several views may watch one document. Each registers its [`ViewState`] as a weak watcher, so
//! edits made through another view (or directly on the document) shift this view's selection:
//! points before the change stay, points inside it collapse to its left edge, points after it
//! move with the text.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use core_config::Config;
use core_state::{Document, DocumentWatcher, EditRefusal, EditRequest, SearchHit, SearchQuery, WatcherId};
use core_text::{LineTable, Point, Selection};
use tracing::{debug, trace};

/// Something the front end should tell the user about. Commands never fail loudly; they leave a
/// notice and report themselves as handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Refused(EditRefusal),
    NothingToUndo,
    NothingToRedo,
    NoSearch,
    NotFound(String),
    ModifiedLineNotFound,
    BookmarkNotFound,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::Refused(refusal) => write!(f, "{refusal}"),
            Notice::NothingToUndo => f.write_str("nothing to undo"),
            Notice::NothingToRedo => f.write_str("nothing to redo"),
            Notice::NoSearch => f.write_str("no search text"),
            Notice::NotFound(what) => write!(f, "not found: {what}"),
            Notice::ModifiedLineNotFound => f.write_str("no modified line"),
            Notice::BookmarkNotFound => f.write_str("no bookmark"),
        }
    }
}

/// Move `p` across a change that replaced `[left, old_right)` with text ending at `new_right`.
pub fn adjust_point(p: Point, left: Point, old_right: Point, new_right: Point) -> Point {
    if p < left {
        p
    } else if p < old_right {
        left
    } else {
        let line = p.line - old_right.line + new_right.line;
        let index = if p.line == old_right.line {
            p.index - old_right.index + new_right.index
        } else {
            p.index
        };
        Point::new(line, index)
    }
}

/// The part of a view the document can reach while it is being mutated.
#[derive(Default)]
pub(crate) struct ViewState {
    id: Cell<Option<WatcherId>>,
    selection: Cell<Selection>,
}

impl DocumentWatcher for ViewState {
    fn on_text_changed(&self, origin: Option<WatcherId>, left: Point, old_right: Point, new_right: Point) {
        if origin.is_some() && origin == self.id.get() {
            return;
        }
        let mut selection = self.selection.get();
        let anchor = adjust_point(selection.anchor(), left, old_right, new_right);
        let cursor = adjust_point(selection.cursor(), left, old_right, new_right);
        selection.set(anchor, cursor);
        self.selection.set(selection);
        trace!(target: "actions.dispatch", ?anchor, ?cursor, "view_adjusted");
    }
}

pub struct EditorView {
    doc: Rc<RefCell<Document>>,
    state: Rc<ViewState>,
    id: WatcherId,
    ideal_column: usize,
    search: Option<SearchQuery>,
    notices: Vec<Notice>,
}

impl EditorView {
    /// Open a view on `doc` with the caret at the document start.
    pub fn new(doc: Rc<RefCell<Document>>) -> Self {
        let state = Rc::new(ViewState::default());
        let weak: std::rc::Weak<dyn DocumentWatcher> = {
            let as_dyn: Rc<dyn DocumentWatcher> = state.clone();
            Rc::downgrade(&as_dyn)
        };
        let id = doc.borrow_mut().attach_watcher(weak);
        state.id.set(Some(id));
        debug!(target: "actions.dispatch", ?id, "view_attached");
        Self {
            doc,
            state,
            id,
            ideal_column: 0,
            search: None,
            notices: Vec::new(),
        }
    }

    pub fn id(&self) -> WatcherId {
        self.id
    }

    pub fn document(&self) -> Ref<'_, Document> {
        self.doc.borrow()
    }

    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.doc.borrow_mut()
    }

    pub fn shared_document(&self) -> Rc<RefCell<Document>> {
        Rc::clone(&self.doc)
    }

    /// Take editing conventions and undo depth from `config`.
    pub fn apply_config(&self, config: &Config) {
        let mut doc = self.doc.borrow_mut();
        let mode = doc
            .mode()
            .clone()
            .with_tab_width(config.effective_tab_width())
            .with_tab_by_space(config.file.edit.tab_by_space);
        doc.set_mode(mode);
        doc.set_undo_capacity(config.undo_capacity());
    }

    pub fn selection(&self) -> Selection {
        self.state.selection.get()
    }

    pub fn cursor(&self) -> Point {
        self.selection().cursor()
    }

    pub fn ideal_column(&self) -> usize {
        self.ideal_column
    }

    /// Replace the selection. `block_mode` keeps the current flag when `None`.
    pub fn set_selection(&mut self, anchor: Point, cursor: Point, block_mode: Option<bool>, update_ideal_column: bool) {
        let mut selection = self.selection();
        if let Some(block) = block_mode {
            selection.block_mode = block;
        }
        selection.set(anchor, cursor);
        self.state.selection.set(selection);
        if update_ideal_column {
            self.ideal_column = self.doc.borrow().motion().column_of(cursor);
        }
    }

    /// Collapse the selection to a caret at `cursor`, pulled back to the end of its line.
    pub fn set_cursor(&mut self, cursor: Point, update_ideal_column: bool) {
        let cursor = cursor.clamp_to(&*self.doc.borrow());
        self.set_selection(cursor, cursor, Some(false), update_ideal_column);
    }

    pub fn notice(&mut self, notice: Notice) {
        debug!(target: "actions.dispatch", %notice, "notice");
        self.notices.push(notice);
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn search_query(&self) -> Option<&SearchQuery> {
        self.search.as_ref()
    }

    pub fn set_search_query(&mut self, query: Option<SearchQuery>) {
        self.search = query;
    }

    /// Replace `[anchor, cursor]` with `text` under the current selection's shape rules and put
    /// the caret after the inserted text. Returns `false` (with a notice) when the edit was
    /// refused.
    pub fn modify(&mut self, anchor: Point, cursor: Point, text: &str, text_block_mode: bool) -> bool {
        let selection = self.selection();
        let mut req = EditRequest::replace(anchor, cursor, text).with_origin(Some(self.id));
        req.selection_block_mode = selection.block_mode;
        req.selection_empty = selection.is_empty();
        req.text_block_mode = text_block_mode;
        let result = self.doc.borrow_mut().modify_text(req);
        match result {
            Ok(outcome) => {
                self.set_cursor(outcome.cursor, true);
                true
            }
            Err(refusal) => {
                self.notice(Notice::Refused(refusal));
                false
            }
        }
    }

    /// Replace the selection with `text`.
    pub fn replace_selection(&mut self, text: &str, text_block_mode: bool) -> bool {
        let selection = self.selection();
        self.modify(selection.anchor(), selection.cursor(), text, text_block_mode)
    }

    /// Text under the selection, block-shaped in block mode.
    pub fn selected_text(&self) -> String {
        let selection = self.selection();
        self.doc
            .borrow()
            .get_text(selection.left, selection.right, selection.block_mode)
    }

    /// Rewrite every line the selection touches through `f` and select the processed lines.
    pub fn replace_lines(&mut self, f: impl FnMut(&str) -> String) -> bool {
        let selection = self.selection();
        let result = self
            .doc
            .borrow_mut()
            .replace_lines(selection.left, selection.right, f, Some(self.id));
        match result {
            Ok((left, right)) => {
                self.set_selection(left, right, Some(false), true);
                true
            }
            Err(refusal) => {
                self.notice(Notice::Refused(refusal));
                false
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        let result = self.doc.borrow_mut().undo(Some(self.id));
        match result {
            Ok(Some(anchors)) => {
                self.set_selection(anchors.anchor, anchors.cursor, None, true);
                true
            }
            Ok(None) => {
                self.notice(Notice::NothingToUndo);
                false
            }
            Err(refusal) => {
                self.notice(Notice::Refused(refusal));
                false
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        let result = self.doc.borrow_mut().redo(Some(self.id));
        match result {
            Ok(Some(anchors)) => {
                self.set_selection(anchors.anchor, anchors.cursor, None, true);
                true
            }
            Ok(None) => {
                self.notice(Notice::NothingToRedo);
                false
            }
            Err(refusal) => {
                self.notice(Notice::Refused(refusal));
                false
            }
        }
    }

    /// Search with the view's query from the selection edge in the given direction and select
    /// the hit with the caret at its start.
    pub fn search(&mut self, forward: bool) -> Option<SearchHit> {
        let Some(query) = self.search.clone() else {
            self.notice(Notice::NoSearch);
            return None;
        };
        let selection = self.selection();
        let from = if forward { selection.right } else { selection.left };
        let hit = self.doc.borrow_mut().search(&query, from, forward, false);
        match hit {
            Some(hit) => {
                self.set_selection(hit.end_point(), hit.start_point(), Some(false), true);
                Some(hit)
            }
            None => {
                self.notice(Notice::NotFound(query.text().to_string()));
                None
            }
        }
    }

    /// Move the caret to the start of the nearest line after (or before) the cursor's line
    /// satisfying `pred`.
    pub fn seek(&mut self, forward: bool, pred: impl FnMut(&core_text::Line) -> bool) -> Option<Point> {
        let from = self.cursor().line;
        let line = self.doc.borrow_mut().seek_line(from, forward, pred)?;
        Some(Point::new(line, 0))
    }

    pub fn line_count(&self) -> usize {
        self.doc.borrow().line_count()
    }
}

impl Drop for EditorView {
    fn drop(&mut self) {
        if let Ok(mut doc) = self.doc.try_borrow_mut() {
            doc.detach_watcher(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_after_the_change_follow_the_text() {
        let left = Point::new(1, 2);
        let old_right = Point::new(2, 3);
        let new_right = Point::new(1, 5);
        assert_eq!(adjust_point(Point::new(0, 9), left, old_right, new_right), Point::new(0, 9));
        assert_eq!(adjust_point(Point::new(2, 0), left, old_right, new_right), left);
        assert_eq!(adjust_point(Point::new(2, 4), left, old_right, new_right), Point::new(1, 6));
        assert_eq!(adjust_point(Point::new(4, 1), left, old_right, new_right), Point::new(3, 1));
    }

    #[test]
    fn insertion_at_a_point_pushes_it_along() {
        let at = Point::new(0, 3);
        assert_eq!(adjust_point(at, at, at, Point::new(1, 0)), Point::new(1, 0));
        assert_eq!(adjust_point(Point::new(0, 2), at, at, Point::new(1, 0)), Point::new(0, 2));
    }
}
