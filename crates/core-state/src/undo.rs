use std::collections::VecDeque;
use std::fmt;

use core_text::{LineEnding, Point};
use tracing::trace;

use crate::edit::split_breaks;

/// Default number of records retained in undo history.
pub const UNDO_CAPACITY_DEFAULT: usize = 1000;

/// Anchor/cursor pair restored when a record is undone or redone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Anchors {
    pub anchor: Point,
    pub cursor: Point,
}

impl Anchors {
    pub const fn new(anchor: Point, cursor: Point) -> Self {
        Self { anchor, cursor }
    }

    pub const fn at(point: Point) -> Self {
        Self::new(point, point)
    }

    pub fn left(&self) -> Point {
        self.anchor.min(self.cursor)
    }

    pub fn right(&self) -> Point {
        self.anchor.max(self.cursor)
    }
}

/// Text captured for undo with each line break kept exactly as it was.
///
/// A plain string cannot tell a CR-terminated line followed by an empty LF-terminated line from a
/// single CRLF break; replaying pieces can.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapturedText(Vec<(String, Option<LineEnding>)>);

impl CapturedText {
    pub fn from_text(text: &str) -> Self {
        Self(
            split_breaks(text)
                .into_iter()
                .map(|(s, brk)| (s.to_string(), brk))
                .collect(),
        )
    }

    pub(crate) fn push(&mut self, text: &str, brk: Option<LineEnding>) {
        if text.is_empty() && brk.is_none() {
            return;
        }
        self.0.push((text.to_string(), brk));
    }

    pub fn pieces(&self) -> impl Iterator<Item = (&str, Option<LineEnding>)> + '_ {
        self.0.iter().map(|(s, brk)| (s.as_str(), *brk))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CapturedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (text, brk) in &self.0 {
            f.write_str(text)?;
            f.write_str(brk.map_or("", LineEnding::as_str))?;
        }
        Ok(())
    }
}

/// One primitive edit: `old_text` at `old_span` became `new_text` at `new_span`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRecord {
    pub old_text: CapturedText,
    pub old_span: (Point, Point),
    pub new_text: CapturedText,
    pub new_span: (Point, Point),
    pub before: Anchors,
    pub after: Anchors,
}

/// Several primitive edits undone and redone as one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicGroup {
    pub before: Anchors,
    pub after: Anchors,
    pub items: Vec<EditRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoRecord {
    Edit(EditRecord),
    Group(AtomicGroup),
}

impl UndoRecord {
    pub fn before(&self) -> Anchors {
        match self {
            UndoRecord::Edit(e) => e.before,
            UndoRecord::Group(g) => g.before,
        }
    }

    pub fn after(&self) -> Anchors {
        match self {
            UndoRecord::Edit(e) => e.after,
            UndoRecord::Group(g) => g.after,
        }
    }

    /// Number of primitive edits, i.e. how far undoing this record moves the modification count.
    pub fn steps(&self) -> usize {
        match self {
            UndoRecord::Edit(_) => 1,
            UndoRecord::Group(g) => g.items.len(),
        }
    }
}

struct OpenGroup {
    before: Anchors,
    items: Vec<EditRecord>,
    depth: usize,
}

/// Undo/redo stacks plus the atomic group currently being collected.
///
/// New records clear the redo stack. When `capacity` is set, the oldest undo records are dropped
/// once the stack grows past it.
pub struct UndoHistory {
    undo: VecDeque<UndoRecord>,
    redo: Vec<UndoRecord>,
    open: Option<OpenGroup>,
    capacity: Option<usize>,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(Some(UNDO_CAPACITY_DEFAULT))
    }
}

impl UndoHistory {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            open: None,
            capacity,
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
    pub fn is_group_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn set_capacity(&mut self, capacity: Option<usize>) {
        self.capacity = capacity;
        self.trim();
    }

    /// Record a primitive edit, into the open group if there is one.
    pub fn record(&mut self, edit: EditRecord) {
        self.redo.clear();
        if let Some(group) = &mut self.open {
            group.items.push(edit);
            trace!(target: "state.undo", items = group.items.len(), "group_item_recorded");
            return;
        }
        self.push_undo(UndoRecord::Edit(edit));
        trace!(target: "state.undo", undo_depth = self.undo.len(), "edit_recorded");
    }

    /// Start collecting edits into one atomic record. Nested calls join the outer group.
    pub fn begin_group(&mut self, before: Anchors) {
        match &mut self.open {
            Some(group) => group.depth += 1,
            None => {
                self.open = Some(OpenGroup {
                    before,
                    items: Vec::new(),
                    depth: 1,
                })
            }
        }
        trace!(target: "state.undo", "group_begin");
    }

    /// Close the innermost group. Returns `true` when the outermost group closed with at least
    /// one edit and was pushed.
    pub fn end_group(&mut self, after: Anchors) -> bool {
        let Some(group) = &mut self.open else {
            return false;
        };
        if group.depth > 1 {
            group.depth -= 1;
            return false;
        }
        let Some(group) = self.open.take() else {
            return false;
        };
        if group.items.is_empty() {
            trace!(target: "state.undo", "group_empty_skipped");
            return false;
        }
        let items = group.items.len();
        self.push_undo(UndoRecord::Group(AtomicGroup {
            before: group.before,
            after,
            items: group.items,
        }));
        trace!(target: "state.undo", items, undo_depth = self.undo.len(), "group_end");
        true
    }

    pub fn pop_undo(&mut self) -> Option<UndoRecord> {
        let rec = self.undo.pop_back();
        if rec.is_some() {
            trace!(target: "state.undo", undo_depth = self.undo.len(), redo_depth = self.redo.len(), "undo_pop");
        }
        rec
    }

    pub fn pop_redo(&mut self) -> Option<UndoRecord> {
        let rec = self.redo.pop();
        if rec.is_some() {
            trace!(target: "state.undo", redo_depth = self.redo.len(), undo_depth = self.undo.len(), "redo_pop");
        }
        rec
    }

    /// Park an undone record for redo.
    pub fn push_redo(&mut self, record: UndoRecord) {
        self.redo.push(record);
        trace!(target: "state.undo", redo_depth = self.redo.len(), "redo_push_from_undo");
    }

    /// Return a redone record to the undo stack without touching the redo stack.
    pub fn push_undo_from_redo(&mut self, record: UndoRecord) {
        self.push_undo(record);
        trace!(target: "state.undo", undo_depth = self.undo.len(), "undo_push_from_redo");
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.open = None;
    }

    fn push_undo(&mut self, record: UndoRecord) {
        self.undo.push_back(record);
        self.trim();
    }

    fn trim(&mut self) {
        let Some(cap) = self.capacity else { return };
        while self.undo.len() > cap {
            let _ = self.undo.pop_front();
            trace!(target: "state.undo", "undo_stack_trimmed");
        }
    }
}
