//! Caret and selection movement.
//!
//! Plain moves collapse the selection; `select` moves keep the anchor and carry the cursor.
//! Vertical moves aim at the view's ideal column and leave it untouched so a column survives
//! passing through short lines.

use super::DispatchResult;
use crate::view::EditorView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MotionKind {
    Left,
    Right,
    WordLeft,
    WordRight,
    TabLeft,
    LineBegin,
    LineEnd,
    LineFirstGraph,
    Up,
    Down,
    DocumentBegin,
    DocumentEnd,
    Bracket,
}

pub(crate) fn handle_motion(kind: MotionKind, select: bool, view: &mut EditorView) -> DispatchResult {
    let before = view.selection();
    let cursor = before.cursor();
    let block = select && before.block_mode;
    let ideal = view.ideal_column();
    let target = {
        let doc = view.document();
        let m = doc.motion();
        match kind {
            MotionKind::Left if !select && !before.is_empty() => before.left,
            MotionKind::Right if !select && !before.is_empty() => before.right,
            MotionKind::Left => m.left(cursor, block),
            MotionKind::Right => m.right(cursor, block),
            MotionKind::WordLeft => m.word_left(cursor, false),
            MotionKind::WordRight => m.word_right(cursor, false),
            MotionKind::TabLeft => m.tab_left(cursor),
            MotionKind::LineBegin => m.line_begin(cursor),
            MotionKind::LineEnd => m.line_end(cursor),
            MotionKind::LineFirstGraph => m.line_first_graph(cursor),
            MotionKind::Up => m.up(cursor, 1, ideal, block),
            MotionKind::Down => m.down(cursor, 1, ideal, block),
            MotionKind::DocumentBegin => m.document_begin(),
            MotionKind::DocumentEnd => m.document_end(),
            MotionKind::Bracket => m.corresponding_bracket(cursor),
        }
    };
    if kind == MotionKind::LineFirstGraph && target == cursor {
        return DispatchResult::unhandled();
    }
    let update_ideal = !matches!(kind, MotionKind::Up | MotionKind::Down);
    if select {
        view.set_selection(before.anchor(), target, None, update_ideal);
    } else {
        view.set_cursor(target, update_ideal);
    }
    let after = view.selection();
    tracing::trace!(target: "actions.dispatch", op = "motion", ?kind, select, line = after.cursor().line, index = after.cursor().index, "motion");
    if after == before {
        DispatchResult::clean()
    } else {
        DispatchResult::dirty()
    }
}

pub(crate) fn handle_select_document(view: &mut EditorView) -> DispatchResult {
    let (begin, end) = {
        let doc = view.document();
        let m = doc.motion();
        (m.document_begin(), m.document_end())
    };
    view.set_selection(begin, end, Some(false), true);
    DispatchResult::dirty()
}

pub(crate) fn handle_select_cancel(view: &mut EditorView) -> DispatchResult {
    let before = view.selection();
    view.set_cursor(before.cursor(), true);
    if view.selection() == before {
        DispatchResult::clean()
    } else {
        DispatchResult::dirty()
    }
}

/// Switch the current selection to block mode without moving either end.
pub(crate) fn handle_select_block(view: &mut EditorView) -> DispatchResult {
    let before = view.selection();
    view.set_selection(before.anchor(), before.cursor(), Some(true), true);
    tracing::trace!(target: "actions.dispatch", op = "select_block", "select_block");
    DispatchResult::dirty()
}
