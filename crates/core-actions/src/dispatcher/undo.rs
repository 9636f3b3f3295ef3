//! Undo / redo dispatch. The document replays history; the view restores the recorded anchors.

use core_text::LineTable;

use super::DispatchResult;
use crate::view::EditorView;

pub(crate) fn handle_undo(view: &mut EditorView) -> DispatchResult {
    let before = view.document().line_count();
    if view.undo() {
        let after = view.document().line_count();
        tracing::trace!(target: "actions.dispatch", op = "undo", lines_changed = (before != after), "undo");
        DispatchResult::edited()
    } else {
        DispatchResult::clean()
    }
}

pub(crate) fn handle_redo(view: &mut EditorView) -> DispatchResult {
    let before = view.document().line_count();
    if view.redo() {
        let after = view.document().line_count();
        tracing::trace!(target: "actions.dispatch", op = "redo", lines_changed = (before != after), "redo");
        DispatchResult::edited()
    } else {
        DispatchResult::clean()
    }
}
