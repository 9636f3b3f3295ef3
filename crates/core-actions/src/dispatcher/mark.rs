//! Bookmark toggling and jumps to the next marked or modified line.

use super::DispatchResult;
use crate::view::{EditorView, Notice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SeekKind {
    Bookmark,
    Modified,
}

/// Step the caret line's bookmark through `cycle`.
pub(crate) fn handle_bookmark(view: &mut EditorView, cycle: &[u8]) -> DispatchResult {
    let line = view.cursor().line;
    let id = view.id();
    let tag = view.document_mut().toggle_bookmark(line, cycle, Some(id));
    tracing::trace!(target: "actions.dispatch", op = "bookmark", line, ?tag, "bookmark");
    match tag {
        Some(_) => DispatchResult::dirty(),
        None => DispatchResult::unhandled(),
    }
}

pub(crate) fn handle_seek(view: &mut EditorView, kind: SeekKind, forward: bool, select: bool) -> DispatchResult {
    let found = match kind {
        SeekKind::Bookmark => view.seek(forward, |l| l.bookmark != 0),
        SeekKind::Modified => view.seek(forward, |l| l.modified),
    };
    let Some(target) = found else {
        view.notice(match kind {
            SeekKind::Bookmark => Notice::BookmarkNotFound,
            SeekKind::Modified => Notice::ModifiedLineNotFound,
        });
        return DispatchResult::clean();
    };
    tracing::trace!(target: "actions.dispatch", op = "seek", ?kind, forward, line = target.line, "seek");
    if select {
        let anchor = view.selection().anchor();
        view.set_selection(anchor, target, None, true);
    } else {
        view.set_cursor(target, true);
    }
    DispatchResult::dirty()
}
