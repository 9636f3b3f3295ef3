//! Copy, cut, paste.
//!
//! With nothing selected, copy and cut take the caret's whole line including its break.

use core_text::Point;

use super::{CommandContext, DispatchResult};
use crate::clipboard::ClipText;
use crate::view::EditorView;

fn caret_line_span(view: &EditorView) -> (Point, Point) {
    let cursor = view.cursor();
    let doc = view.document();
    let m = doc.motion();
    let left = m.line_begin(cursor);
    (left, m.right(m.line_end(left), false))
}

pub(crate) fn handle_copy(view: &mut EditorView, ctx: &mut CommandContext<'_>, cut: bool) -> DispatchResult {
    let selection = view.selection();
    if selection.is_empty() {
        let (left, right) = caret_line_span(view);
        let text = view.document().get_text(left, right, false);
        tracing::trace!(target: "actions.dispatch", op = if cut { "cut" } else { "copy" }, line = left.line, "copy_line");
        ctx.clipboard.set(ClipText { text, block: false });
        if cut && left != right {
            return if view.modify(right, left, "", false) {
                DispatchResult::edited()
            } else {
                DispatchResult::clean()
            };
        }
        return DispatchResult::clean();
    }

    let text = view.selected_text();
    tracing::trace!(target: "actions.dispatch", op = if cut { "cut" } else { "copy" }, block = selection.block_mode, chars = text.chars().count(), "copy");
    ctx.clipboard.set(ClipText {
        text,
        block: selection.block_mode,
    });
    if cut && view.replace_selection("", false) {
        DispatchResult::edited()
    } else {
        DispatchResult::clean()
    }
}

/// Paste at the selection. Block-shaped clips, and any paste into a block selection, go in as
/// rectangles.
pub(crate) fn handle_paste(view: &mut EditorView, ctx: &mut CommandContext<'_>) -> DispatchResult {
    let Some(clip) = ctx.clipboard.get() else {
        return DispatchResult::unhandled();
    };
    let block = view.selection().block_mode || clip.block;
    tracing::trace!(target: "actions.dispatch", op = "paste", block, chars = clip.text.chars().count(), "paste");
    if view.replace_selection(&clip.text, block) {
        DispatchResult::edited()
    } else {
        DispatchResult::clean()
    }
}
