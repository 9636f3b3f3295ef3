//! Text mutation commands: newline, tab, deletion, indentation.
//!
//! With a non-empty selection every delete removes the selection. With a caret the span is
//! computed from the caret and handed to the view with the far end first, so undo puts the caret
//! back where the deleted text started.

use core_text::{LineTable, Point};

use super::DispatchResult;
use crate::view::EditorView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeleteKind {
    CharLeft,
    CharRight,
    WordLeft,
    WordRight,
    /// The word around the caret.
    Word,
    /// The caret's whole line; its break too when the line is empty.
    Line,
    LineLeft,
    LineRight,
}

fn edited_if(applied: bool) -> DispatchResult {
    if applied {
        DispatchResult::edited()
    } else {
        DispatchResult::clean()
    }
}

pub(crate) fn handle_insert_return(view: &mut EditorView, auto_indent: bool) -> DispatchResult {
    let mut text = String::from("\n");
    if auto_indent {
        let left = view.selection().left;
        let line = view.document().line_text(left.line).into_owned();
        text.extend(
            line.chars()
                .take(left.index)
                .take_while(|c| matches!(c, ' ' | '\t')),
        );
    }
    tracing::trace!(target: "actions.dispatch", op = "insert_return", indent = text.len() - 1, "insert");
    edited_if(view.replace_selection(&text, false))
}

pub(crate) fn handle_insert_tab(view: &mut EditorView) -> DispatchResult {
    let left = view.selection().left;
    let text = {
        let doc = view.document();
        let column = doc.motion().column_of(left);
        doc.mode().tab_text(column)
    };
    edited_if(view.replace_selection(&text, false))
}

pub(crate) fn handle_delete(kind: DeleteKind, view: &mut EditorView) -> DispatchResult {
    let selection = view.selection();
    if !selection.is_empty() {
        tracing::trace!(target: "actions.dispatch", op = "delete", ?kind, selection = true, "delete");
        return edited_if(view.replace_selection("", false));
    }
    let cursor = selection.cursor();
    // (anchor, cursor); undo restores the caret to the cursor end.
    let (anchor, caret): (Point, Point) = {
        let doc = view.document();
        let m = doc.motion();
        match kind {
            DeleteKind::CharLeft => (m.left(cursor, false), cursor),
            DeleteKind::CharRight => (m.right(cursor, false), cursor),
            DeleteKind::WordLeft => (m.word_left(cursor, true), cursor),
            DeleteKind::WordRight => (m.word_right(cursor, true), cursor),
            DeleteKind::Word => {
                let right = m.word_right(cursor, true);
                (right, m.word_left(right, true))
            }
            DeleteKind::Line => {
                let left = m.line_begin(cursor);
                let right = m.line_end(cursor);
                let right = if left == right { m.right(right, false) } else { right };
                (right, left)
            }
            DeleteKind::LineLeft => {
                let left = m.line_begin(cursor);
                let left = if left == cursor { m.left(left, false) } else { left };
                (left, cursor)
            }
            DeleteKind::LineRight => {
                let right = m.line_end(cursor);
                let right = if right == cursor { m.right(right, false) } else { right };
                (right, cursor)
            }
        }
    };
    if anchor == caret {
        return DispatchResult::clean();
    }
    tracing::trace!(target: "actions.dispatch", op = "delete", ?kind, from = ?anchor.min(caret), to = ?anchor.max(caret), "delete");
    edited_if(view.modify(anchor, caret, "", false))
}

/// Remove one level of indentation: up to `tab_width` spaces, or spaces up to and including the
/// first tab.
fn unindent(s: &str, tab_width: usize) -> String {
    let bytes = s.as_bytes();
    let mut cut = 0;
    for i in 0..=tab_width {
        cut = i;
        match bytes.get(i) {
            Some(b' ') => {}
            Some(b'\t') => {
                cut = i + 1;
                break;
            }
            _ => break,
        }
    }
    s[cut..].to_string()
}

pub(crate) fn handle_indent(view: &mut EditorView, indent: bool) -> DispatchResult {
    let selection = view.selection();
    if selection.left.line == selection.right.line {
        return DispatchResult::unhandled();
    }
    let (tab_width, tab_by_space) = {
        let doc = view.document();
        (doc.mode().tab_width, doc.mode().tab_by_space)
    };
    let unit = if tab_by_space {
        " ".repeat(tab_width)
    } else {
        "\t".to_string()
    };
    let applied = if indent {
        view.replace_lines(|s| {
            if s.trim_start_matches([' ', '\t']).is_empty() {
                s.to_string()
            } else {
                format!("{unit}{s}")
            }
        })
    } else {
        view.replace_lines(|s| unindent(s, tab_width))
    };
    tracing::trace!(target: "actions.dispatch", op = if indent { "indent" } else { "unindent" }, from = selection.left.line, to = selection.right.line, "indent");
    edited_if(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unindent_strips_one_level() {
        assert_eq!(unindent("    x", 4), "x");
        assert_eq!(unindent("      x", 4), "  x");
        assert_eq!(unindent("  \tx", 4), "x");
        assert_eq!(unindent("\t\tx", 4), "\tx");
        assert_eq!(unindent("x", 4), "x");
        assert_eq!(unindent("  ", 4), "");
    }
}
