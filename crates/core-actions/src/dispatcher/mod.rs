//! Command dispatch.
//!
//! Commands are plain functions looked up by name. The table is built once, on first use, and
//! shared for the life of the process. Handlers live in focused sub-modules:
//! * `motion` - caret and selection movement
//! * `edit`   - insert, delete, indent
//! * `clip`   - copy, cut, paste
//! * `undo`   - undo / redo
//! * `mark`   - bookmarks and modified-line seeking
//! * `search` - repeat the view's search forward or backward

use std::collections::HashMap;
use std::sync::OnceLock;

use thiserror::Error;

use crate::clipboard::Clipboard;
use crate::view::EditorView;

mod clip;
mod edit;
mod mark;
mod motion;
mod search;
mod undo;

use motion::MotionKind;

/// Result of dispatching a single command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchResult {
    /// The view needs repainting (selection or text changed).
    pub dirty: bool,
    /// Document text changed.
    pub edited: bool,
    /// The command applied. `false` lets a key binding fall through to the next command.
    pub handled: bool,
}

impl DispatchResult {
    pub fn dirty() -> Self {
        Self {
            dirty: true,
            edited: false,
            handled: true,
        }
    }
    pub fn clean() -> Self {
        Self {
            dirty: false,
            edited: false,
            handled: true,
        }
    }
    pub fn edited() -> Self {
        Self {
            dirty: true,
            edited: true,
            handled: true,
        }
    }
    pub fn unhandled() -> Self {
        Self {
            dirty: false,
            edited: false,
            handled: false,
        }
    }
}

/// Per-dispatch collaborators that outlive any single view.
pub struct CommandContext<'a> {
    pub clipboard: &'a mut dyn Clipboard,
}

impl<'a> CommandContext<'a> {
    pub fn new(clipboard: &'a mut dyn Clipboard) -> Self {
        Self { clipboard }
    }
}

pub type CommandFn = fn(&mut EditorView, &mut CommandContext<'_>) -> DispatchResult;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown command: {0}")]
pub struct UnknownCommand(pub String);

pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandFn>,
}

impl CommandRegistry {
    /// The process-wide table.
    pub fn global() -> &'static CommandRegistry {
        static REGISTRY: OnceLock<CommandRegistry> = OnceLock::new();
        REGISTRY.get_or_init(Self::build)
    }

    pub fn get(&self, name: &str) -> Option<CommandFn> {
        self.commands.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    fn build() -> Self {
        let table: &[(&'static str, CommandFn)] = &[
            ("CursorLeft", |v, _| motion::handle_motion(MotionKind::Left, false, v)),
            ("CursorRight", |v, _| motion::handle_motion(MotionKind::Right, false, v)),
            ("CursorWordLeft", |v, _| motion::handle_motion(MotionKind::WordLeft, false, v)),
            ("CursorWordRight", |v, _| motion::handle_motion(MotionKind::WordRight, false, v)),
            ("CursorTabLeft", |v, _| motion::handle_motion(MotionKind::TabLeft, false, v)),
            ("CursorLineBegin", |v, _| motion::handle_motion(MotionKind::LineBegin, false, v)),
            ("CursorLineEnd", |v, _| motion::handle_motion(MotionKind::LineEnd, false, v)),
            ("CursorLineFirstGraph", |v, _| motion::handle_motion(MotionKind::LineFirstGraph, false, v)),
            ("CursorUp", |v, _| motion::handle_motion(MotionKind::Up, false, v)),
            ("CursorDown", |v, _| motion::handle_motion(MotionKind::Down, false, v)),
            ("CursorDocumentBegin", |v, _| motion::handle_motion(MotionKind::DocumentBegin, false, v)),
            ("CursorDocumentEnd", |v, _| motion::handle_motion(MotionKind::DocumentEnd, false, v)),
            ("CursorCorrespondingBracket", |v, _| motion::handle_motion(MotionKind::Bracket, false, v)),
            ("SelectLeft", |v, _| motion::handle_motion(MotionKind::Left, true, v)),
            ("SelectRight", |v, _| motion::handle_motion(MotionKind::Right, true, v)),
            ("SelectWordLeft", |v, _| motion::handle_motion(MotionKind::WordLeft, true, v)),
            ("SelectWordRight", |v, _| motion::handle_motion(MotionKind::WordRight, true, v)),
            ("SelectLineBegin", |v, _| motion::handle_motion(MotionKind::LineBegin, true, v)),
            ("SelectLineEnd", |v, _| motion::handle_motion(MotionKind::LineEnd, true, v)),
            ("SelectUp", |v, _| motion::handle_motion(MotionKind::Up, true, v)),
            ("SelectDown", |v, _| motion::handle_motion(MotionKind::Down, true, v)),
            ("SelectDocumentBegin", |v, _| motion::handle_motion(MotionKind::DocumentBegin, true, v)),
            ("SelectDocumentEnd", |v, _| motion::handle_motion(MotionKind::DocumentEnd, true, v)),
            ("SelectCorrespondingBracket", |v, _| motion::handle_motion(MotionKind::Bracket, true, v)),
            ("SelectDocument", |v, _| motion::handle_select_document(v)),
            ("SelectCancel", |v, _| motion::handle_select_cancel(v)),
            ("SelectBlock", |v, _| motion::handle_select_block(v)),
            ("InsertReturn", |v, _| edit::handle_insert_return(v, false)),
            ("InsertReturnAutoIndent", |v, _| edit::handle_insert_return(v, true)),
            ("InsertTab", |v, _| edit::handle_insert_tab(v)),
            ("DeleteCharLeft", |v, _| edit::handle_delete(edit::DeleteKind::CharLeft, v)),
            ("DeleteCharRight", |v, _| edit::handle_delete(edit::DeleteKind::CharRight, v)),
            ("DeleteWordLeft", |v, _| edit::handle_delete(edit::DeleteKind::WordLeft, v)),
            ("DeleteWordRight", |v, _| edit::handle_delete(edit::DeleteKind::WordRight, v)),
            ("DeleteWord", |v, _| edit::handle_delete(edit::DeleteKind::Word, v)),
            ("DeleteLine", |v, _| edit::handle_delete(edit::DeleteKind::Line, v)),
            ("DeleteLineLeft", |v, _| edit::handle_delete(edit::DeleteKind::LineLeft, v)),
            ("DeleteLineRight", |v, _| edit::handle_delete(edit::DeleteKind::LineRight, v)),
            ("IndentSelection", |v, _| edit::handle_indent(v, true)),
            ("UnindentSelection", |v, _| edit::handle_indent(v, false)),
            ("Copy", |v, ctx| clip::handle_copy(v, ctx, false)),
            ("Cut", |v, ctx| clip::handle_copy(v, ctx, true)),
            ("Paste", |v, ctx| clip::handle_paste(v, ctx)),
            ("Undo", |v, _| undo::handle_undo(v)),
            ("Redo", |v, _| undo::handle_redo(v)),
            ("Bookmark1", |v, _| mark::handle_bookmark(v, &[1, 0])),
            ("Bookmark2", |v, _| mark::handle_bookmark(v, &[2, 0])),
            ("Bookmark3", |v, _| mark::handle_bookmark(v, &[3, 0])),
            ("Bookmark123", |v, _| mark::handle_bookmark(v, &[1, 2, 3, 0])),
            ("BookmarkNext", |v, _| mark::handle_seek(v, mark::SeekKind::Bookmark, true, false)),
            ("BookmarkPrev", |v, _| mark::handle_seek(v, mark::SeekKind::Bookmark, false, false)),
            ("ModifiedLineNext", |v, _| mark::handle_seek(v, mark::SeekKind::Modified, true, false)),
            ("ModifiedLinePrev", |v, _| mark::handle_seek(v, mark::SeekKind::Modified, false, false)),
            ("SelectBookmarkNext", |v, _| mark::handle_seek(v, mark::SeekKind::Bookmark, true, true)),
            ("SelectBookmarkPrev", |v, _| mark::handle_seek(v, mark::SeekKind::Bookmark, false, true)),
            ("SelectModifiedLineNext", |v, _| mark::handle_seek(v, mark::SeekKind::Modified, true, true)),
            ("SelectModifiedLinePrev", |v, _| mark::handle_seek(v, mark::SeekKind::Modified, false, true)),
            ("SearchNext", |v, _| search::handle_search(v, true)),
            ("SearchPrev", |v, _| search::handle_search(v, false)),
        ];
        let commands: HashMap<_, _> = table.iter().copied().collect();
        tracing::debug!(target: "actions.dispatch", commands = commands.len(), "registry_built");
        Self { commands }
    }
}

/// Run the command called `name` against `view`.
pub fn dispatch(
    name: &str,
    view: &mut EditorView,
    ctx: &mut CommandContext<'_>,
) -> Result<DispatchResult, UnknownCommand> {
    let Some(command) = CommandRegistry::global().get(name) else {
        tracing::debug!(target: "actions.dispatch", command = name, "unknown_command");
        return Err(UnknownCommand(name.to_string()));
    };
    let result = command(view, ctx);
    tracing::trace!(
        target: "actions.dispatch",
        command = name,
        dirty = result.dirty,
        edited = result.edited,
        handled = result.handled,
        "dispatched"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_built_once_and_sorted() {
        let a = CommandRegistry::global() as *const _;
        let b = CommandRegistry::global() as *const _;
        assert_eq!(a, b);
        let names = CommandRegistry::global().names();
        assert!(names.windows(2).all(|w| w[0] < w[1]));
        assert!(names.contains(&"InsertReturnAutoIndent"));
        assert!(!CommandRegistry::global().contains("Quit"));
    }
}
