//! Editing commands over a view of a shared [`core_state::Document`].
//!
//! An [`EditorView`] holds one viewer's selection and ideal column and turns edit refusals into
//! [`Notice`]s. Commands are looked up by name in a [`CommandRegistry`] built once per process
//! and dispatched with a [`CommandContext`] carrying the clipboard.

mod clipboard;
mod dispatcher;
mod view;

pub use clipboard::{ClipText, Clipboard, LocalClipboard};
pub use dispatcher::{CommandContext, CommandFn, CommandRegistry, DispatchResult, UnknownCommand, dispatch};
pub use view::{EditorView, Notice, adjust_point};
