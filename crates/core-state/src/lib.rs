//! Document state: the line table, the edit engine, undo history, and everything derived from it.
//!
//! A [`Document`] owns its lines and the bookkeeping that follows every mutation:
//! - Edits go through [`Document::modify_text`], which splices text (linear or rectangular),
//!   records undo, steps the modification counter, widens the syntax dirty pointers, and tells
//!   watchers what moved.
//! - Undo history lives in [`undo::UndoHistory`]. Primitive edits can be gathered into atomic
//!   groups so one user action undoes as a unit.
//! - Syntax is recomputed lazily in two bounded passes (contexts, then tokens) driven by an
//!   external scheduler through [`Document::syntax_tick`].
//! - Views observe a document through weak [`watch::DocumentWatcher`] registrations; the document
//!   never owns a view.
//!
//! The document is single-threaded. Loading happens elsewhere and hands over [`DocumentParts`].

mod bookmark;
mod document;
mod edit;
mod memory;
mod search;
mod syntax;
pub mod undo;
pub mod watch;

pub use bookmark::Bookmark;
pub use document::{Document, DocumentParts, LineError, ModCount};
pub use edit::{EditOutcome, EditRefusal, EditRequest, LineInfo};
pub use memory::{MemoryPolicy, MemoryProbe};
pub use search::{SearchError, SearchHit, SearchQuery};
pub use undo::{Anchors, AtomicGroup, CapturedText, EditRecord, UndoHistory, UndoRecord};
pub use watch::{DocumentWatcher, WatcherId};
