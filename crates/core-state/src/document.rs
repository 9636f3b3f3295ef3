use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Weak;
use std::time::SystemTime;

use core_syntax::{Lexer, PlainTextLexer};
use core_text::selection::{block_columns, block_row_span};
use core_text::{
    Line, LineEnding, LineSource, LineTable, Motion, Offload, Point, SourceError, TextEncoding,
    TextMode, char_slice,
};
use thiserror::Error;
use tracing::{debug, error};

use crate::memory::MemoryPolicy;
use crate::undo::{CapturedText, UndoHistory};
use crate::watch::{DocumentWatcher, WatcherId, WatcherRegistry};

/// Net edit count since the last save.
///
/// `DirtyUnknown` is reached when the saved state can no longer be reproduced by undo/redo
/// (history was cut below the saved point, or encoding/line endings were reassigned) and never
/// returns to `Clean` except by saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModCount {
    #[default]
    Clean,
    Dirty(i64),
    DirtyUnknown,
}

impl ModCount {
    pub fn step(self, n: i64) -> Self {
        match self {
            ModCount::Clean if n == 0 => ModCount::Clean,
            ModCount::Clean => ModCount::Dirty(n),
            ModCount::Dirty(c) if c + n == 0 => ModCount::Clean,
            ModCount::Dirty(c) => ModCount::Dirty(c + n),
            ModCount::DirtyUnknown => ModCount::DirtyUnknown,
        }
    }

    pub fn is_modified(self) -> bool {
        self != ModCount::Clean
    }
}

#[derive(Debug, Error)]
pub enum LineError {
    #[error("line {line} is beyond the end of the document ({count} lines)")]
    OutOfRange { line: usize, count: usize },
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Everything a loader hands over to build a [`Document`] on the owning thread.
#[derive(Default)]
pub struct DocumentParts {
    pub lines: Vec<Line>,
    pub encoding: TextEncoding,
    pub line_ending: LineEnding,
    pub readonly: bool,
    pub source: Option<Box<dyn LineSource>>,
    pub path: Option<PathBuf>,
    pub file_stamp: Option<SystemTime>,
    pub lexer: Option<Box<dyn Lexer>>,
}

pub struct Document {
    pub(crate) lines: Vec<Line>,
    pub(crate) encoding: TextEncoding,
    /// Encoding of the bytes offloaded lines point at.
    pub(crate) source_encoding: TextEncoding,
    pub(crate) line_ending: LineEnding,
    pub(crate) readonly: bool,
    pub(crate) mod_count: ModCount,
    pub(crate) history: UndoHistory,
    pub(crate) ctx_dirty: Option<usize>,
    pub(crate) token_dirty: Option<usize>,
    pub(crate) lexer: Box<dyn Lexer>,
    pub(crate) mode: TextMode,
    pub(crate) watchers: WatcherRegistry,
    pub(crate) source: Option<Box<dyn LineSource>>,
    pub(crate) path: Option<PathBuf>,
    pub(crate) file_stamp: Option<SystemTime>,
    pub(crate) memory: Option<MemoryPolicy>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("lines", &self.lines.len())
            .field("encoding", &self.encoding)
            .field("line_ending", &self.line_ending)
            .field("readonly", &self.readonly)
            .field("mod_count", &self.mod_count)
            .field("lexer", &self.lexer.name())
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// An empty, unnamed document.
    pub fn new() -> Self {
        Self::from_parts(DocumentParts {
            line_ending: LineEnding::Lf,
            ..DocumentParts::default()
        })
    }

    /// Build a resident document from text. The default line ending is the first line's.
    pub fn from_text(text: &str) -> Self {
        let mut lines: Vec<Line> = crate::edit::split_breaks(text)
            .into_iter()
            .map(|(s, end)| Line::new(s, end.unwrap_or(LineEnding::None)))
            .collect();
        if lines.last().is_none_or(|l| !l.ending.is_none()) {
            lines.push(Line::new("", LineEnding::None));
        }
        let line_ending = match lines[0].ending {
            LineEnding::None => LineEnding::Lf,
            e => e,
        };
        Self::from_parts(DocumentParts {
            lines,
            line_ending,
            ..DocumentParts::default()
        })
    }

    pub fn from_parts(parts: DocumentParts) -> Self {
        let mut lines = parts.lines;
        if lines.is_empty() {
            lines.push(Line::new("", LineEnding::None));
        }
        let line_ending = match parts.line_ending {
            LineEnding::None => LineEnding::Lf,
            e => e,
        };
        debug!(target: "state.edit", lines = lines.len(), encoding = parts.encoding.label(), "document_created");
        Self {
            lines,
            encoding: parts.encoding,
            source_encoding: parts.encoding,
            line_ending,
            readonly: parts.readonly,
            mod_count: ModCount::Clean,
            history: UndoHistory::default(),
            ctx_dirty: Some(0),
            token_dirty: Some(0),
            lexer: parts.lexer.unwrap_or_else(|| Box::new(PlainTextLexer)),
            mode: TextMode::default(),
            watchers: WatcherRegistry::default(),
            source: parts.source,
            path: parts.path,
            file_stamp: parts.file_stamp,
            memory: None,
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, idx: usize) -> Option<&Line> {
        self.lines.get(idx)
    }

    /// Text of line `idx`, distinguishing a line past the end from one that failed to load.
    pub fn try_line_text(&self, idx: usize) -> Result<Cow<'_, str>, LineError> {
        let line = self.lines.get(idx).ok_or(LineError::OutOfRange {
            line: idx,
            count: self.lines.len(),
        })?;
        Ok(line.materialize(self.source.as_deref(), &self.source_encoding)?)
    }

    /// Raw encoded bytes of an offloaded line, straight from the backing source.
    pub fn raw_line_bytes(&self, idx: usize) -> Result<Option<Vec<u8>>, LineError> {
        let line = self.lines.get(idx).ok_or(LineError::OutOfRange {
            line: idx,
            count: self.lines.len(),
        })?;
        if !line.is_offloaded() || self.source_encoding != self.encoding {
            return Ok(None);
        }
        let (Some(span), Some(source)) = (line.backing(), self.source.as_deref()) else {
            return Ok(None);
        };
        let bytes = source.read_raw(span).map_err(|e| SourceError::Io {
            offset: span.offset,
            len: span.len,
            source: e,
        })?;
        Ok(Some(bytes))
    }

    pub fn motion(&self) -> Motion<'_, Document> {
        Motion::new(self, &self.mode)
    }

    pub fn mode(&self) -> &TextMode {
        &self.mode
    }

    pub fn set_mode(&mut self, mode: TextMode) {
        self.mode = mode;
    }

    pub fn lexer(&self) -> &dyn Lexer {
        self.lexer.as_ref()
    }

    /// Swap the lexer; all cached syntax becomes stale.
    pub fn set_lexer(&mut self, lexer: Box<dyn Lexer>) {
        debug!(target: "state.syntax", lexer = lexer.name(), "lexer_set");
        self.lexer = lexer;
        for line in &mut self.lines {
            line.invalidate_syntax();
        }
        self.ctx_dirty = Some(0);
        self.token_dirty = Some(0);
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Change the encoding used for the next save.
    pub fn set_encoding(&mut self, encoding: TextEncoding, origin: Option<WatcherId>) {
        self.encoding = encoding;
        self.mod_count = ModCount::DirtyUnknown;
        debug!(target: "state.edit", encoding = encoding.label(), "encoding_set");
        let end = self.end_point();
        self.watchers.notify_text(origin, end, end, end);
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Change the default line ending and rewrite every terminated line to use it.
    pub fn set_line_ending(&mut self, ending: LineEnding, origin: Option<WatcherId>) {
        if ending.is_none() {
            return;
        }
        self.line_ending = ending;
        for line in &mut self.lines {
            if !line.ending.is_none() {
                line.ending = ending;
            }
        }
        self.mod_count = ModCount::DirtyUnknown;
        debug!(target: "state.edit", ending = ending.label(), "line_ending_set");
        let end = self.end_point();
        self.watchers.notify_text(origin, end, end, end);
    }

    pub fn readonly(&self) -> bool {
        self.readonly
    }

    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    pub fn mod_count(&self) -> ModCount {
        self.mod_count
    }

    pub fn is_modified(&self) -> bool {
        self.mod_count.is_modified()
    }

    /// Forget every modification mark, as after a successful save.
    pub fn mark_saved(&mut self, stamp: Option<SystemTime>) {
        self.clear_modified_flags();
        self.mod_count = ModCount::Clean;
        self.file_stamp = stamp;
    }

    pub(crate) fn clear_modified_flags(&mut self) {
        for line in &mut self.lines {
            line.modified = false;
        }
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn set_undo_capacity(&mut self, capacity: Option<usize>) {
        self.history.set_capacity(capacity);
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn file_stamp(&self) -> Option<SystemTime> {
        self.file_stamp
    }

    pub fn source(&self) -> Option<&dyn LineSource> {
        self.source.as_deref()
    }

    pub fn source_mut(&mut self) -> Option<&mut (dyn LineSource + 'static)> {
        self.source.as_deref_mut()
    }

    /// Point every line at its location in the file just written. `spans` is indexed by line.
    pub fn apply_saved_spans(&mut self, spans: &[Offload]) {
        for (line, span) in self.lines.iter_mut().zip(spans) {
            line.set_backing(*span);
        }
        self.source_encoding = self.encoding;
    }

    /// Switch to a new backing source after saving under a different path.
    pub fn replace_source(&mut self, source: Box<dyn LineSource>, path: PathBuf) {
        debug!(target: "state.edit", path = %path.display(), "source_replaced");
        self.source = Some(source);
        self.path = Some(path);
    }

    /// Drop the backing source, pulling offloaded lines back into memory first.
    pub fn detach_source(&mut self) {
        let source = self.source.take();
        for line in &mut self.lines {
            line.forget_backing(source.as_deref(), &self.source_encoding);
        }
        self.source_encoding = self.encoding;
    }

    pub fn attach_watcher(&mut self, watcher: Weak<dyn DocumentWatcher>) -> WatcherId {
        self.watchers.attach(watcher)
    }

    pub fn detach_watcher(&mut self, id: WatcherId) -> bool {
        self.watchers.detach(id)
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.live_count()
    }

    /// Text between two points. Block mode takes the shared column range from every row and ends
    /// each row with its own terminator.
    pub fn get_text(&self, left: Point, right: Point, block_mode: bool) -> String {
        if left.line == right.line {
            let text = self.line_text(left.line);
            return char_slice(&text, left.index, right.index).to_string();
        }
        let mut out = String::new();
        if !block_mode {
            let first = self.line_text(left.line);
            out.push_str(char_slice(&first, left.index, usize::MAX));
            out.push_str(self.lines[left.line].ending.as_str());
            for idx in left.line + 1..right.line {
                out.push_str(&self.line_text(idx));
                out.push_str(self.lines[idx].ending.as_str());
            }
            let last = self.line_text(right.line);
            out.push_str(char_slice(&last, 0, right.index));
        } else {
            let tab = self.mode.tab_width;
            let columns = block_columns(self, left, right, tab);
            for idx in left.line..=right.line.min(self.lines.len() - 1) {
                let text = self.line_text(idx);
                let (start, end) = block_row_span(&text, columns, tab);
                out.push_str(char_slice(&text, start, end));
                out.push_str(self.lines[idx].ending.as_str());
            }
        }
        out
    }

    /// Linear text between two points, split at every line break for exact replay.
    pub(crate) fn capture(&self, left: Point, right: Point) -> CapturedText {
        let mut out = CapturedText::default();
        if left.line == right.line {
            let text = self.line_text(left.line);
            out.push(char_slice(&text, left.index, right.index), None);
            return out;
        }
        let first = self.line_text(left.line);
        out.push(char_slice(&first, left.index, usize::MAX), Some(self.lines[left.line].ending));
        for idx in left.line + 1..right.line {
            out.push(&self.line_text(idx), Some(self.lines[idx].ending));
        }
        let last = self.line_text(right.line);
        out.push(char_slice(&last, 0, right.index), None);
        out
    }

    /// Whole document text including terminators.
    pub fn text(&self) -> String {
        self.get_text(Point::origin(), self.end_point(), false)
    }

    /// Heap bytes held by resident line text.
    pub fn resident_text_bytes(&self) -> usize {
        self.lines.iter().map(Line::resident_bytes).sum()
    }
}

impl LineTable for Document {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_text(&self, idx: usize) -> Cow<'_, str> {
        match self.try_line_text(idx) {
            Ok(text) => text,
            Err(LineError::OutOfRange { .. }) => Cow::Borrowed(""),
            Err(err) => {
                error!(target: "state.memory", line = idx, %err, "line_materialize_failed");
                Cow::Borrowed("")
            }
        }
    }

    fn line_len(&self, idx: usize) -> usize {
        match self.lines.get(idx).and_then(Line::resident_text) {
            Some(text) => text.chars().count(),
            None => self.line_text(idx).chars().count(),
        }
    }
}
