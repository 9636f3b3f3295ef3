//! A single logical line and its offload state.
//!
//! A line's text is either resident or offloaded to a byte range of its backing source. Resident
//! lines may also remember where their bytes live (set at load or save); those lines are eligible
//! for offloading by a memory sweep. Reading an offloaded line decodes it on demand and leaves it
//! offloaded.

use std::borrow::Cow;
use std::io;

use core_syntax::{LexContext, PackedTokens};
use thiserror::Error;

use crate::TextEncoding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineEnding {
    /// Unterminated; only the last line of a document.
    #[default]
    None,
    Lf,
    Cr,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::None => "",
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
            LineEnding::Crlf => "\r\n",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LineEnding::None => "none",
            LineEnding::Lf => "lf",
            LineEnding::Cr => "cr",
            LineEnding::Crlf => "crlf",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "lf" => Some(LineEnding::Lf),
            "cr" => Some(LineEnding::Cr),
            "crlf" => Some(LineEnding::Crlf),
            _ => None,
        }
    }

    pub fn is_none(self) -> bool {
        self == LineEnding::None
    }
}

/// Byte range of a line's encoded content (terminator excluded) within its backing source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offload {
    pub offset: u64,
    pub len: u32,
}

impl Offload {
    pub const fn new(offset: u64, len: u32) -> Self {
        Self { offset, len }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("line is offloaded but the document has no backing source")]
    Detached,
    #[error("reading offloaded line at {offset}+{len}: {source}")]
    Io {
        offset: u64,
        len: u32,
        #[source]
        source: io::Error,
    },
}

/// Random-access byte source that offloaded lines are read back from.
pub trait LineSource {
    fn read_raw(&self, span: Offload) -> io::Result<Vec<u8>>;

    /// Replace the whole source with `contents`. Sources that cannot be rewritten in place refuse.
    fn overwrite(&mut self, contents: &mut dyn io::Read) -> io::Result<()> {
        let _ = contents;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "line source cannot be rewritten in place",
        ))
    }
}

#[derive(Debug, Clone)]
enum Storage {
    Resident {
        text: String,
        backing: Option<Offload>,
    },
    Offloaded(Offload),
}

#[derive(Debug, Clone)]
pub struct Line {
    storage: Storage,
    pub ending: LineEnding,
    pub modified: bool,
    /// Bookmark tag, 0 for none.
    pub bookmark: u8,
    /// Opaque color class owned by diff/render collaborators.
    pub background: Option<u8>,
    /// Context this line starts in; `None` when stale.
    pub lex_context: Option<LexContext>,
    /// Cached tokens; `None` when stale.
    pub tokens: Option<PackedTokens>,
}

impl Line {
    pub fn new(text: impl Into<String>, ending: LineEnding) -> Self {
        Self::with_storage(
            Storage::Resident {
                text: text.into(),
                backing: None,
            },
            ending,
        )
    }

    pub fn offloaded(span: Offload, ending: LineEnding) -> Self {
        Self::with_storage(Storage::Offloaded(span), ending)
    }

    fn with_storage(storage: Storage, ending: LineEnding) -> Self {
        Self {
            storage,
            ending,
            modified: false,
            bookmark: 0,
            background: None,
            lex_context: None,
            tokens: None,
        }
    }

    /// Resident text, `None` while offloaded.
    pub fn resident_text(&self) -> Option<&str> {
        match &self.storage {
            Storage::Resident { text, .. } => Some(text),
            Storage::Offloaded(_) => None,
        }
    }

    pub fn is_offloaded(&self) -> bool {
        matches!(self.storage, Storage::Offloaded(_))
    }

    /// Where the line's bytes live in the backing source, if known.
    pub fn backing(&self) -> Option<Offload> {
        match &self.storage {
            Storage::Resident { backing, .. } => *backing,
            Storage::Offloaded(span) => Some(*span),
        }
    }

    /// Text of the line, decoding offloaded content from `source` without making it resident.
    pub fn materialize<'a>(
        &'a self,
        source: Option<&dyn LineSource>,
        encoding: &TextEncoding,
    ) -> Result<Cow<'a, str>, SourceError> {
        match &self.storage {
            Storage::Resident { text, .. } => Ok(Cow::Borrowed(text)),
            Storage::Offloaded(span) => {
                let source = source.ok_or(SourceError::Detached)?;
                let bytes = source.read_raw(*span).map_err(|source| SourceError::Io {
                    offset: span.offset,
                    len: span.len,
                    source,
                })?;
                Ok(Cow::Owned(encoding.decode(&bytes)))
            }
        }
    }

    /// Replace the content. The line becomes resident and loses its backing reference.
    pub fn set_text(&mut self, text: String) {
        self.storage = Storage::Resident {
            text,
            backing: None,
        };
    }

    /// Record the line's location after it was written to a new backing file.
    pub fn set_backing(&mut self, span: Offload) {
        match &mut self.storage {
            Storage::Resident { backing, .. } => *backing = Some(span),
            Storage::Offloaded(old) => *old = span,
        }
    }

    /// Drop any backing reference, e.g. when the source it pointed into is gone.
    pub fn forget_backing(&mut self, source: Option<&dyn LineSource>, encoding: &TextEncoding) {
        if let Storage::Resident { backing, .. } = &mut self.storage {
            *backing = None;
            return;
        }
        let text = self
            .materialize(source, encoding)
            .map(Cow::into_owned)
            .unwrap_or_default();
        self.set_text(text);
    }

    /// Release resident text when its bytes can be read back. Returns `true` if released.
    pub fn offload(&mut self) -> bool {
        let span = match &self.storage {
            Storage::Resident { backing, .. } => *backing,
            Storage::Offloaded(_) => None,
        };
        let Some(span) = span else {
            return false;
        };
        self.storage = Storage::Offloaded(span);
        true
    }

    /// Heap bytes held by resident text.
    pub fn resident_bytes(&self) -> usize {
        match &self.storage {
            Storage::Resident { text, .. } => text.capacity(),
            Storage::Offloaded(_) => 0,
        }
    }

    pub fn invalidate_syntax(&mut self) {
        self.lex_context = None;
        self.tokens = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Bytes {
        data: Vec<u8>,
        reads: Cell<usize>,
    }

    impl LineSource for Bytes {
        fn read_raw(&self, span: Offload) -> io::Result<Vec<u8>> {
            self.reads.set(self.reads.get() + 1);
            let start = span.offset as usize;
            let end = start + span.len as usize;
            self.data
                .get(start..end)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
        }
    }

    #[test]
    fn offloaded_line_reads_back_without_becoming_resident() {
        let src = Bytes {
            data: b"hello\nworld".to_vec(),
            reads: Cell::new(0),
        };
        let line = Line::offloaded(Offload::new(6, 5), LineEnding::None);
        let text = line
            .materialize(Some(&src), &TextEncoding::utf8())
            .unwrap();
        assert_eq!(text, "world");
        assert!(line.is_offloaded());
        assert!(line.resident_text().is_none());
        assert_eq!(src.reads.get(), 1);
    }

    #[test]
    fn only_lines_with_backing_offload() {
        let mut fresh = Line::new("new", LineEnding::Lf);
        assert!(!fresh.offload());
        assert_eq!(fresh.resident_text(), Some("new"));

        fresh.set_backing(Offload::new(0, 3));
        assert!(fresh.offload());
        assert!(fresh.is_offloaded());
        assert_eq!(fresh.resident_bytes(), 0);

        fresh.set_text("edited".into());
        assert_eq!(fresh.backing(), None);
        assert!(!fresh.offload());
    }

    #[test]
    fn detached_offloaded_line_is_an_error() {
        let line = Line::offloaded(Offload::new(0, 1), LineEnding::Lf);
        let err = line.materialize(None, &TextEncoding::utf8()).unwrap_err();
        assert!(matches!(err, SourceError::Detached));
    }

    #[test]
    fn line_ending_names() {
        assert_eq!(LineEnding::parse("CRLF"), Some(LineEnding::Crlf));
        assert_eq!(LineEnding::Cr.as_str(), "\r");
        assert_eq!(LineEnding::parse("unix"), None);
    }
}
