//! Loading a file into lines.
//!
//! Loading runs off the owning thread: [`load`] produces a [`LoadedText`] (which is `Send`) and
//! the owner turns it into a [`Document`] with [`LoadedText::into_document`]. Every line comes
//! out offloaded; only its position in the file is kept until something reads it.

use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use core_state::{Document, DocumentParts};
use core_syntax::Lexer;
use core_text::{Line, LineEnding, Offload, TextEncoding};
use thiserror::Error;
use tracing::{debug, info};

use crate::detect::{DetectOptions, Detected, detect_encoding};
use crate::source::FileSource;
use crate::split::{CodeUnit, LineScanner, RawLine};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} is a binary file")]
    Binary { path: PathBuf },
    #[error("cannot determine the text encoding of {path}")]
    Undecodable { path: PathBuf },
    #[error("locking {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line} of {path} does not fit in an offload span")]
    LineTooLong { path: PathBuf, line: usize },
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Bytes read per chunk while splitting lines.
    pub chunk_size: usize,
    pub detect: DetectOptions,
    /// Skip detection and read the file in this charset.
    pub encoding: Option<TextEncoding>,
    /// Used when the first line has no terminator.
    pub default_line_ending: LineEnding,
    /// Files with more lines than this get the plain-text lexer.
    pub plain_text_lines: usize,
    /// Files larger than this get the plain-text lexer.
    pub plain_text_bytes: u64,
    /// Hold a shared lock on the file while it is open.
    pub lock: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1 << 20,
            detect: DetectOptions::default(),
            encoding: None,
            default_line_ending: LineEnding::Lf,
            plain_text_lines: 100_000,
            plain_text_bytes: 10 << 20,
            lock: true,
        }
    }
}

/// A file split into offloaded lines, ready to become a [`Document`].
#[derive(Debug)]
pub struct LoadedText {
    pub lines: Vec<Line>,
    pub encoding: TextEncoding,
    pub line_ending: LineEnding,
    pub readonly: bool,
    pub path: PathBuf,
    pub file_stamp: Option<SystemTime>,
    pub bytes: u64,
    /// Above the plain-text thresholds.
    pub large: bool,
    source: FileSource,
}

impl LoadedText {
    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Build the document. Large files ignore `lexer` and stay plain text.
    pub fn into_document(self, lexer: Option<Box<dyn Lexer>>) -> Document {
        let lexer = if self.large {
            debug!(target: "io.load", path = %self.path.display(), "plain_text_lexer_forced");
            None
        } else {
            lexer
        };
        Document::from_parts(DocumentParts {
            lines: self.lines,
            encoding: self.encoding,
            line_ending: self.line_ending,
            readonly: self.readonly,
            source: Some(Box::new(self.source)),
            path: Some(self.path),
            file_stamp: self.file_stamp,
            lexer,
        })
    }
}

fn push_lines(
    lines: &mut Vec<Line>,
    raw: &mut Vec<RawLine>,
    path: &Path,
) -> Result<(), LoadError> {
    for r in raw.drain(..) {
        let len = u32::try_from(r.len).map_err(|_| LoadError::LineTooLong {
            path: path.to_path_buf(),
            line: lines.len(),
        })?;
        lines.push(Line::offloaded(Offload::new(r.offset, len), r.ending));
    }
    Ok(())
}

fn read_at(source: &FileSource, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    loop {
        match source.file().read_at(buf, offset) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

pub fn load(path: &Path, opts: &LoadOptions) -> Result<LoadedText, LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut source = FileSource::open(path).map_err(io_err)?;
    let meta = source.file().metadata().map_err(io_err)?;
    if opts.lock {
        source.lock().map_err(|source| LoadError::Lock {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let mut sample = vec![0u8; (opts.detect.sample_bytes + 1).min(meta.len() as usize)];
    let n = read_at(&source, &mut sample, 0).map_err(io_err)?;
    sample.truncate(n);

    let encoding = match opts.encoding {
        Some(forced) => {
            let bom = forced.charset.bom().is_some_and(|b| sample.starts_with(b));
            TextEncoding::new(forced.charset, bom)
        }
        None => match detect_encoding(&sample, &opts.detect) {
            Detected::Text(encoding) => encoding,
            Detected::Binary => {
                return Err(LoadError::Binary {
                    path: path.to_path_buf(),
                });
            }
            Detected::Unknown => {
                return Err(LoadError::Undecodable {
                    path: path.to_path_buf(),
                });
            }
        },
    };

    let unit = CodeUnit::for_charset(encoding.charset);
    let check_binary = opts.encoding.is_none() && unit == CodeUnit::Byte;
    let start = encoding.bom_bytes().len() as u64;
    let mut scanner = LineScanner::new(unit, start);
    let mut raw = Vec::new();
    let mut lines = Vec::new();
    let mut buf = vec![0u8; opts.chunk_size.max(1)];
    let mut offset = start;
    loop {
        let n = read_at(&source, &mut buf, offset).map_err(io_err)?;
        if n == 0 {
            break;
        }
        let chunk = &buf[..n];
        if check_binary && chunk.contains(&0) {
            return Err(LoadError::Binary {
                path: path.to_path_buf(),
            });
        }
        scanner.feed(chunk, &mut raw);
        push_lines(&mut lines, &mut raw, path)?;
        offset += n as u64;
    }
    scanner.finish(&mut raw);
    push_lines(&mut lines, &mut raw, path)?;

    let line_ending = match lines[0].ending {
        LineEnding::None => opts.default_line_ending,
        ending => ending,
    };
    let bytes = offset;
    let large = lines.len() > opts.plain_text_lines || bytes > opts.plain_text_bytes;
    let readonly = meta.permissions().readonly();
    info!(
        target: "io.load",
        path = %path.display(),
        lines = lines.len(),
        bytes,
        encoding = encoding.label(),
        readonly,
        large,
        "file_loaded"
    );
    Ok(LoadedText {
        lines,
        encoding,
        line_ending,
        readonly,
        path: path.to_path_buf(),
        file_stamp: meta.modified().ok(),
        bytes,
        large,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::ModCount;
    use core_text::{Charset, LineTable};
    use pretty_assertions::assert_eq;

    fn write(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn lines_come_out_offloaded_with_their_endings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.txt", b"one\r\ntwo\nthree");
        let loaded = load(&path, &LoadOptions::default()).unwrap();
        assert!(loaded.lines.iter().all(Line::is_offloaded));
        assert_eq!(loaded.line_ending, LineEnding::Crlf);

        let doc = loaded.into_document(None);
        assert_eq!(doc.line_count(), 3);
        assert_eq!(doc.line_text(1), "two");
        assert_eq!(doc.lines()[1].ending, LineEnding::Lf);
        assert_eq!(doc.lines()[2].ending, LineEnding::None);
        assert_eq!(doc.mod_count(), ModCount::Clean);
        assert!(doc.lines()[0].is_offloaded());
    }

    #[test]
    fn small_chunks_split_the_same_way() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "b.txt", b"ab\r\ncd\r\nef");
        let opts = LoadOptions {
            chunk_size: 3,
            ..LoadOptions::default()
        };
        let doc = load(&path, &opts).unwrap().into_document(None);
        assert_eq!(doc.text(), "ab\r\ncd\r\nef");
        assert_eq!(doc.line_count(), 3);
    }

    #[test]
    fn bom_is_skipped_and_remembered() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(Charset::Utf16Le.encode("hi\r\nthere"));
        let path = write(&dir, "c.txt", &bytes);
        let loaded = load(&path, &LoadOptions::default()).unwrap();
        assert_eq!(loaded.encoding, TextEncoding::new(Charset::Utf16Le, true));
        let doc = loaded.into_document(None);
        assert_eq!(doc.line_text(0), "hi");
        assert_eq!(doc.line_text(1), "there");
    }

    #[test]
    fn binary_and_undecodable_files_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "d.bin", b"ab\x00cd");
        assert!(matches!(
            load(&path, &LoadOptions::default()),
            Err(LoadError::Binary { .. })
        ));
        let path = write(&dir, "e.bin", b"\xFF\xFF\xFF\n");
        assert!(matches!(
            load(&path, &LoadOptions::default()),
            Err(LoadError::Undecodable { .. })
        ));
    }

    #[test]
    fn nul_past_the_sample_still_means_binary() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = b"text\n".repeat(10);
        bytes.push(0);
        let path = write(&dir, "f.bin", &bytes);
        let opts = LoadOptions {
            detect: DetectOptions {
                sample_bytes: 8,
                ..DetectOptions::default()
            },
            ..LoadOptions::default()
        };
        assert!(matches!(load(&path, &opts), Err(LoadError::Binary { .. })));
    }

    #[test]
    fn forced_encoding_skips_detection() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "g.txt", &Charset::ShiftJis.encode("日本"));
        let opts = LoadOptions {
            encoding: Some(TextEncoding::new(Charset::ShiftJis, false)),
            ..LoadOptions::default()
        };
        let doc = load(&path, &opts).unwrap().into_document(None);
        assert_eq!(doc.line_text(0), "日本");
    }

    #[test]
    fn missing_files_are_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nope"), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn large_files_keep_the_plain_lexer() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "h.c", b"int a;\nint b;\n");
        let opts = LoadOptions {
            plain_text_lines: 2,
            ..LoadOptions::default()
        };
        let loaded = load(&path, &opts).unwrap();
        assert!(loaded.large);
        let lexer = core_syntax::RuleLexer::c_like(&["int"]).unwrap();
        let doc = loaded.into_document(Some(Box::new(lexer)));
        assert!(doc.lexer().is_plain());
    }
}
