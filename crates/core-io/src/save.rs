//! Writing a document back to disk.
//!
//! The output is staged first (in memory, or in an anonymous temporary file past the spill
//! threshold) while recording where every line lands. Only then is the target touched: the open
//! file is rewritten in place, or a different target is created and becomes the document's new
//! source. Lines still offloaded are copied byte for byte from the old source.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use core_state::{Document, LineError};
use core_text::{LineTable, Offload};
use thiserror::Error;
use tracing::{debug, info};

use crate::source::{FileSource, LockError, file_identity};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("document has no file name")]
    NoPath,
    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("reading line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: LineError,
    },
    #[error("line {line} does not fit in an offload span")]
    LineTooLong { line: usize },
    /// The file lock could not be released or taken again. When the contents were written the
    /// document already points at the new file.
    #[error("locking {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct SaveOptions {
    /// Staged output larger than this moves to a temporary file.
    pub spill_threshold: usize,
    /// Lock a newly written target the way [`crate::load`] locks opened files.
    pub lock: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            spill_threshold: 10 << 20,
            lock: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub path: PathBuf,
    pub bytes: u64,
    pub lines: usize,
    /// The document's own file was rewritten in place.
    pub in_place: bool,
}

/// Growable output buffer that moves to a temporary file once it passes `threshold`.
struct Staging {
    mem: Vec<u8>,
    spill: Option<File>,
    threshold: usize,
    len: u64,
}

impl Staging {
    fn new(threshold: usize) -> Self {
        Self {
            mem: Vec::new(),
            spill: None,
            threshold,
            len: 0,
        }
    }

    fn into_reader(self) -> io::Result<Box<dyn Read>> {
        match self.spill {
            Some(mut file) => {
                file.flush()?;
                file.seek(SeekFrom::Start(0))?;
                Ok(Box::new(file))
            }
            None => Ok(Box::new(io::Cursor::new(self.mem))),
        }
    }
}

impl Write for Staging {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.spill.is_none() && self.mem.len() + buf.len() > self.threshold {
            let mut file = tempfile::tempfile()?;
            file.write_all(&self.mem)?;
            debug!(target: "io.save", staged = self.mem.len(), "save_spilled_to_tempfile");
            self.mem = Vec::new();
            self.spill = Some(file);
        }
        match &mut self.spill {
            Some(file) => file.write_all(buf)?,
            None => self.mem.extend_from_slice(buf),
        }
        self.len += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.spill {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(a), Ok(b)) => file_identity(&a) == file_identity(&b),
        _ => false,
    }
}

fn modified_stamp(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn classify(path: &Path, source: io::Error) -> SaveError {
    if LockError::find(&source).is_some() {
        SaveError::Lock {
            path: path.to_path_buf(),
            source,
        }
    } else {
        SaveError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Encode every line into `out`, returning where each one's content landed.
fn stage(doc: &mut Document, out: &mut Staging) -> Result<Vec<Offload>, SaveError> {
    let encoding = doc.encoding();
    let write_err = |source| SaveError::Io {
        path: PathBuf::from("<staging>"),
        source,
    };
    out.write_all(encoding.bom_bytes()).map_err(write_err)?;
    let mut spans = Vec::with_capacity(doc.line_count());
    for idx in 0..doc.line_count() {
        let line_err = |source| SaveError::Line { line: idx, source };
        let bytes = match doc.raw_line_bytes(idx).map_err(line_err)? {
            Some(raw) => raw,
            None => encoding.encode(&doc.try_line_text(idx).map_err(line_err)?),
        };
        let len = u32::try_from(bytes.len()).map_err(|_| SaveError::LineTooLong { line: idx })?;
        spans.push(Offload::new(out.len, len));
        out.write_all(&bytes).map_err(write_err)?;
        let ending = doc.lines()[idx].ending;
        out.write_all(&encoding.encode_line_ending(ending))
            .map_err(write_err)?;
        doc.memory_checkpoint(idx);
    }
    Ok(spans)
}

fn write_new(target: &Path, contents: &mut dyn Read) -> io::Result<()> {
    let mut file = File::create(target)?;
    io::copy(contents, &mut file)?;
    file.flush()?;
    file.sync_all()
}

/// Save `doc` to `target`, or to its own path when `target` is `None`.
///
/// Saving under a different path leaves the old file untouched and switches the document (and
/// its lock) to the new file. On any failure before the target is opened the document is
/// unchanged.
pub fn save(doc: &mut Document, target: Option<&Path>, opts: &SaveOptions) -> Result<SaveReport, SaveError> {
    let target = match (target, doc.path()) {
        (Some(t), _) => t.to_path_buf(),
        (None, Some(p)) => p.to_path_buf(),
        (None, None) => return Err(SaveError::NoPath),
    };
    let in_place = doc.source().is_some() && doc.path().is_some_and(|p| p == target.as_path() || same_file(p, &target));

    let mut staging = Staging::new(opts.spill_threshold);
    let spans = stage(doc, &mut staging)?;
    let bytes = staging.len;
    let mut contents = staging.into_reader().map_err(|e| classify(&target, e))?;

    let mut lock_failure = None;
    if in_place {
        let Some(source) = doc.source_mut() else {
            return Err(SaveError::NoPath);
        };
        if let Err(e) = source.overwrite(&mut contents) {
            match LockError::find(&e) {
                Some(lock) if lock.rewritten => lock_failure = Some(e),
                _ => return Err(classify(&target, e)),
            }
        }
    } else {
        write_new(&target, &mut contents).map_err(|e| classify(&target, e))?;
        let mut source = FileSource::open(&target).map_err(|e| classify(&target, e))?;
        if opts.lock
            && let Err(e) = source.lock()
        {
            lock_failure = Some(e);
        }
        doc.replace_source(Box::new(source), target.clone());
    }

    doc.apply_saved_spans(&spans);
    doc.mark_saved(modified_stamp(&target));
    info!(
        target: "io.save",
        path = %target.display(),
        bytes,
        lines = spans.len(),
        in_place,
        "file_saved"
    );
    if let Some(source) = lock_failure {
        return Err(SaveError::Lock { path: target, source });
    }
    Ok(SaveReport {
        path: target,
        bytes,
        lines: spans.len(),
        in_place,
    })
}

/// `true` when the document's file changed on disk since it was loaded or saved.
pub fn is_file_modified(doc: &Document) -> io::Result<bool> {
    let Some(path) = doc.path() else {
        return Ok(false);
    };
    let current = fs::metadata(path)?.modified()?;
    Ok(doc.file_stamp() != Some(current))
}
