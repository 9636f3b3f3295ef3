//! Lazy line index over files too large to load.
//!
//! Nothing is read up front. Each [`HugeTextFile::fetch`] extends the index of line starts just
//! far enough to answer, within a scan budget, so a caller can page through a multi-gigabyte file
//! while staying responsive.

use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;
use std::path::Path;

use core_text::{LineEnding, TextEncoding};
use tracing::{debug, trace};

use crate::split::{CodeUnit, LineScanner, RawLine};

const SCAN_CHUNK: usize = 64 * 1024;

/// Outcome of asking for a line that may not be indexed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineFetch {
    /// Raw bytes of the line, terminator included.
    Ready(Vec<u8>),
    /// The scan budget ran out before the line was reached; ask again.
    Pending,
    /// The file has fewer lines.
    OutOfRange,
}

#[derive(Debug)]
pub struct HugeTextFile {
    file: File,
    len: u64,
    unit: CodeUnit,
    starts: Vec<u64>,
    /// `None` once the whole file has been indexed.
    scanner: Option<LineScanner>,
    scan_pos: u64,
    found: Vec<RawLine>,
}

impl HugeTextFile {
    pub fn open(path: &Path, encoding: TextEncoding) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let mut start = 0;
        if let Some(bom) = encoding.charset.bom() {
            let mut head = vec![0u8; bom.len()];
            if file.read_exact_at(&mut head, 0).is_ok() && head == bom {
                start = bom.len() as u64;
            }
        }
        debug!(target: "io.load", path = %path.display(), bytes = len, encoding = encoding.label(), "huge_file_opened");
        Ok(Self::new(file, len, CodeUnit::for_charset(encoding.charset), start))
    }

    fn new(file: File, len: u64, unit: CodeUnit, start: u64) -> Self {
        Self {
            file,
            len,
            unit,
            starts: vec![start],
            scanner: Some(LineScanner::new(unit, start)),
            scan_pos: start,
            found: Vec::new(),
        }
    }

    pub fn byte_len(&self) -> u64 {
        self.len
    }

    /// Lines whose start is known so far.
    pub fn known_lines(&self) -> usize {
        self.starts.len()
    }

    pub fn is_fully_indexed(&self) -> bool {
        self.scanner.is_none()
    }

    /// Bytes of `line`, reading at most `scan_budget` chunks of the file to index it.
    pub fn fetch(&mut self, line: usize, scan_budget: usize) -> io::Result<LineFetch> {
        let mut chunks = 0;
        while self.starts.len() <= line + 1 && self.scanner.is_some() && chunks < scan_budget {
            self.scan_chunk()?;
            chunks += 1;
        }
        let Some(&start) = self.starts.get(line) else {
            return Ok(if self.is_fully_indexed() {
                LineFetch::OutOfRange
            } else {
                LineFetch::Pending
            });
        };
        let end = match self.starts.get(line + 1) {
            Some(&next) => next,
            None if self.is_fully_indexed() => self.len,
            None => return Ok(LineFetch::Pending),
        };
        let mut buf = vec![0u8; (end - start) as usize];
        self.file.read_exact_at(&mut buf, start)?;
        Ok(LineFetch::Ready(buf))
    }

    fn scan_chunk(&mut self) -> io::Result<()> {
        let Some(scanner) = self.scanner.as_mut() else {
            return Ok(());
        };
        let mut buf = vec![0u8; SCAN_CHUNK];
        let n = self.file.read_at(&mut buf, self.scan_pos)?;
        if n == 0 {
            if let Some(scanner) = self.scanner.take() {
                scanner.finish(&mut self.found);
            }
            trace!(target: "io.load", lines = self.starts.len(), "huge_file_indexed");
        } else {
            scanner.feed(&buf[..n], &mut self.found);
            self.scan_pos += n as u64;
        }
        for raw in self.found.drain(..) {
            if raw.ending != LineEnding::None {
                self.starts
                    .push(raw.offset + raw.len + self.unit.terminator_len(raw.ending));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Charset;

    fn huge(bytes: &[u8], encoding: TextEncoding) -> (tempfile::TempDir, HugeTextFile) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        std::fs::write(&path, bytes).unwrap();
        let file = HugeTextFile::open(&path, encoding).unwrap();
        (dir, file)
    }

    #[test]
    fn lines_include_their_terminators() {
        let (_dir, mut f) = huge(b"a\r\nbb\rccc\n", TextEncoding::utf8());
        assert_eq!(f.fetch(0, 10).unwrap(), LineFetch::Ready(b"a\r\n".to_vec()));
        assert_eq!(f.fetch(1, 10).unwrap(), LineFetch::Ready(b"bb\r".to_vec()));
        assert_eq!(f.fetch(2, 10).unwrap(), LineFetch::Ready(b"ccc\n".to_vec()));
        assert_eq!(f.fetch(3, 10).unwrap(), LineFetch::Ready(Vec::new()));
        assert_eq!(f.fetch(4, 10).unwrap(), LineFetch::OutOfRange);
    }

    #[test]
    fn terminator_at_offset_zero_is_found() {
        let (_dir, mut f) = huge(b"\nx", TextEncoding::utf8());
        assert_eq!(f.fetch(0, 10).unwrap(), LineFetch::Ready(b"\n".to_vec()));
        assert_eq!(f.fetch(1, 10).unwrap(), LineFetch::Ready(b"x".to_vec()));
    }

    #[test]
    fn budget_exhaustion_is_pending_not_missing() {
        let body = "0123456789\n".repeat(SCAN_CHUNK / 11 * 3);
        let (_dir, mut f) = huge(body.as_bytes(), TextEncoding::utf8());
        let far = SCAN_CHUNK / 11 * 2;
        assert_eq!(f.fetch(far, 1).unwrap(), LineFetch::Pending);
        assert!(!f.is_fully_indexed());
        let mut result = LineFetch::Pending;
        for _ in 0..10 {
            result = f.fetch(far, 1).unwrap();
            if result != LineFetch::Pending {
                break;
            }
        }
        assert_eq!(result, LineFetch::Ready(b"0123456789\n".to_vec()));
    }

    #[test]
    fn utf16_files_skip_the_bom() {
        let mut bytes = vec![0xFE, 0xFF];
        bytes.extend(Charset::Utf16Be.encode("hi\nyo"));
        let (_dir, mut f) = huge(&bytes, TextEncoding::new(Charset::Utf16Be, true));
        assert_eq!(
            f.fetch(0, 10).unwrap(),
            LineFetch::Ready(Charset::Utf16Be.encode("hi\n"))
        );
        assert_eq!(f.fetch(1, 10).unwrap(), LineFetch::Ready(Charset::Utf16Be.encode("yo")));
        assert_eq!(f.fetch(2, 10).unwrap(), LineFetch::OutOfRange);
    }
}
