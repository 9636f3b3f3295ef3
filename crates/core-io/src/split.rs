//! Line splitting over raw bytes, fed in chunks.
//!
//! The scanner only records where lines start and end, so a chunk boundary costs nothing beyond
//! remembering a pending CR (it may be the first half of a CRLF) and, for UTF-16, an odd byte.

use core_text::{Charset, LineEnding};

const CR: u16 = 0x0D;
const LF: u16 = 0x0A;

/// Width and byte order of the code units terminators are searched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeUnit {
    Byte,
    Utf16Le,
    Utf16Be,
}

impl CodeUnit {
    pub fn for_charset(charset: Charset) -> Self {
        match charset {
            Charset::Utf16Le => CodeUnit::Utf16Le,
            Charset::Utf16Be => CodeUnit::Utf16Be,
            _ => CodeUnit::Byte,
        }
    }

    pub fn width(self) -> u64 {
        match self {
            CodeUnit::Byte => 1,
            CodeUnit::Utf16Le | CodeUnit::Utf16Be => 2,
        }
    }

    /// Bytes taken by `ending` in this unit width.
    pub fn terminator_len(self, ending: LineEnding) -> u64 {
        ending.as_str().len() as u64 * self.width()
    }

    fn join(self, first: u8, second: u8) -> u16 {
        match self {
            CodeUnit::Utf16Be => u16::from_be_bytes([first, second]),
            _ => u16::from_le_bytes([first, second]),
        }
    }
}

/// One line found by the scanner: content bytes (terminator excluded) and how it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLine {
    pub offset: u64,
    pub len: u64,
    pub ending: LineEnding,
}

#[derive(Debug)]
pub struct LineScanner {
    unit: CodeUnit,
    line_start: u64,
    pos: u64,
    pending_cr: Option<u64>,
    carry: Option<u8>,
}

impl LineScanner {
    /// Start scanning at absolute offset `start` (past any BOM).
    pub fn new(unit: CodeUnit, start: u64) -> Self {
        Self {
            unit,
            line_start: start,
            pos: start,
            pending_cr: None,
            carry: None,
        }
    }

    pub fn feed(&mut self, chunk: &[u8], out: &mut Vec<RawLine>) {
        if self.unit == CodeUnit::Byte {
            for &b in chunk {
                self.step(u16::from(b), out);
            }
            return;
        }
        let mut rest = chunk;
        if let Some(first) = self.carry.take() {
            let Some((&second, tail)) = rest.split_first() else {
                self.carry = Some(first);
                return;
            };
            self.step(self.unit.join(first, second), out);
            rest = tail;
        }
        let mut pairs = rest.chunks_exact(2);
        for pair in &mut pairs {
            self.step(self.unit.join(pair[0], pair[1]), out);
        }
        self.carry = pairs.remainder().first().copied();
    }

    /// Flush the last line, which is always produced (possibly empty) and never terminated.
    pub fn finish(mut self, out: &mut Vec<RawLine>) {
        if let Some(cr) = self.pending_cr.take() {
            let next = cr + self.unit.width();
            self.emit(cr, LineEnding::Cr, next, out);
        }
        // an odd trailing byte of a UTF-16 file stays part of the last line
        let end = self.pos + u64::from(self.carry.is_some());
        out.push(RawLine {
            offset: self.line_start,
            len: end - self.line_start,
            ending: LineEnding::None,
        });
    }

    fn step(&mut self, unit: u16, out: &mut Vec<RawLine>) {
        let at = self.pos;
        self.pos += self.unit.width();
        if let Some(cr) = self.pending_cr.take() {
            if unit == LF {
                self.emit(cr, LineEnding::Crlf, self.pos, out);
                return;
            }
            self.emit(cr, LineEnding::Cr, at, out);
        }
        match unit {
            CR => self.pending_cr = Some(at),
            LF => self.emit(at, LineEnding::Lf, self.pos, out),
            _ => {}
        }
    }

    fn emit(&mut self, end: u64, ending: LineEnding, next_start: u64, out: &mut Vec<RawLine>) {
        out.push(RawLine {
            offset: self.line_start,
            len: end - self.line_start,
            ending,
        });
        self.line_start = next_start;
    }
}

/// Split a complete in-memory buffer.
pub fn split_all(data: &[u8], unit: CodeUnit) -> Vec<RawLine> {
    let mut out = Vec::new();
    let mut scanner = LineScanner::new(unit, 0);
    scanner.feed(data, &mut out);
    scanner.finish(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shape(lines: &[RawLine]) -> Vec<(u64, u64, LineEnding)> {
        lines.iter().map(|l| (l.offset, l.len, l.ending)).collect()
    }

    #[test]
    fn bytes_split_on_every_terminator() {
        let lines = split_all(b"ab\r\ncd\ref\n", CodeUnit::Byte);
        assert_eq!(
            shape(&lines),
            vec![
                (0, 2, LineEnding::Crlf),
                (4, 2, LineEnding::Cr),
                (7, 2, LineEnding::Lf),
                (10, 0, LineEnding::None),
            ]
        );
    }

    #[test]
    fn crlf_split_across_chunks_stays_one_break() {
        let mut out = Vec::new();
        let mut scanner = LineScanner::new(CodeUnit::Byte, 0);
        scanner.feed(b"ab\r", &mut out);
        assert!(out.is_empty());
        scanner.feed(b"\ncd", &mut out);
        scanner.finish(&mut out);
        assert_eq!(shape(&out), vec![(0, 2, LineEnding::Crlf), (4, 2, LineEnding::None)]);
    }

    #[test]
    fn trailing_cr_is_a_break() {
        let lines = split_all(b"a\r", CodeUnit::Byte);
        assert_eq!(shape(&lines), vec![(0, 1, LineEnding::Cr), (2, 0, LineEnding::None)]);
    }

    #[test]
    fn utf16_terminators_across_odd_chunks() {
        let data = Charset::Utf16Le.encode("a\r\nb");
        let mut out = Vec::new();
        let mut scanner = LineScanner::new(CodeUnit::Utf16Le, 0);
        for chunk in data.chunks(3) {
            scanner.feed(chunk, &mut out);
        }
        scanner.finish(&mut out);
        assert_eq!(shape(&out), vec![(0, 2, LineEnding::Crlf), (6, 2, LineEnding::None)]);

        let be = split_all(&Charset::Utf16Be.encode("x\ny"), CodeUnit::Utf16Be);
        assert_eq!(shape(&be), vec![(0, 2, LineEnding::Lf), (4, 2, LineEnding::None)]);
    }

    #[test]
    fn scanning_starts_past_the_bom() {
        let mut out = Vec::new();
        let mut scanner = LineScanner::new(CodeUnit::Byte, 3);
        scanner.feed(b"hi\n", &mut out);
        scanner.finish(&mut out);
        assert_eq!(shape(&out), vec![(3, 2, LineEnding::Lf), (6, 0, LineEnding::None)]);
    }
}
