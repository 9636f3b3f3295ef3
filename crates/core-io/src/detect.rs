//! Charset detection for files without an explicit encoding.
//!
//! A byte-order mark decides outright. Otherwise any NUL byte marks the data binary, and the
//! remaining candidates are scored line by line over a sample: a line that fails to decode costs
//! a point, a line that decodes to fewer characters than it has bytes (multi-byte text decoded
//! cleanly) earns one. The first candidate with the highest score wins.

use core_text::{Charset, LineEnding, TextEncoding};
use tracing::debug;

use crate::split::{CodeUnit, split_all};

const CANDIDATES: [Charset; 5] = [
    Charset::Ascii,
    Charset::ShiftJis,
    Charset::EucJp,
    Charset::Iso2022Jp,
    Charset::Utf8,
];

#[derive(Debug, Clone, Copy)]
pub struct DetectOptions {
    /// Bytes of the file examined when scoring.
    pub sample_bytes: usize,
    /// Lines examined when scoring.
    pub sample_lines: usize,
    /// Charset that pure-ASCII data is reported as.
    pub ascii_fallback: Option<Charset>,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            sample_bytes: 1 << 20,
            sample_lines: 1000,
            ascii_fallback: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detected {
    Text(TextEncoding),
    /// The data contains NUL bytes.
    Binary,
    /// No candidate decoded the sample well enough.
    Unknown,
}

pub fn detect_encoding(data: &[u8], opts: &DetectOptions) -> Detected {
    for charset in [Charset::Utf8, Charset::Utf16Le, Charset::Utf16Be] {
        if let Some(bom) = charset.bom()
            && data.starts_with(bom)
        {
            debug!(target: "io.load", charset = charset.name(), "bom_detected");
            return Detected::Text(TextEncoding::new(charset, true));
        }
    }
    if data.contains(&0) {
        debug!(target: "io.load", "binary_detected");
        return Detected::Binary;
    }

    let truncated = data.len() > opts.sample_bytes;
    let sample = &data[..data.len().min(opts.sample_bytes)];
    let mut lines = split_all(sample, CodeUnit::Byte);
    if lines.last().is_some_and(|l| l.len == 0 && l.ending == LineEnding::None) {
        lines.pop();
    }
    // a cut-off final line may end inside a multi-byte character
    if truncated && lines.len() > 1 {
        lines.pop();
    }

    let mut scores = [0i64; CANDIDATES.len()];
    let mut read = 0usize;
    for line in lines.iter().take(opts.sample_lines.max(1)) {
        let start = line.offset as usize;
        let bytes = &sample[start..start + line.len as usize];
        for (score, charset) in scores.iter_mut().zip(CANDIDATES) {
            match charset.decode_strict(bytes) {
                None => *score -= 1,
                Some(text) if text.chars().count() < bytes.len() => *score += 1,
                Some(_) => {}
            }
        }
        read += 1;
    }

    let mut best: Option<Charset> = None;
    let mut best_score = -1 - (read / 100) as i64;
    for (score, charset) in scores.into_iter().zip(CANDIDATES) {
        if score > best_score {
            best = Some(charset);
            best_score = score;
        }
    }
    debug!(target: "io.load", lines = read, ?scores, best = best.map(Charset::name), "encoding_scored");
    match best {
        None => Detected::Unknown,
        Some(Charset::Ascii) => {
            let charset = opts.ascii_fallback.unwrap_or(Charset::Ascii);
            Detected::Text(TextEncoding::new(charset, false))
        }
        Some(charset) => Detected::Text(TextEncoding::new(charset, false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(data: &[u8]) -> Detected {
        detect_encoding(data, &DetectOptions::default())
    }

    #[test]
    fn bom_decides_before_anything_else() {
        assert_eq!(
            detect(b"\xEF\xBB\xBFabc"),
            Detected::Text(TextEncoding::new(Charset::Utf8, true))
        );
        assert_eq!(
            detect(b"\xFF\xFEa\x00"),
            Detected::Text(TextEncoding::new(Charset::Utf16Le, true))
        );
        assert_eq!(
            detect(b"\xFE\xFF\x00a"),
            Detected::Text(TextEncoding::new(Charset::Utf16Be, true))
        );
    }

    #[test]
    fn nul_byte_means_binary() {
        assert_eq!(detect(b"abc\x00def"), Detected::Binary);
    }

    #[test]
    fn multibyte_text_picks_its_charset() {
        assert_eq!(
            detect("日本語\n".as_bytes()),
            Detected::Text(TextEncoding::new(Charset::Utf8, false))
        );
        let sjis = Charset::ShiftJis.encode("日本語\n");
        assert_eq!(
            detect(&sjis),
            Detected::Text(TextEncoding::new(Charset::ShiftJis, false))
        );
    }

    #[test]
    fn ascii_uses_the_fallback() {
        assert_eq!(
            detect(b"plain\ntext\n"),
            Detected::Text(TextEncoding::new(Charset::Ascii, false))
        );
        let opts = DetectOptions {
            ascii_fallback: Some(Charset::Utf8),
            ..DetectOptions::default()
        };
        assert_eq!(
            detect_encoding(b"plain", &opts),
            Detected::Text(TextEncoding::utf8())
        );
        assert_eq!(
            detect_encoding(b"", &opts),
            Detected::Text(TextEncoding::utf8())
        );
    }

    #[test]
    fn undecodable_bytes_are_unknown() {
        assert_eq!(detect(b"\xFF\xFF\xFF\n"), Detected::Unknown);
    }
}
