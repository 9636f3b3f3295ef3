//! Charsets a document can be stored in.
//!
//! Decoding and encoding go through `encoding_rs`, except for ASCII (checked directly) and
//! UTF-16 output (`encoding_rs` only decodes UTF-16). Characters a charset cannot represent are
//! written as `?`.

use std::borrow::Cow;
use std::fmt;

use encoding_rs::{EUC_JP, EncoderResult, Encoding, ISO_2022_JP, SHIFT_JIS, UTF_8, UTF_16BE, UTF_16LE};

use crate::LineEnding;

const WAVE_DASH: char = '\u{301C}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    Ascii,
    Utf8,
    /// Windows code page 932.
    ShiftJis,
    EucJp,
    Iso2022Jp,
    Utf16Le,
    Utf16Be,
}

impl Charset {
    pub fn name(self) -> &'static str {
        match self {
            Charset::Ascii => "ascii",
            Charset::Utf8 => "utf-8",
            Charset::ShiftJis => "shift-jis",
            Charset::EucJp => "euc-jp",
            Charset::Iso2022Jp => "iso-2022-jp",
            Charset::Utf16Le => "utf-16-le",
            Charset::Utf16Be => "utf-16-be",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        Some(match normalized.as_str() {
            "ascii" | "us-ascii" => Charset::Ascii,
            "utf-8" | "utf8" | "utf-8n" => Charset::Utf8,
            "shift-jis" | "sjis" | "cp932" | "windows-31j" => Charset::ShiftJis,
            "euc-jp" | "eucjp" => Charset::EucJp,
            "iso-2022-jp" | "jis" => Charset::Iso2022Jp,
            "utf-16-le" | "utf-16le" => Charset::Utf16Le,
            "utf-16-be" | "utf-16be" => Charset::Utf16Be,
            _ => return None,
        })
    }

    /// Byte-order mark written when a BOM is requested.
    pub fn bom(self) -> Option<&'static [u8]> {
        match self {
            Charset::Utf8 => Some(b"\xEF\xBB\xBF"),
            Charset::Utf16Le => Some(b"\xFF\xFE"),
            Charset::Utf16Be => Some(b"\xFE\xFF"),
            _ => None,
        }
    }

    pub fn is_utf16(self) -> bool {
        matches!(self, Charset::Utf16Le | Charset::Utf16Be)
    }

    fn backend(self) -> Option<&'static Encoding> {
        match self {
            Charset::Ascii => None,
            Charset::Utf8 => Some(UTF_8),
            Charset::ShiftJis => Some(SHIFT_JIS),
            Charset::EucJp => Some(EUC_JP),
            Charset::Iso2022Jp => Some(ISO_2022_JP),
            Charset::Utf16Le => Some(UTF_16LE),
            Charset::Utf16Be => Some(UTF_16BE),
        }
    }

    /// Decode, or `None` if `bytes` are malformed in this charset.
    pub fn decode_strict(self, bytes: &[u8]) -> Option<String> {
        match self.backend() {
            None => bytes
                .is_ascii()
                .then(|| bytes.iter().map(|&b| char::from(b)).collect()),
            Some(enc) => enc
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
        }
    }

    /// Decode, substituting U+FFFD for malformed sequences.
    pub fn decode_lossy(self, bytes: &[u8]) -> String {
        match self.backend() {
            None => bytes
                .iter()
                .map(|&b| if b.is_ascii() { char::from(b) } else { '\u{FFFD}' })
                .collect(),
            Some(enc) => enc.decode_without_bom_handling(bytes).0.into_owned(),
        }
    }

    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Charset::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Charset::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Charset::ShiftJis => {
                // windows-31j has no WAVE DASH; its 0x8160 is FULLWIDTH TILDE
                let text = if text.contains(WAVE_DASH) {
                    Cow::Owned(text.replace(WAVE_DASH, "\u{FF5E}"))
                } else {
                    Cow::Borrowed(text)
                };
                encode_with_fallback(SHIFT_JIS, &text)
            }
            Charset::EucJp | Charset::Iso2022Jp => {
                let Some(enc) = self.backend() else {
                    return Vec::new();
                };
                encode_with_fallback(enc, text)
            }
        }
    }
}

fn encode_with_fallback(enc: &'static Encoding, text: &str) -> Vec<u8> {
    let mut encoder = enc.new_encoder();
    let mut out = Vec::with_capacity(text.len() + 8);
    let mut rest = text;
    let mut replaced = 0usize;
    loop {
        let (result, read) = encoder.encode_from_utf8_to_vec_without_replacement(rest, &mut out, true);
        rest = &rest[read..];
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => out.reserve(rest.len() * 2 + 16),
            // the encoder is back in its ASCII state when it reports an unmappable
            EncoderResult::Unmappable(_) => {
                out.push(b'?');
                replaced += 1;
            }
        }
    }
    if replaced > 0 {
        tracing::debug!(target: "text.encoding", charset = enc.name(), replaced, "unmappable_replaced");
    }
    out
}

/// Charset plus whether the file carries a byte-order mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextEncoding {
    pub charset: Charset,
    pub bom: bool,
}

impl TextEncoding {
    pub const fn new(charset: Charset, bom: bool) -> Self {
        Self { charset, bom }
    }

    pub const fn utf8() -> Self {
        Self::new(Charset::Utf8, false)
    }

    pub fn bom_bytes(&self) -> &'static [u8] {
        if self.bom {
            self.charset.bom().unwrap_or_default()
        } else {
            &[]
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        self.charset.decode_lossy(bytes)
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        self.charset.encode(text)
    }

    pub fn encode_line_ending(&self, ending: LineEnding) -> Vec<u8> {
        self.charset.encode(ending.as_str())
    }

    /// Display label; BOM-less UTF-8 reads `utf-8n`.
    pub fn label(&self) -> &'static str {
        match (self.charset, self.bom) {
            (Charset::Utf8, false) => "utf-8n",
            (charset, _) => charset.name(),
        }
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self::utf8()
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
