use std::borrow::Cow;
use std::fmt;

use smallvec::SmallVec;

/// Token classes understood by renderers. Discriminants are the packed wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum TokenClass {
    Error = -1,
    Text = 0,
    Keyword = 1,
    Name = 2,
    Number = 3,
    String = 4,
    Preproc = 5,
    Comment = 6,
    Space = 7,
}

impl TokenClass {
    pub const fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            -1 => Self::Error,
            0 => Self::Text,
            1 => Self::Keyword,
            2 => Self::Name,
            3 => Self::Number,
            4 => Self::String,
            5 => Self::Preproc,
            6 => Self::Comment,
            7 => Self::Space,
            _ => return None,
        })
    }
}

/// Start of a run of one token class, as a character offset into the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub class: TokenClass,
}

impl Token {
    pub const fn new(start: usize, class: TokenClass) -> Self {
        Self { start, class }
    }
}

pub type TokenList = SmallVec<[Token; 8]>;

const PAIR_BYTES: usize = 8;
static PLAIN_LINE: [u8; PAIR_BYTES] = [0; PAIR_BYTES];

/// Packed token list: little-endian `(i32 start, i32 class)` pairs.
///
/// The single-pair "whole line is Text" list borrows a shared static buffer, so the most common
/// case costs no allocation.
#[derive(Clone, PartialEq, Eq)]
pub struct PackedTokens(Cow<'static, [u8]>);

impl PackedTokens {
    pub fn plain() -> Self {
        Self(Cow::Borrowed(&PLAIN_LINE))
    }

    pub fn pack(tokens: &[Token]) -> Self {
        if let [only] = tokens
            && only.start == 0
            && only.class == TokenClass::Text
        {
            return Self::plain();
        }
        let mut bytes = Vec::with_capacity(tokens.len() * PAIR_BYTES);
        for token in tokens {
            let start = i32::try_from(token.start).unwrap_or(i32::MAX);
            bytes.extend_from_slice(&start.to_le_bytes());
            bytes.extend_from_slice(&token.class.code().to_le_bytes());
        }
        Self(Cow::Owned(bytes))
    }

    /// `true` when this list shares the static plain-text encoding.
    pub fn is_plain(&self) -> bool {
        matches!(self.0, Cow::Borrowed(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len() / PAIR_BYTES
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw `(start, class)` pairs in storage order.
    pub fn pairs(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.0.chunks_exact(PAIR_BYTES).map(|pair| {
            let start = i32::from_le_bytes([pair[0], pair[1], pair[2], pair[3]]);
            let class = i32::from_le_bytes([pair[4], pair[5], pair[6], pair[7]]);
            (start, class)
        })
    }

    /// Decoded tokens; unknown class codes decode as `Error`.
    pub fn tokens(&self) -> impl Iterator<Item = Token> + '_ {
        self.pairs().map(|(start, class)| {
            Token::new(
                usize::try_from(start).unwrap_or(0),
                TokenClass::from_code(class).unwrap_or(TokenClass::Error),
            )
        })
    }

    /// Class covering character `offset`, `Text` before the first pair.
    pub fn class_at(&self, offset: usize) -> TokenClass {
        self.tokens()
            .take_while(|t| t.start <= offset)
            .last()
            .map_or(TokenClass::Text, |t| t.class)
    }
}

impl fmt::Debug for PackedTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tokens()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_list_is_shared() {
        let a = PackedTokens::pack(&[Token::new(0, TokenClass::Text)]);
        let b = PackedTokens::plain();
        assert!(a.is_plain());
        assert_eq!(a.as_bytes().as_ptr(), b.as_bytes().as_ptr());
        assert_eq!(a.pairs().collect::<Vec<_>>(), vec![(0, 0)]);
    }

    #[test]
    fn packs_little_endian_pairs() {
        let packed = PackedTokens::pack(&[
            Token::new(0, TokenClass::Keyword),
            Token::new(3, TokenClass::Space),
            Token::new(4, TokenClass::Error),
        ]);
        assert!(!packed.is_plain());
        assert_eq!(packed.len(), 3);
        assert_eq!(&packed.as_bytes()[..8], &[0, 0, 0, 0, 1, 0, 0, 0]);
        assert_eq!(&packed.as_bytes()[16..], &[4, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(packed.class_at(2), TokenClass::Keyword);
        assert_eq!(packed.class_at(3), TokenClass::Space);
        assert_eq!(packed.class_at(40), TokenClass::Error);
    }

    #[test]
    fn class_codes_round_trip() {
        for code in -1..=7 {
            assert_eq!(TokenClass::from_code(code).map(TokenClass::code), Some(code));
        }
        assert_eq!(TokenClass::from_code(8), None);
    }
}
