//! Word boundaries by character class.
//!
//! Characters are classified by the first matching class (`-1` when none matches). A boundary
//! exists wherever the class changes; with strong boundaries requested, only transitions listed
//! for the left-hand class count.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub enum CharClass {
    Chars(String),
    Range(char, char),
}

impl CharClass {
    fn contains(&self, c: char) -> bool {
        match self {
            CharClass::Chars(set) => set.contains(c),
            CharClass::Range(lo, hi) => (*lo..=*hi).contains(&c),
        }
    }
}

const SYMBOLS: &str = "\"!@#$%^&*()+|~-=\\`[]{};:',./<>?";
const BLANKS: &str = " \t";

#[derive(Debug, Clone)]
pub struct WordBreak {
    classes: Vec<CharClass>,
    strong: HashMap<i32, Vec<i32>>,
}

impl WordBreak {
    pub fn new(classes: Vec<CharClass>, strong: &[(i32, &[i32])]) -> Self {
        Self {
            classes,
            strong: strong.iter().map(|(k, v)| (*k, v.to_vec())).collect(),
        }
    }

    /// Plain text: symbols, blanks, everything else.
    pub fn text() -> Self {
        Self::new(
            vec![CharClass::Chars(SYMBOLS.into()), CharClass::Chars(BLANKS.into())],
            &[(-1, &[0]), (0, &[-1]), (1, &[-1, 0])],
        )
    }

    /// File names: a word only ends after a symbol or blank run.
    pub fn filename() -> Self {
        Self::new(
            vec![CharClass::Chars(SYMBOLS.into()), CharClass::Chars(BLANKS.into())],
            &[(-1, &[]), (0, &[-1, 1]), (1, &[-1, 0])],
        )
    }

    /// Source text: symbols, ASCII word characters, CJK punctuation, hiragana, blanks.
    pub fn source() -> Self {
        Self::new(
            vec![
                CharClass::Chars(SYMBOLS.into()),
                CharClass::Range('0', 'z'),
                CharClass::Range('、', '〟'),
                CharClass::Range('ぁ', 'ゖ'),
                CharClass::Chars(BLANKS.into()),
            ],
            &[
                (-1, &[0, 1, 2]),
                (0, &[-1, 1, 2, 3]),
                (1, &[-1, 0, 2, 3]),
                (2, &[-1, 0, 1, 3]),
                (3, &[-1, 0, 1, 2]),
                (4, &[-1, 0, 1, 2, 3]),
            ],
        )
    }

    pub fn class_of(&self, c: char) -> i32 {
        self.classes
            .iter()
            .position(|class| class.contains(c))
            .and_then(|i| i32::try_from(i).ok())
            .unwrap_or(-1)
    }

    fn is_boundary(&self, left: i32, right: i32, strong_only: bool) -> bool {
        left != right
            && (!strong_only || self.strong.get(&left).is_some_and(|r| r.contains(&right)))
    }

    /// Next boundary strictly after (`forward`) or before `pos`, clamped to `[0, chars.len()]`.
    pub fn next_break(&self, chars: &[char], pos: usize, forward: bool, strong_only: bool) -> usize {
        let len = chars.len();
        let mut pos = if forward {
            let p = pos + 1;
            if p >= len {
                return len;
            }
            p
        } else {
            if pos <= 1 {
                return 0;
            }
            pos - 1
        };
        loop {
            let left = self.class_of(chars[pos - 1]);
            let right = self.class_of(chars[pos]);
            if self.is_boundary(left, right, strong_only) {
                return pos;
            }
            if forward {
                pos += 1;
                if pos >= len {
                    return len;
                }
            } else {
                pos -= 1;
                if pos == 0 {
                    return 0;
                }
            }
        }
    }
}

impl Default for WordBreak {
    fn default() -> Self {
        Self::source()
    }
}
