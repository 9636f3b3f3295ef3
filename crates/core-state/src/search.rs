use core_text::{LineTable, Point, byte_offset};
use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::debug;

use crate::document::Document;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search text is empty")]
    Empty,
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// A compiled search: literal or regex text, case sensitivity, whole-word constraint.
///
/// Whole-word matching is dropped when the query does not begin and end with a word character,
/// since `\b` could never match there.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    text: String,
    word: bool,
    case: bool,
    regex: bool,
    pattern: Regex,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl SearchQuery {
    pub fn new(text: &str, word: bool, case: bool, regex: bool) -> Result<Self, SearchError> {
        let (Some(first), Some(last)) = (text.chars().next(), text.chars().last()) else {
            return Err(SearchError::Empty);
        };
        let word = word && is_word_char(first) && is_word_char(last);
        let body = if regex {
            text.to_string()
        } else {
            regex::escape(text)
        };
        let source = if word {
            format!(r"\b(?:{body})\b")
        } else {
            body
        };
        let pattern = RegexBuilder::new(&source)
            .case_insensitive(!case)
            .build()?;
        debug!(target: "state.edit", %text, word, case, regex, "search_compiled");
        Ok(Self {
            text: text.to_string(),
            word,
            case,
            regex,
            pattern,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn is_word(&self) -> bool {
        self.word
    }
    pub fn is_case_sensitive(&self) -> bool {
        self.case
    }
    pub fn is_regex(&self) -> bool {
        self.regex
    }

    /// First match in `line` starting at or after character `from`, treating the line as if it
    /// ended at character `end`. Returns character offsets.
    pub fn find_in(&self, line: &str, from: usize, end: Option<usize>) -> Option<(usize, usize)> {
        let haystack = match end {
            Some(end) => &line[..byte_offset(line, end)],
            None => line,
        };
        let start = byte_offset(haystack, from);
        let m = self.pattern.find_at(haystack, start)?;
        let chars_before = haystack[..m.start()].chars().count();
        let chars_in = haystack[m.start()..m.end()].chars().count();
        Some((chars_before, chars_before + chars_in))
    }

    /// Last match starting before `end` that also ends by `end`.
    ///
    /// There is no reverse regex search: this scans forward, keeping the latest hit. Positions
    /// advance in bytes; characters are counted once per scanned stretch.
    pub fn rfind_in(&self, line: &str, end: usize) -> Option<(usize, usize)> {
        let len = line.chars().count();
        let haystack = &line[..byte_offset(line, end)];
        let (mut pos, mut pos_chars) = (0usize, 0usize);
        let mut last: Option<(usize, usize, usize)> = None;
        while pos_chars < len {
            let Some(m) = self.pattern.find_at(haystack, pos) else {
                break;
            };
            let start_chars = pos_chars + haystack[pos..m.start()].chars().count();
            last = Some((start_chars, m.start(), m.end()));
            let Some(first) = haystack[m.start()..].chars().next() else {
                break;
            };
            pos = m.start() + first.len_utf8();
            pos_chars = start_chars + 1;
        }
        let (start_chars, start, stop) = last?;
        Some((start_chars, start_chars + haystack[start..stop].chars().count()))
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// A match on one line, in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl SearchHit {
    pub fn start_point(&self) -> Point {
        Point::new(self.line, self.start)
    }

    pub fn end_point(&self) -> Point {
        Point::new(self.line, self.end)
    }
}

impl Document {
    /// Search from `from` line by line. Forward matches start at or after `from`; backward
    /// matches end at or before it. With `single_line` only `from`'s line is examined.
    pub fn search(
        &mut self,
        query: &SearchQuery,
        from: Point,
        forward: bool,
        single_line: bool,
    ) -> Option<SearchHit> {
        let from = from.clamp_to(self);
        let mut line = from.line;
        let mut index = Some(from.index);
        loop {
            let text = self.line_text(line);
            let found = if forward {
                query.find_in(&text, index.unwrap_or(0), None)
            } else {
                let end = index.unwrap_or_else(|| text.chars().count());
                query.rfind_in(&text, end)
            };
            drop(text);
            if let Some((start, end)) = found {
                return Some(SearchHit { line, start, end });
            }
            if single_line {
                return None;
            }
            if forward {
                line += 1;
                if line >= self.lines.len() {
                    return None;
                }
            } else {
                if line == 0 {
                    return None;
                }
                line -= 1;
            }
            index = None;
            self.memory_checkpoint(line);
        }
    }
}
