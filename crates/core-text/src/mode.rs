use crate::WordBreak;

/// Editing conventions attached to a document: tab stops, word boundaries, bracket pairs.
#[derive(Debug, Clone)]
pub struct TextMode {
    pub name: String,
    pub tab_width: usize,
    /// Insert spaces instead of a tab character.
    pub tab_by_space: bool,
    pub word_break: WordBreak,
    pub brackets: Vec<(char, char)>,
}

impl TextMode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tab_width: 4,
            tab_by_space: false,
            word_break: WordBreak::source(),
            brackets: vec![('{', '}'), ('(', ')'), ('[', ']'), ('<', '>')],
        }
    }

    pub fn with_tab_width(mut self, tab_width: usize) -> Self {
        self.tab_width = tab_width.max(1);
        self
    }

    pub fn with_tab_by_space(mut self, tab_by_space: bool) -> Self {
        self.tab_by_space = tab_by_space;
        self
    }

    pub fn with_word_break(mut self, word_break: WordBreak) -> Self {
        self.word_break = word_break;
        self
    }

    /// Text inserted by a tab key press at `column`.
    pub fn tab_text(&self, column: usize) -> String {
        if self.tab_by_space {
            let width = self.tab_width - column % self.tab_width;
            " ".repeat(width)
        } else {
            "\t".to_string()
        }
    }
}

impl Default for TextMode {
    fn default() -> Self {
        Self::new("text")
    }
}
