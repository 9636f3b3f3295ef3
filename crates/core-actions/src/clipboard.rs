//! Clipboard seam for copy, cut, and paste.

/// Clipboard contents plus whether they were copied from a block selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClipText {
    pub text: String,
    pub block: bool,
}

pub trait Clipboard {
    fn set(&mut self, clip: ClipText);
    fn get(&self) -> Option<ClipText>;
}

/// In-process clipboard. Remembers the block shape alongside the text, so block copies paste back
/// as blocks.
#[derive(Debug, Default)]
pub struct LocalClipboard {
    content: Option<ClipText>,
}

impl LocalClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for LocalClipboard {
    fn set(&mut self, clip: ClipText) {
        self.content = Some(clip);
    }

    fn get(&self) -> Option<ClipText> {
        self.content.clone().filter(|c| !c.text.is_empty())
    }
}
