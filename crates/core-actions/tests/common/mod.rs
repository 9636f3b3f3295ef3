#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use std::cell::RefCell;
use std::rc::Rc;

use core_actions::{CommandContext, DispatchResult, EditorView, LocalClipboard, dispatch};
use core_state::Document;
use core_text::Point;

/// A view plus the clipboard commands run against.
pub struct Harness {
    pub view: EditorView,
    pub clipboard: LocalClipboard,
}

impl Harness {
    pub fn new(text: &str) -> Self {
        Self::on(Rc::new(RefCell::new(Document::from_text(text))))
    }

    pub fn on(doc: Rc<RefCell<Document>>) -> Self {
        Self {
            view: EditorView::new(doc),
            clipboard: LocalClipboard::new(),
        }
    }

    pub fn run(&mut self, name: &str) -> DispatchResult {
        let mut ctx = CommandContext::new(&mut self.clipboard);
        dispatch(name, &mut self.view, &mut ctx).expect("registered command")
    }

    pub fn run_all(&mut self, names: &[&str]) {
        for name in names {
            self.run(name);
        }
    }

    pub fn text(&self) -> String {
        self.view.document().text()
    }

    pub fn caret(&mut self, line: usize, index: usize) {
        self.view.set_cursor(Point::new(line, index), true);
    }

    pub fn select(&mut self, anchor: (usize, usize), cursor: (usize, usize), block: bool) {
        self.view.set_selection(
            Point::new(anchor.0, anchor.1),
            Point::new(cursor.0, cursor.1),
            Some(block),
            true,
        );
    }

    pub fn cursor(&self) -> (usize, usize) {
        let c = self.view.cursor();
        (c.line, c.index)
    }
}
