mod common;

use common::Harness;
use core_actions::{ClipText, Clipboard, DispatchResult};
use pretty_assertions::assert_eq;

#[test]
fn copy_without_selection_takes_the_whole_line() {
    let mut h = Harness::new("one\ntwo");
    h.caret(0, 1);
    h.run("Copy");
    assert_eq!(
        h.clipboard.get(),
        Some(ClipText {
            text: "one\n".into(),
            block: false
        })
    );
    assert_eq!(h.text(), "one\ntwo");
}

#[test]
fn cut_line_then_paste_restores_it() {
    let mut h = Harness::new("one\ntwo");
    h.caret(0, 1);
    assert_eq!(h.run("Cut"), DispatchResult::edited());
    assert_eq!(h.text(), "two");
    h.caret(0, 0);
    h.run("Paste");
    assert_eq!(h.text(), "one\ntwo");
    assert_eq!(h.cursor(), (1, 0));
}

#[test]
fn block_copy_pastes_back_as_a_block() {
    let mut h = Harness::new("abcd\nefgh");
    h.select((0, 1), (1, 3), true);
    h.run("Copy");
    assert_eq!(
        h.clipboard.get(),
        Some(ClipText {
            text: "bc\nfg".into(),
            block: true
        })
    );
    h.caret(0, 0);
    h.run("Paste");
    assert_eq!(h.text(), "bcabcd\nfgefgh");
}

#[test]
fn cut_selection_removes_it() {
    let mut h = Harness::new("hello world");
    h.select((0, 5), (0, 11), false);
    h.run("Cut");
    assert_eq!(h.text(), "hello");
    assert_eq!(h.clipboard.get().map(|c| c.text), Some(" world".into()));
}

#[test]
fn paste_with_empty_clipboard_is_unhandled() {
    let mut h = Harness::new("abc");
    assert_eq!(h.run("Paste"), DispatchResult::unhandled());
}
