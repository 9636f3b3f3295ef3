mod common;

use common::Harness;
use core_actions::DispatchResult;
use pretty_assertions::assert_eq;

#[test]
fn plain_moves_collapse_a_selection_to_its_edge() {
    let mut h = Harness::new("abcdef");
    h.select((0, 1), (0, 4), false);
    h.run("CursorLeft");
    assert_eq!(h.cursor(), (0, 1));
    assert!(h.view.selection().is_empty());

    h.select((0, 4), (0, 1), false);
    h.run("CursorRight");
    assert_eq!(h.cursor(), (0, 4));
}

#[test]
fn left_and_right_wrap_across_lines() {
    let mut h = Harness::new("ab\ncd");
    h.caret(1, 0);
    h.run("CursorLeft");
    assert_eq!(h.cursor(), (0, 2));
    h.run("CursorRight");
    assert_eq!(h.cursor(), (1, 0));
}

#[test]
fn vertical_moves_keep_the_ideal_column() {
    let mut h = Harness::new("abcdef\nx\nabcdef");
    h.caret(0, 4);
    assert_eq!(h.view.ideal_column(), 4);
    h.run("CursorDown");
    assert_eq!(h.cursor(), (1, 1));
    h.run("CursorDown");
    assert_eq!(h.cursor(), (2, 4));
    assert_eq!(h.view.ideal_column(), 4);
    h.run("CursorUp");
    h.run("CursorUp");
    assert_eq!(h.cursor(), (0, 4));
}

#[test]
fn select_moves_keep_the_anchor() {
    let mut h = Harness::new("one two\nthree");
    h.caret(0, 0);
    h.run_all(&["SelectWordRight", "SelectDown"]);
    let sel = h.view.selection();
    assert_eq!((sel.anchor().line, sel.anchor().index), (0, 0));
    assert_eq!(sel.cursor().line, 1);
    assert!(!sel.is_empty());
    h.run("SelectCancel");
    assert!(h.view.selection().is_empty());
    assert_eq!(h.cursor().0, 1);
}

#[test]
fn document_edges_and_whole_document_selection() {
    let mut h = Harness::new("a\nbb\nccc");
    h.run("CursorDocumentEnd");
    assert_eq!(h.cursor(), (2, 3));
    h.run("CursorDocumentBegin");
    assert_eq!(h.cursor(), (0, 0));
    h.run("SelectDocument");
    let sel = h.view.selection();
    assert_eq!((sel.left.line, sel.left.index, sel.right.line, sel.right.index), (0, 0, 2, 3));
}

#[test]
fn first_graph_reports_unhandled_when_already_there() {
    let mut h = Harness::new("    x");
    h.caret(0, 0);
    assert_eq!(h.run("CursorLineFirstGraph"), DispatchResult::dirty());
    assert_eq!(h.cursor(), (0, 4));
    assert_eq!(h.run("CursorLineFirstGraph"), DispatchResult::unhandled());
}

#[test]
fn bracket_jump_lands_after_the_match() {
    let mut h = Harness::new("f(a, b) + 1");
    h.caret(0, 1);
    h.run("CursorCorrespondingBracket");
    assert_eq!(h.cursor(), (0, 7));
}

#[test]
fn select_block_switches_shape_in_place() {
    let mut h = Harness::new("abc\ndef");
    h.select((0, 1), (1, 2), false);
    h.run("SelectBlock");
    let sel = h.view.selection();
    assert!(sel.block_mode);
    assert_eq!((sel.left.line, sel.left.index, sel.right.line, sel.right.index), (0, 1, 1, 2));
    assert_eq!(h.view.selected_text(), "b\ne");
}

#[test]
fn no_op_move_is_clean() {
    let mut h = Harness::new("abc");
    h.caret(0, 0);
    assert_eq!(h.run("CursorLeft"), DispatchResult::clean());
}
