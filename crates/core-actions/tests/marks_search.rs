mod common;

use common::Harness;
use core_actions::{DispatchResult, Notice};
use core_state::SearchQuery;
use pretty_assertions::assert_eq;

#[test]
fn bookmarks_toggle_and_jump() {
    let mut h = Harness::new("a\nb\nc\nd");
    h.caret(2, 0);
    h.run("Bookmark1");
    assert_eq!(h.view.document().bookmarks()[0].tag, 1);
    h.caret(0, 0);
    h.run("BookmarkNext");
    assert_eq!(h.cursor(), (2, 0));
    h.run("BookmarkNext");
    assert_eq!(h.cursor(), (2, 0));
    assert_eq!(h.view.take_notices(), vec![Notice::BookmarkNotFound]);

    h.run("Bookmark1");
    assert!(h.view.document().bookmarks().is_empty());
}

#[test]
fn bookmark_cycle_steps_through_all_tags() {
    let mut h = Harness::new("a");
    let tags: Vec<u8> = (0..4)
        .map(|_| {
            h.run("Bookmark123");
            h.view.document().lines()[0].bookmark
        })
        .collect();
    assert_eq!(tags, vec![1, 2, 3, 0]);
}

#[test]
fn modified_line_seek_in_both_directions() {
    let mut h = Harness::new("a\nb\nc\nd");
    h.caret(2, 1);
    h.run("InsertTab");
    h.caret(0, 0);
    h.run("ModifiedLineNext");
    assert_eq!(h.cursor(), (2, 0));
    h.caret(3, 0);
    h.run("SelectModifiedLinePrev");
    let sel = h.view.selection();
    assert_eq!((sel.anchor().line, sel.cursor().line), (3, 2));
    h.caret(0, 0);
    h.run("ModifiedLinePrev");
    assert_eq!(h.view.take_notices(), vec![Notice::ModifiedLineNotFound]);
}

#[test]
fn search_selects_hits_with_the_caret_at_the_start() {
    let mut h = Harness::new("foo bar\nbaz foo");
    h.view
        .set_search_query(Some(SearchQuery::new("foo", false, true, false).unwrap()));
    h.caret(0, 1);
    assert_eq!(h.run("SearchNext"), DispatchResult::dirty());
    let sel = h.view.selection();
    assert_eq!(
        (sel.anchor().line, sel.anchor().index, sel.cursor().line, sel.cursor().index),
        (1, 7, 1, 4)
    );
    h.run("SearchPrev");
    assert_eq!(h.cursor(), (0, 0));
    assert_eq!(h.view.selection().right.index, 3);
}

#[test]
fn failed_search_leaves_a_notice() {
    let mut h = Harness::new("abc");
    assert_eq!(h.run("SearchNext"), DispatchResult::clean());
    h.view
        .set_search_query(Some(SearchQuery::new("zzz", false, true, false).unwrap()));
    h.run("SearchPrev");
    assert_eq!(
        h.view.take_notices(),
        vec![Notice::NoSearch, Notice::NotFound("zzz".into())]
    );
}
