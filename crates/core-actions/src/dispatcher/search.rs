use super::DispatchResult;
use crate::view::EditorView;

pub(crate) fn handle_search(view: &mut EditorView, forward: bool) -> DispatchResult {
    match view.search(forward) {
        Some(hit) => {
            tracing::trace!(target: "actions.dispatch", op = "search", forward, line = hit.line, start = hit.start, "search_hit");
            DispatchResult::dirty()
        }
        None => DispatchResult::clean(),
    }
}
