//! Incremental syntax state.
//!
//! Two pointers track staleness: `ctx_dirty` is the first line whose starting context may be
//! wrong, `token_dirty` the first line whose tokens may be. Edits only ever lower them; the passes
//! below raise them again as they converge. Both passes take a line budget so a scheduler can
//! interleave them with input handling.

use core_syntax::{LexContext, PackedTokens};
use core_text::LineTable;
use tracing::trace;

use crate::document::Document;

fn lower(slot: &mut Option<usize>, line: usize) {
    *slot = Some(slot.map_or(line, |d| d.min(line)));
}

impl Document {
    /// Widen the dirty pointers after an edit at `line`.
    pub(crate) fn mark_syntax_dirty(&mut self, line: usize) {
        if let Some(next) = self.lines.get_mut(line + 1) {
            next.lex_context = None;
        }
        if let Some(edited) = self.lines.get_mut(line) {
            edited.tokens = None;
        }
        lower(&mut self.ctx_dirty, line + 1);
        lower(&mut self.token_dirty, line);
    }

    /// `(ctx_dirty, token_dirty)`.
    pub fn syntax_dirty_from(&self) -> (Option<usize>, Option<usize>) {
        (self.ctx_dirty, self.token_dirty)
    }

    pub fn is_syntax_dirty(&self) -> bool {
        self.ctx_dirty.is_some() || self.token_dirty.is_some()
    }

    /// Recompute starting contexts from `ctx_dirty`, stopping before `stop` or after `budget`
    /// recomputations. Lines whose context is cached and whose predecessor did not change are
    /// skipped without lexing.
    pub fn update_syntax_context(&mut self, stop: Option<usize>, budget: Option<usize>) {
        let len = self.lines.len();
        let Some(start) = self.ctx_dirty else { return };
        if start >= len {
            self.ctx_dirty = None;
            return;
        }
        let stop = stop.map_or(len, |s| s.min(len));
        if start >= stop {
            return;
        }
        let budget = budget.unwrap_or(len).max(1);

        let mut line = start;
        let mut lexed = 0usize;
        let mut prev_dirty = self.lines[line].lex_context.is_none();
        loop {
            if self.lines[line].lex_context.is_none() || prev_dirty {
                let ctx = if line == 0 {
                    LexContext::ROOT
                } else {
                    let prev_ctx = self.lines[line - 1].lex_context.unwrap_or(LexContext::ROOT);
                    let text = self.line_text(line - 1);
                    self.lexer.lex(prev_ctx, &text, false).1
                };
                if self.lines[line].lex_context != Some(ctx) {
                    let target = &mut self.lines[line];
                    target.lex_context = Some(ctx);
                    target.tokens = None;
                    lower(&mut self.token_dirty, line);
                    prev_dirty = true;
                } else {
                    prev_dirty = false;
                }
                lexed += 1;
            }
            line += 1;
            if line >= stop || lexed >= budget {
                break;
            }
        }

        if line < len {
            if prev_dirty {
                self.lines[line].lex_context = None;
            }
            self.ctx_dirty = Some(line);
        } else {
            self.ctx_dirty = None;
        }
        trace!(target: "state.syntax", start, end = line, lexed, "context_pass");
    }

    /// Lex stale token lists in `[start, stop)`, at most `budget` lines. Lines whose context is
    /// still stale end the pass.
    pub fn update_syntax_tokens(&mut self, start: Option<usize>, stop: Option<usize>, budget: Option<usize>) {
        let len = self.lines.len();
        let Some(dirty) = self.token_dirty else { return };
        if dirty >= len {
            self.token_dirty = None;
            return;
        }
        let start = start.unwrap_or(0);
        let stop = stop.map_or(len, |s| s.min(len));
        if dirty >= stop || start >= stop {
            return;
        }
        let budget = budget.unwrap_or(len).max(1);

        let mut line = start;
        let mut lexed = 0usize;
        while line < stop {
            if self.lines[line].tokens.is_none() {
                let Some(ctx) = self.lines[line].lex_context else {
                    break;
                };
                let tokens = {
                    let text = self.line_text(line);
                    self.lexer.lex(ctx, &text, true).0
                };
                self.lines[line].tokens =
                    Some(tokens.map_or_else(PackedTokens::plain, |t| PackedTokens::pack(&t)));
                lexed += 1;
                if lexed >= budget {
                    line += 1;
                    break;
                }
            }
            line += 1;
        }

        if start <= dirty {
            self.token_dirty = (line < len).then_some(line);
        }
        trace!(target: "state.syntax", start, end = line, lexed, "token_pass");
    }

    /// One bounded step of background lexing. Plain-text lexers never need it.
    pub fn syntax_tick(&mut self, context_budget: usize, token_budget: usize) {
        if self.lexer.is_plain() {
            return;
        }
        self.update_syntax_context(None, Some(context_budget));
        let start = self.token_dirty;
        self.update_syntax_tokens(start, None, Some(token_budget));
    }

    /// Bring contexts and tokens for `[start, stop)` fully up to date, e.g. for the visible rows.
    pub fn fill_syntax(&mut self, start: usize, stop: usize) {
        self.update_syntax_context(Some(stop), None);
        self.update_syntax_tokens(Some(start), Some(stop), None);
    }

    /// Tokens of `line`, plain when not lexed yet.
    pub fn tokens(&self, line: usize) -> PackedTokens {
        self.lines
            .get(line)
            .and_then(|l| l.tokens.clone())
            .unwrap_or_else(PackedTokens::plain)
    }
}
