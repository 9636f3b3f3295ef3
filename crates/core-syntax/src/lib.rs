//! Line-oriented tokenizer contract.
//!
//! A [`Lexer`] is driven one line at a time. Each call receives the context left behind by the
//! previous line (or [`LexContext::ROOT`] for the first line) and returns the context to hand to
//! the next one. Callers that only need to propagate contexts pass `want_tokens = false`, which
//! lets rule-based lexers skip purely cosmetic rules.
//!
//! Token lists are stored per line in their packed form ([`PackedTokens`]): pairs of
//! `(start_offset, class)` meaning "this class from `start_offset` until the next pair or the end
//! of the line". Offsets are character indices.

pub mod rules;
mod token;

pub use rules::{LexerBuildError, RuleAction, RuleLexer, RuleSpec};
pub use token::{PackedTokens, Token, TokenClass, TokenList};

use smallvec::smallvec;

/// Opaque per-line lexer state. Values only carry meaning for the lexer that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LexContext(pub u16);

impl LexContext {
    /// Context handed to line 0.
    pub const ROOT: LexContext = LexContext(0);
}

/// Tokenizer contract consumed by the document's syntax passes.
pub trait Lexer {
    /// Lex `line` starting in `context`.
    ///
    /// Returns the token list when `want_tokens` is set (lexers may return `None` otherwise)
    /// and the context the following line starts in.
    fn lex(&self, context: LexContext, line: &str, want_tokens: bool)
    -> (Option<TokenList>, LexContext);

    /// Short identifier used in logs and status output.
    fn name(&self) -> &str;

    /// `true` for lexers whose output never depends on context or content. Schedulers skip
    /// syntax passes entirely for these.
    fn is_plain(&self) -> bool {
        false
    }
}

/// Constant-context lexer producing a single `Text` token per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextLexer;

impl Lexer for PlainTextLexer {
    fn lex(
        &self,
        context: LexContext,
        _line: &str,
        want_tokens: bool,
    ) -> (Option<TokenList>, LexContext) {
        let tokens = want_tokens.then(|| smallvec![Token::new(0, TokenClass::Text)]);
        (tokens, context)
    }

    fn name(&self) -> &str {
        "text"
    }

    fn is_plain(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lexer_keeps_context_and_emits_one_token() {
        let (tokens, ctx) = PlainTextLexer.lex(LexContext(7), "fn main() {}", true);
        assert_eq!(ctx, LexContext(7));
        let tokens = tokens.unwrap();
        assert_eq!(tokens.as_slice(), &[Token::new(0, TokenClass::Text)]);
        assert!(PackedTokens::pack(&tokens).is_plain());
    }

    #[test]
    fn plain_lexer_skips_tokens_when_not_requested() {
        let (tokens, ctx) = PlainTextLexer.lex(LexContext::ROOT, "abc", false);
        assert!(tokens.is_none());
        assert_eq!(ctx, LexContext::ROOT);
    }
}
