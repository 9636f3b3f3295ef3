//! Rule-table lexer.
//!
//! Each context owns an ordered rule list. At every position the rule whose match starts earliest
//! wins, ties going to the rule listed first. A rule without a pattern is the context's fallback:
//! text not claimed by any pattern gets its class, and rules listed after it are never consulted.
//! When neither a match at the current position nor a fallback exists, the rest of the line is
//! reported as [`TokenClass::Error`].
//!
//! Rules flagged as detail only refine coloring. They are skipped when the caller only needs the
//! outgoing context, so they must never hide text that could change context (string and comment
//! rules are therefore never detail rules).

use regex::{Captures, Regex};
use thiserror::Error;
use tracing::debug;

use crate::{LexContext, Lexer, Token, TokenClass, TokenList};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAction {
    /// Whole match gets one class.
    Class(TokenClass),
    /// Capture group `i + 1` gets class `i`.
    Groups(Vec<TokenClass>),
}

/// Declarative description of a rule, resolved by [`RuleLexer::new`].
#[derive(Debug, Clone)]
pub struct RuleSpec<'a> {
    pattern: Option<&'a str>,
    action: RuleAction,
    next: Option<&'a str>,
    detail: bool,
}

impl<'a> RuleSpec<'a> {
    pub fn new(pattern: &'a str, class: TokenClass) -> Self {
        Self {
            pattern: Some(pattern),
            action: RuleAction::Class(class),
            next: None,
            detail: false,
        }
    }

    pub fn groups(pattern: &'a str, classes: &[TokenClass]) -> Self {
        Self {
            pattern: Some(pattern),
            action: RuleAction::Groups(classes.to_vec()),
            next: None,
            detail: false,
        }
    }

    pub fn fallback(class: TokenClass) -> Self {
        Self {
            pattern: None,
            action: RuleAction::Class(class),
            next: None,
            detail: false,
        }
    }

    /// Switch to `context` after this rule matches.
    pub fn then(mut self, context: &'a str) -> Self {
        self.next = Some(context);
        self
    }

    pub fn detail(mut self) -> Self {
        self.detail = true;
        self
    }
}

#[derive(Debug, Error)]
pub enum LexerBuildError {
    #[error("invalid pattern in context `{context}`: {source}")]
    Pattern {
        context: String,
        #[source]
        source: regex::Error,
    },
    #[error("rule in context `{context}` switches to unknown context `{target}`")]
    UnknownContext { context: String, target: String },
    #[error("lexer `{0}` defines no contexts")]
    Empty(String),
    #[error("lexer `{0}` defines more contexts than fit in a context id")]
    TooManyContexts(String),
}

struct Rule {
    pattern: Option<Regex>,
    action: RuleAction,
    next: Option<LexContext>,
    detail: bool,
}

impl Rule {
    fn fallback_class(&self) -> TokenClass {
        match &self.action {
            RuleAction::Class(class) => *class,
            RuleAction::Groups(classes) => classes.first().copied().unwrap_or(TokenClass::Text),
        }
    }
}

struct ContextRules {
    name: String,
    rules: Vec<Rule>,
}

/// Regex rule-table lexer with named contexts. The first context is the root.
pub struct RuleLexer {
    name: String,
    contexts: Vec<ContextRules>,
}

impl RuleLexer {
    pub fn new(
        name: impl Into<String>,
        contexts: &[(&str, Vec<RuleSpec<'_>>)],
    ) -> Result<Self, LexerBuildError> {
        let name = name.into();
        if contexts.is_empty() {
            return Err(LexerBuildError::Empty(name));
        }
        if contexts.len() > usize::from(u16::MAX) {
            return Err(LexerBuildError::TooManyContexts(name));
        }
        let resolve = |from: &str, target: &str| {
            contexts
                .iter()
                .position(|(n, _)| *n == target)
                .and_then(|i| u16::try_from(i).ok())
                .map(LexContext)
                .ok_or_else(|| LexerBuildError::UnknownContext {
                    context: from.to_string(),
                    target: target.to_string(),
                })
        };
        let mut built = Vec::with_capacity(contexts.len());
        for (ctx_name, specs) in contexts {
            let mut rules = Vec::with_capacity(specs.len());
            for spec in specs {
                let pattern = spec
                    .pattern
                    .map(Regex::new)
                    .transpose()
                    .map_err(|source| LexerBuildError::Pattern {
                        context: ctx_name.to_string(),
                        source,
                    })?;
                let next = spec.next.map(|t| resolve(ctx_name, t)).transpose()?;
                rules.push(Rule {
                    pattern,
                    action: spec.action.clone(),
                    next,
                    detail: spec.detail,
                });
            }
            built.push(ContextRules {
                name: ctx_name.to_string(),
                rules,
            });
        }
        debug!(target: "syntax", lexer = %name, contexts = built.len(), "rule_lexer_built");
        Ok(Self {
            name,
            contexts: built,
        })
    }

    /// C-family rule set: block comments spanning lines, line comments, strings, preprocessor
    /// lines, and the supplied keywords.
    pub fn c_like(keywords: &[&str]) -> Result<Self, LexerBuildError> {
        let keyword_pattern = if keywords.is_empty() {
            // never matches
            r"[^\s\S]".to_string()
        } else {
            let alternatives: Vec<String> = keywords.iter().map(|k| regex::escape(k)).collect();
            format!(r"\b(?:{})\b", alternatives.join("|"))
        };
        Self::new(
            "c",
            &[
                (
                    "root",
                    vec![
                        RuleSpec::new(r"/\*", TokenClass::Comment).then("comment"),
                        RuleSpec::new(r"//.*", TokenClass::Comment),
                        RuleSpec::new(r#""(?:[^"\\]|\\.)*"?"#, TokenClass::String),
                        RuleSpec::new(r"'(?:[^'\\]|\\.)*'?", TokenClass::String),
                        RuleSpec::new(r"^[ \t]*#.*", TokenClass::Preproc),
                        RuleSpec::new(&keyword_pattern, TokenClass::Keyword).detail(),
                        RuleSpec::new(
                            r"\b(?:0[xX][0-9A-Fa-f]+|[0-9]+(?:\.[0-9]+)?)\b",
                            TokenClass::Number,
                        )
                        .detail(),
                        RuleSpec::new(r"[A-Za-z_][A-Za-z0-9_]*", TokenClass::Name).detail(),
                        RuleSpec::new(r"[ \t]+", TokenClass::Space).detail(),
                        RuleSpec::fallback(TokenClass::Text),
                    ],
                ),
                (
                    "comment",
                    vec![
                        RuleSpec::new(r"\*/", TokenClass::Comment).then("root"),
                        RuleSpec::fallback(TokenClass::Comment),
                    ],
                ),
            ],
        )
    }

    pub fn context_id(&self, name: &str) -> Option<LexContext> {
        self.contexts
            .iter()
            .position(|c| c.name == name)
            .and_then(|i| u16::try_from(i).ok())
            .map(LexContext)
    }

    pub fn context_name(&self, context: LexContext) -> Option<&str> {
        self.contexts
            .get(usize::from(context.0))
            .map(|c| c.name.as_str())
    }
}

/// Collects tokens, translating byte offsets into character offsets.
struct Emitter<'a> {
    line: &'a str,
    tokens: Option<TokenList>,
    byte_cursor: usize,
    char_cursor: usize,
}

impl<'a> Emitter<'a> {
    fn new(line: &'a str, want_tokens: bool) -> Self {
        Self {
            line,
            tokens: want_tokens.then(TokenList::new),
            byte_cursor: 0,
            char_cursor: 0,
        }
    }

    fn char_offset(&mut self, byte: usize) -> usize {
        if self.line.is_ascii() {
            return byte;
        }
        if byte < self.byte_cursor {
            self.byte_cursor = 0;
            self.char_cursor = 0;
        }
        self.char_cursor += self.line[self.byte_cursor..byte].chars().count();
        self.byte_cursor = byte;
        self.char_cursor
    }

    fn last_class(&self) -> Option<TokenClass> {
        self.tokens.as_ref()?.last().map(|t| t.class)
    }

    fn push(&mut self, byte: usize, class: TokenClass) {
        if self.tokens.is_none() || byte >= self.line.len() {
            return;
        }
        let start = self.char_offset(byte);
        let Some(tokens) = self.tokens.as_mut() else {
            return;
        };
        match tokens.last() {
            Some(last) if last.class == class => return,
            Some(last) if last.start == start => {
                tokens.pop();
                if tokens.last().is_some_and(|t| t.class == class) {
                    return;
                }
            }
            _ => {}
        }
        tokens.push(Token::new(start, class));
    }
}

fn match_start(caps: &Captures<'_>) -> usize {
    caps.get(0).map_or(usize::MAX, |m| m.start())
}

impl Lexer for RuleLexer {
    fn lex(
        &self,
        context: LexContext,
        line: &str,
        want_tokens: bool,
    ) -> (Option<TokenList>, LexContext) {
        let mut ctx = context;
        let mut out = Emitter::new(line, want_tokens);
        let len = line.len();
        let mut pos = 0;
        loop {
            let Some(table) = self.contexts.get(usize::from(ctx.0)) else {
                out.push(pos, TokenClass::Error);
                break;
            };
            let at_end = pos == len;
            let mut nearest: Option<(&Rule, Captures<'_>)> = None;
            let mut fallback: Option<&Rule> = None;
            let mut settled = false;
            for rule in table.rules.iter().filter(|r| want_tokens || !r.detail) {
                let Some(pattern) = &rule.pattern else {
                    fallback = Some(rule);
                    settled = true;
                    break;
                };
                let Some(caps) = pattern.captures_at(line, pos) else {
                    continue;
                };
                let start = match_start(&caps);
                if nearest
                    .as_ref()
                    .is_none_or(|(_, best)| start < match_start(best))
                {
                    nearest = Some((rule, caps));
                    if start == pos {
                        settled = true;
                        break;
                    }
                }
            }
            if !settled {
                out.push(pos, TokenClass::Error);
                break;
            }
            if let Some(rule) = fallback {
                let class = rule.fallback_class();
                if out.last_class() != Some(class) {
                    out.push(pos, class);
                }
            }
            let (start_pos, start_ctx) = (pos, ctx);
            let matched = nearest.is_some();
            if let Some((rule, caps)) = nearest {
                let Some(whole) = caps.get(0) else {
                    break;
                };
                match &rule.action {
                    RuleAction::Class(class) => out.push(whole.start(), *class),
                    RuleAction::Groups(classes) => {
                        for (i, class) in classes.iter().enumerate() {
                            if let Some(group) = caps.get(i + 1) {
                                out.push(group.start(), *class);
                            }
                        }
                    }
                }
                pos = whole.end();
                if let Some(next) = rule.next {
                    ctx = next;
                }
            }
            if fallback.is_some() && !matched {
                break;
            }
            if at_end {
                break;
            }
            if pos == start_pos && ctx == start_ctx {
                // empty match without a context switch
                pos += line[pos..].chars().next().map_or(1, char::len_utf8);
            }
        }
        (out.tokens, ctx)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
