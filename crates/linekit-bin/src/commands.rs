//! Subcommand bodies. Each writes its report to `out` and returns an error for the caller to
//! print.

use std::cell::RefCell;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use core_actions::{CommandContext, EditorView, LocalClipboard, Notice, dispatch};
use core_config::Config;
use core_io::{HugeTextFile, LineFetch, is_file_modified, load, resident_memory_bytes, save};
use core_state::{Document, SearchQuery};
use core_syntax::{Lexer, RuleLexer};
use core_text::{LineEnding, LineTable, TextEncoding};
use tracing::{debug, info};

use crate::options;

const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else", "enum",
    "extern", "float", "for", "goto", "if", "inline", "int", "long", "register", "return", "short",
    "signed", "sizeof", "static", "struct", "switch", "typedef", "union", "unsigned", "void",
    "volatile", "while",
];

/// Chunks scanned per `fetch` attempt while peeking.
const PEEK_SCAN_BUDGET: usize = 16;

fn open(path: &Path, config: &Config, encoding: Option<TextEncoding>, lexer: Option<Box<dyn Lexer>>) -> Result<Document> {
    let opts = options::load_options(config, encoding);
    let loaded = load(path, &opts).with_context(|| format!("open {}", path.display()))?;
    let mut doc = loaded.into_document(lexer);
    doc.set_memory_policy(Some(options::memory_policy(config)));
    doc.set_undo_capacity(config.undo_capacity());
    Ok(doc)
}

pub fn info(out: &mut impl Write, config: &Config, path: &Path, encoding: Option<TextEncoding>) -> Result<()> {
    let doc = open(path, config, encoding, None)?;
    let bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    writeln!(out, "path:        {}", path.display())?;
    writeln!(out, "encoding:    {}", doc.encoding().label())?;
    writeln!(out, "line ending: {}", doc.line_ending().label())?;
    writeln!(out, "lines:       {}", doc.line_count())?;
    writeln!(out, "bytes:       {bytes}")?;
    writeln!(out, "readonly:    {}", doc.readonly())?;
    writeln!(out, "lexer:       {}", doc.lexer().name())?;
    if let Some(rss) = resident_memory_bytes() {
        writeln!(out, "resident:    {rss}")?;
    }
    Ok(())
}

pub struct SearchArgs<'a> {
    pub pattern: &'a str,
    pub word: bool,
    pub ignore_case: bool,
    pub regex: bool,
}

/// Walk every match with the view's `SearchNext` command and print `line:column: text`.
pub fn search(
    out: &mut impl Write,
    config: &Config,
    path: &Path,
    encoding: Option<TextEncoding>,
    args: &SearchArgs<'_>,
) -> Result<usize> {
    let doc = open(path, config, encoding, None)?;
    let query = SearchQuery::new(args.pattern, args.word, !args.ignore_case, args.regex)?;
    let mut view = EditorView::new(Rc::new(RefCell::new(doc)));
    view.apply_config(config);
    view.set_search_query(Some(query));
    let mut clipboard = LocalClipboard::new();
    let mut ctx = CommandContext::new(&mut clipboard);

    let mut hits = 0usize;
    loop {
        dispatch("SearchNext", &mut view, &mut ctx)?;
        if view.take_notices().iter().any(|n| matches!(n, Notice::NotFound(_))) {
            break;
        }
        let selection = view.selection();
        let line = selection.left.line;
        let text = view.document().line_text(line).into_owned();
        writeln!(out, "{}:{}: {}", line + 1, selection.left.index + 1, text)?;
        hits += 1;
        if selection.is_empty() && !dispatch("CursorRight", &mut view, &mut ctx)?.dirty {
            break;
        }
    }
    info!(target: "runtime", pattern = args.pattern, hits, "search_done");
    Ok(hits)
}

/// Print the token runs of `count` lines starting at `first` (1-based), lexed with the built-in
/// C-like rules. With `full`, the whole file is lexed first in budgeted background ticks.
pub fn tokens(
    out: &mut impl Write,
    config: &Config,
    path: &Path,
    first: usize,
    count: usize,
    full: bool,
) -> Result<()> {
    let lexer = RuleLexer::c_like(C_KEYWORDS)?;
    let mut doc = open(path, config, None, Some(Box::new(lexer)))?;
    let start = first.saturating_sub(1).min(doc.line_count());
    let stop = start.saturating_add(count).min(doc.line_count());
    if full {
        let budgets = &config.file.syntax;
        let mut ticks = 0usize;
        while doc.is_syntax_dirty() && !doc.lexer().is_plain() {
            doc.syntax_tick(budgets.context_budget.max(1), budgets.token_budget.max(1));
            ticks += 1;
        }
        debug!(target: "runtime", ticks, lines = doc.line_count(), "background_lex_done");
    }
    doc.fill_syntax(start, stop);
    debug!(target: "runtime", start, stop, lexer = doc.lexer().name(), "tokens_filled");
    for line in start..stop {
        let runs: Vec<String> = doc
            .tokens(line)
            .tokens()
            .map(|t| format!("{:?}@{}", t.class, t.start))
            .collect();
        writeln!(out, "{}: {}", line + 1, runs.join(" "))?;
    }
    Ok(())
}

pub struct ResaveArgs<'a> {
    pub output: Option<&'a Path>,
    pub encoding: Option<TextEncoding>,
    pub line_ending: Option<LineEnding>,
}

/// Load and save again, optionally re-encoding or converting line endings.
pub fn resave(out: &mut impl Write, config: &Config, path: &Path, args: &ResaveArgs<'_>) -> Result<()> {
    let mut doc = open(path, config, None, None)?;
    if doc.readonly() && args.output.is_none() {
        bail!("{} is read-only", path.display());
    }
    if args.output.is_none() && is_file_modified(&doc)? {
        bail!("{} changed on disk while it was open", path.display());
    }
    if let Some(encoding) = args.encoding {
        doc.set_encoding(encoding, None);
    }
    if let Some(ending) = args.line_ending {
        doc.set_line_ending(ending, None);
    }
    let report = save(&mut doc, args.output, &options::save_options(config))?;
    writeln!(
        out,
        "wrote {} ({} lines, {} bytes, {}, {})",
        report.path.display(),
        report.lines,
        report.bytes,
        doc.encoding().label(),
        if report.in_place { "in place" } else { "new file" }
    )?;
    Ok(())
}

/// Print one line of a file through the lazy line index, without loading the whole file.
pub fn peek(out: &mut impl Write, path: &Path, line: usize, encoding: Option<TextEncoding>) -> Result<()> {
    let encoding = encoding.unwrap_or_else(TextEncoding::utf8);
    let mut file = HugeTextFile::open(path, encoding).with_context(|| format!("open {}", path.display()))?;
    let index = line.saturating_sub(1);
    let mut attempts = 0usize;
    loop {
        attempts += 1;
        match file.fetch(index, PEEK_SCAN_BUDGET)? {
            LineFetch::Ready(bytes) => {
                let text = encoding.decode(&bytes);
                let text = text.trim_end_matches(['\r', '\n']);
                debug!(target: "runtime", line, attempts, indexed = file.known_lines(), "peek_ready");
                writeln!(out, "{text}")?;
                return Ok(());
            }
            LineFetch::Pending => continue,
            LineFetch::OutOfRange => bail!("{} has only {} lines", path.display(), file.known_lines()),
        }
    }
}
