//! linekit entrypoint.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use core_text::{LineEnding, TextEncoding};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Once;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

mod commands;
mod options;

const LOG_FILE: &str = "linekit.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "linekit", version, about = "Inspect, search, and re-save text files")]
struct Args {
    /// Configuration file path (overrides discovery of `linekit.toml`).
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,
    /// Skip detection and read files in this charset (`utf-8`, `shift-jis`, `utf-16le-bom`, ...).
    #[arg(long = "encoding", global = true, value_parser = parse_encoding)]
    encoding: Option<TextEncoding>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show detected encoding, line ending, line count, and lexer.
    Info { path: PathBuf },
    /// Print every match as `line:column: text`.
    Search {
        path: PathBuf,
        pattern: String,
        /// Match whole words only.
        #[arg(short = 'w', long)]
        word: bool,
        #[arg(short = 'i', long)]
        ignore_case: bool,
        /// Treat the pattern as a regular expression.
        #[arg(short = 'e', long)]
        regex: bool,
    },
    /// Print token runs for a range of lines.
    Tokens {
        path: PathBuf,
        /// First line (1-based).
        #[arg(long, default_value_t = 1)]
        line: usize,
        #[arg(long, default_value_t = 20)]
        count: usize,
        /// Lex the whole file in background-sized steps before printing.
        #[arg(long)]
        full: bool,
    },
    /// Load and save a file, optionally converting it.
    Resave {
        path: PathBuf,
        /// Write here instead of rewriting the file in place.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Re-encode to this charset.
        #[arg(long = "to", value_parser = parse_encoding)]
        to: Option<TextEncoding>,
        #[arg(long, value_parser = parse_line_ending)]
        line_ending: Option<LineEnding>,
    },
    /// Print one line (1-based) of a file of any size without loading it.
    Peek { path: PathBuf, line: usize },
}

fn parse_encoding(s: &str) -> Result<TextEncoding, String> {
    options::parse_encoding(s).ok_or_else(|| format!("unknown encoding `{s}`"))
}

fn parse_line_ending(s: &str) -> Result<LineEnding, String> {
    LineEnding::parse(s).ok_or_else(|| format!("unknown line ending `{s}` (lf, cr, crlf)"))
}

/// File logging is opt-in: without `RUST_LOG` nothing is written. The log goes to
/// `<cache dir>/linekit/linekit.log` and is replaced on every run.
fn configure_logging() -> Option<WorkerGuard> {
    std::env::var_os("RUST_LOG")?;
    let log_dir = dirs::cache_dir()
        .map(|dir| dir.join("linekit"))
        .unwrap_or_else(|| PathBuf::from("."));
    if std::fs::create_dir_all(&log_dir).is_err() {
        return None;
    }
    let log_path = log_dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(_) => Some(guard),
        // Global subscriber already installed; dropping the guard shuts the writer down.
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn run(args: Args) -> Result<()> {
    let config = core_config::load_from(args.config.clone()).context("load configuration")?;
    info!(
        target: "runtime.startup",
        config = config.path.as_ref().map(|p| p.display().to_string()).as_deref(),
        command = ?args.command,
        "startup"
    );
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match &args.command {
        Command::Info { path } => commands::info(&mut out, &config, path, args.encoding)?,
        Command::Search {
            path,
            pattern,
            word,
            ignore_case,
            regex,
        } => {
            let search = commands::SearchArgs {
                pattern,
                word: *word,
                ignore_case: *ignore_case,
                regex: *regex,
            };
            let hits = commands::search(&mut out, &config, path, args.encoding, &search)?;
            if hits == 0 {
                writeln!(out, "no match")?;
            }
        }
        Command::Tokens {
            path,
            line,
            count,
            full,
        } => commands::tokens(&mut out, &config, path, *line, *count, *full)?,
        Command::Resave {
            path,
            output,
            to,
            line_ending,
        } => {
            let resave = commands::ResaveArgs {
                output: output.as_deref(),
                encoding: *to,
                line_ending: *line_ending,
            };
            commands::resave(&mut out, &config, path, &resave)?;
        }
        Command::Peek { path, line } => commands::peek(&mut out, path, *line, args.encoding)?,
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let result = run(args);
    if let Err(e) = &result {
        error!(target: "runtime", error = %format!("{e:#}"), "command_failed");
    }
    info!(target: "runtime", ok = result.is_ok(), "shutdown");
    result
}
