//! Config file sections mapped onto the library option structs.

use core_config::Config;
use core_io::{DetectOptions, LoadOptions, SaveOptions, process_memory_policy};
use core_state::MemoryPolicy;
use core_text::{Charset, LineEnding, TextEncoding};
use tracing::warn;

pub fn load_options(config: &Config, forced: Option<TextEncoding>) -> LoadOptions {
    let load = &config.file.load;
    let ascii_fallback = Charset::from_name(&load.ascii_fallback);
    if ascii_fallback.is_none() {
        warn!(target: "config", value = %load.ascii_fallback, "ascii_fallback_unknown");
    }
    let default_line_ending = LineEnding::parse(&config.file.edit.default_line_ending).unwrap_or_else(|| {
        warn!(target: "config", value = %config.file.edit.default_line_ending, "default_line_ending_unknown");
        LineEnding::Lf
    });
    LoadOptions {
        chunk_size: config.effective_chunk_size(),
        detect: DetectOptions {
            sample_bytes: load.sample_bytes,
            sample_lines: load.sample_lines,
            ascii_fallback,
        },
        encoding: forced,
        default_line_ending,
        plain_text_lines: load.plain_text_lines,
        plain_text_bytes: load.plain_text_bytes,
        ..LoadOptions::default()
    }
}

pub fn save_options(config: &Config) -> SaveOptions {
    SaveOptions {
        spill_threshold: config.file.save.spill_threshold,
        ..SaveOptions::default()
    }
}

pub fn memory_policy(config: &Config) -> MemoryPolicy {
    process_memory_policy(
        config.file.memory.offload_threshold,
        config.file.memory.check_interval_lines,
    )
}

/// Parse a `--encoding` value such as `utf-8`, `utf-8-bom`, or `shift-jis`.
pub fn parse_encoding(name: &str) -> Option<TextEncoding> {
    let lower = name.trim().to_ascii_lowercase();
    let (base, bom) = match lower.strip_suffix("-bom") {
        Some(base) => (base, true),
        None => (lower.as_str(), false),
    };
    let charset = Charset::from_name(base)?;
    Some(TextEncoding::new(charset, bom && charset.bom().is_some()))
}
