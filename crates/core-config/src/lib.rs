//! Engine configuration loaded from `linekit.toml`.
//!
//! Every section and field is optional; absent values take the defaults below. An unreadable
//! or unparsable file falls back to the defaults as a whole (parse failures are logged under the
//! `config` target). Raw values are kept as parsed; `Config::effective_*` accessors apply clamps.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const FILE_NAME: &str = "linekit.toml";
const MAX_TAB_WIDTH: usize = 16;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EditConfig {
    pub tab_width: usize,
    pub tab_by_space: bool,
    /// `lf`, `cr` or `crlf`; used for new documents and files without a first terminator.
    pub default_line_ending: String,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            tab_width: 4,
            tab_by_space: false,
            default_line_ending: "lf".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UndoConfig {
    /// Maximum undo records kept; 0 keeps everything.
    pub capacity: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self { capacity: 1000 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SyntaxConfig {
    /// Context recomputations per scheduler tick.
    pub context_budget: usize,
    /// Token recomputations per scheduler tick.
    pub token_budget: usize,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            context_budget: 1000,
            token_budget: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoadConfig {
    pub chunk_size: usize,
    pub sample_bytes: usize,
    pub sample_lines: usize,
    /// Charset that pure-ASCII files are opened as.
    pub ascii_fallback: String,
    pub plain_text_lines: usize,
    pub plain_text_bytes: u64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1 << 20,
            sample_bytes: 1 << 20,
            sample_lines: 1000,
            ascii_fallback: "utf-8".to_string(),
            plain_text_lines: 100_000,
            plain_text_bytes: 10 << 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SaveConfig {
    /// Output larger than this is staged in a temporary file.
    pub spill_threshold: usize,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            spill_threshold: 10 << 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MemoryConfig {
    pub offload_threshold: u64,
    pub check_interval_lines: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            offload_threshold: 1 << 30,
            check_interval_lines: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ConfigFile {
    pub edit: EditConfig,
    pub undo: UndoConfig,
    pub syntax: SyntaxConfig,
    pub load: LoadConfig,
    pub save: SaveConfig,
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// File contents as read, when a file was found.
    pub raw: Option<String>,
    pub file: ConfigFile,
    pub path: Option<PathBuf>,
}

/// Best-effort config path: working directory first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("linekit").join(FILE_NAME);
    }
    PathBuf::from(FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config {
                raw: Some(content),
                file,
                path: Some(path),
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Tab width clamped to `1..=16`.
    pub fn effective_tab_width(&self) -> usize {
        let raw = self.file.edit.tab_width;
        let clamped = raw.clamp(1, MAX_TAB_WIDTH);
        if clamped != raw {
            info!(target: "config", raw, clamped, "tab_width_clamped");
        }
        clamped
    }

    /// Undo capacity, `None` for unbounded.
    pub fn undo_capacity(&self) -> Option<usize> {
        match self.file.undo.capacity {
            0 => None,
            n => Some(n),
        }
    }

    /// Load chunk size, never below 4 KiB.
    pub fn effective_chunk_size(&self) -> usize {
        self.file.load.chunk_size.max(4096)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn capture<F: FnOnce()>(f: F) -> String {
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();
        with_default(subscriber, f);
        let bytes = buffer.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.file.edit.tab_width, 4);
        assert_eq!(cfg.undo_capacity(), Some(1000));
        assert_eq!(cfg.file.syntax.context_budget, 1000);
        assert_eq!(cfg.file.syntax.token_budget, 100);
        assert_eq!(cfg.file.load.chunk_size, 1 << 20);
        assert_eq!(cfg.file.memory.check_interval_lines, 10_000);
        assert!(cfg.raw.is_none());
    }

    #[test]
    fn parses_partial_sections() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[edit]\ntab_width = 8\ndefault_line_ending = \"crlf\"\n[undo]\ncapacity = 0\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.effective_tab_width(), 8);
        assert_eq!(cfg.file.edit.default_line_ending, "crlf");
        assert!(!cfg.file.edit.tab_by_space);
        assert_eq!(cfg.undo_capacity(), None);
        assert_eq!(cfg.file.save.spill_threshold, 10 << 20);
    }

    #[test]
    fn parse_error_falls_back_to_defaults_and_logs() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[edit\ntab_width = ").unwrap();
        let path = tmp.path().to_path_buf();
        let mut cfg = None;
        let log = capture(|| cfg = Some(load_from(Some(path)).unwrap()));
        let cfg = cfg.unwrap();
        assert_eq!(cfg.file.edit.tab_width, 4);
        assert!(log.contains("WARN config:"));
        assert!(log.contains("config_parse_failed_using_defaults"));
    }

    #[test]
    fn tab_width_clamp_uses_config_target() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[edit]\ntab_width = 0\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let mut width = 0;
        let log = capture(|| width = cfg.effective_tab_width());
        assert_eq!(width, 1);
        assert!(log.contains("INFO config:"));
        assert!(log.contains("tab_width_clamped"));
    }

    #[test]
    fn chunk_size_has_a_floor() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[load]\nchunk_size = 10\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.effective_chunk_size(), 4096);
    }
}
