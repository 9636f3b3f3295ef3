//! Resident-memory policy for documents backed by large files.

use tracing::{debug, info};

use crate::document::Document;

/// Returns the process's resident memory in bytes, or `None` when it cannot be measured.
pub type MemoryProbe = fn() -> Option<u64>;

/// When to release resident line text: every `check_every` lines of a long scan, `probe` is
/// consulted, and exceeding `threshold_bytes` triggers [`Document::offload_sweep`].
#[derive(Debug, Clone, Copy)]
pub struct MemoryPolicy {
    pub threshold_bytes: u64,
    pub check_every: usize,
    pub probe: MemoryProbe,
}

impl Document {
    pub fn set_memory_policy(&mut self, policy: Option<MemoryPolicy>) {
        self.memory = policy;
    }

    pub fn memory_policy(&self) -> Option<MemoryPolicy> {
        self.memory
    }

    /// Offload every line whose bytes can be read back from the source. Returns the number of
    /// lines released.
    pub fn offload_sweep(&mut self) -> usize {
        if self.source.is_none() || self.source_encoding != self.encoding {
            return 0;
        }
        let before = self.resident_text_bytes();
        let released: usize = self.lines.iter_mut().map(|l| usize::from(l.offload())).sum();
        info!(
            target: "state.memory",
            released,
            freed_bytes = before.saturating_sub(self.resident_text_bytes()),
            "offload_sweep"
        );
        released
    }

    /// Probe memory and sweep when over the threshold. Returns `true` if a sweep ran.
    pub fn check_memory(&mut self) -> bool {
        let Some(policy) = self.memory else {
            return false;
        };
        let Some(used) = (policy.probe)() else {
            return false;
        };
        if used <= policy.threshold_bytes {
            return false;
        }
        debug!(target: "state.memory", used, threshold = policy.threshold_bytes, "memory_over_threshold");
        self.offload_sweep();
        true
    }

    /// Called once per line by long scans.
    pub fn memory_checkpoint(&mut self, line: usize) {
        if let Some(policy) = self.memory
            && policy.check_every > 0
            && line % policy.check_every == 0
        {
            self.check_memory();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocumentParts;
    use core_text::{Line, LineEnding, LineSource, LineTable, Offload};
    use std::io;

    struct Bytes(Vec<u8>);

    impl LineSource for Bytes {
        fn read_raw(&self, span: Offload) -> io::Result<Vec<u8>> {
            let start = span.offset as usize;
            Ok(self.0[start..start + span.len as usize].to_vec())
        }
    }

    fn backed_doc() -> Document {
        let mut a = Line::new("abc", LineEnding::Lf);
        a.set_backing(Offload::new(0, 3));
        let mut b = Line::new("de", LineEnding::None);
        b.set_backing(Offload::new(4, 2));
        let fresh = Line::new("unsaved", LineEnding::None);
        Document::from_parts(DocumentParts {
            lines: vec![a, b, fresh],
            source: Some(Box::new(Bytes(b"abc\nde".to_vec()))),
            ..DocumentParts::default()
        })
    }

    #[test]
    fn sweep_offloads_only_backed_lines_and_reads_stay_correct() {
        let mut doc = backed_doc();
        assert_eq!(doc.offload_sweep(), 2);
        assert!(doc.lines()[0].is_offloaded());
        assert!(!doc.lines()[2].is_offloaded());
        assert_eq!(doc.line_text(0), "abc");
        assert_eq!(doc.line_text(1), "de");
        assert!(doc.lines()[0].is_offloaded());
        assert_eq!(doc.offload_sweep(), 0);
    }

    #[test]
    fn policy_sweeps_only_over_threshold() {
        let mut doc = backed_doc();
        doc.set_memory_policy(Some(MemoryPolicy {
            threshold_bytes: u64::MAX,
            check_every: 1,
            probe: || Some(10),
        }));
        assert!(!doc.check_memory());
        doc.set_memory_policy(Some(MemoryPolicy {
            threshold_bytes: 1,
            check_every: 1,
            probe: || Some(10),
        }));
        assert!(doc.check_memory());
        assert!(doc.lines()[1].is_offloaded());
    }
}
