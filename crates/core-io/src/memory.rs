//! Resident-memory probe for [`core_state::MemoryPolicy`].

use std::fs;

use core_state::MemoryPolicy;

fn page_size() -> Option<u64> {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    u64::try_from(size).ok().filter(|&s| s > 0)
}

/// Resident set size of this process in bytes, read from `/proc/self/statm`.
pub fn resident_memory_bytes() -> Option<u64> {
    let statm = fs::read_to_string("/proc/self/statm").ok()?;
    let pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(pages * page_size()?)
}

/// A policy probing this process's resident memory.
pub fn process_memory_policy(threshold_bytes: u64, check_every: usize) -> MemoryPolicy {
    MemoryPolicy {
        threshold_bytes,
        check_every,
        probe: resident_memory_bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn probe_reports_a_nonzero_resident_set() {
        assert!(resident_memory_bytes().is_some_and(|b| b > 0));
    }

    #[test]
    fn policy_uses_the_process_probe() {
        let policy = process_memory_policy(1 << 30, 500);
        assert_eq!(policy.check_every, 500);
        assert_eq!(policy.threshold_bytes, 1 << 30);
    }
}
