//! Read and write counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters kept for the lifetime of a cache instance.
#[derive(Debug, Default)]
pub struct CacheStats {
    reads: AtomicU64,
    writes: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub reads: u64,
    pub writes: u64,
}

impl CacheStats {
    #[inline]
    pub fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = CacheStats::default();
        stats.record_read();
        stats.record_write();
        stats.record_write();

        assert_eq!(stats.snapshot(), StatsSnapshot { reads: 1, writes: 2 });
    }
}
