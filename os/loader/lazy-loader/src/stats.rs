//! # Loader statistics
//!
//! Counters shared between the launcher and the fault handler. All updates
//! are single relaxed atomic operations: lock-free, allocation-free and
//! therefore usable in trap context.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Process-lifetime counters; monotonically increasing, never reset.
#[derive(Debug, Default)]
pub struct LoaderStatistics {
    faults: AtomicU32,
    allocations: AtomicU32,
    fragmentation_bytes: AtomicU64,
}

impl LoaderStatistics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            faults: AtomicU32::new(0),
            allocations: AtomicU32::new(0),
            fragmentation_bytes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_allocation(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_fragmentation(&self, bytes: u64) {
        self.fragmentation_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            faults: self.faults.load(Ordering::Relaxed),
            allocations: self.allocations.load(Ordering::Relaxed),
            fragmentation_bytes: self.fragmentation_bytes.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`LoaderStatistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    pub faults: u32,
    pub allocations: u32,
    pub fragmentation_bytes: u64,
}

impl StatisticsSnapshot {
    /// Internal fragmentation in KiB (`bytes / 1024`, fractional).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fragmentation_kib(&self) -> f64 {
        self.fragmentation_bytes as f64 / 1024.0
    }
}

/// One "tail already charged" flag per program-header entry.
///
/// Guarantees a segment's internal fragmentation is counted at most once,
/// even if its last page were faulted in more than once.
#[derive(Debug)]
pub struct TailLedger {
    charged: Box<[AtomicBool]>,
}

impl TailLedger {
    #[must_use]
    pub fn new(segments: usize) -> Self {
        Self {
            charged: (0..segments).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Mark segment `index` as charged; `true` only for the first call.
    ///
    /// Out-of-range indices are never charged.
    #[inline]
    pub fn charge_once(&self, index: usize) -> bool {
        self.charged
            .get(index)
            .is_some_and(|flag| !flag.swap(true, Ordering::Relaxed))
    }

    #[must_use]
    pub fn is_charged(&self, index: usize) -> bool {
        self.charged
            .get(index)
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
