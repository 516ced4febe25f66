//! Scan statistics with atomic counters.
//!
//! This module provides [`ScanStats`] for tracking scan progress from the
//! worker threads and [`StatsSnapshot`] for point-in-time views.
//!
//! # Thread Safety
//!
//! All counters use [`AtomicU64`] with [`Relaxed`](std::sync::atomic::Ordering::Relaxed)
//! ordering. The final snapshot is taken after the pool has drained, so it is
//! exact; intermediate snapshots are informational only.
//!
//! # Examples
//!
//! ```
//! use ot_scanner::ScanStats;
//!
//! let stats = ScanStats::new();
//! stats.add_discovered(2);
//! stats.increment_scanned();
//! stats.add_tasks(3);
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.pending(), 1);
//! assert_eq!(snapshot.tasks, 3);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters for one scan.
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Files selected by the file set.
    discovered: AtomicU64,
    /// Files read to the end.
    scanned: AtomicU64,
    /// Files recorded as skipped.
    skipped: AtomicU64,
    /// Task records produced.
    tasks: AtomicU64,
}

impl ScanStats {
    /// Creates a new [`ScanStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds to the discovered files counter.
    #[inline]
    pub fn add_discovered(&self, count: u64) {
        self.discovered.fetch_add(count, Ordering::Relaxed);
    }

    /// Increments the scanned files counter.
    #[inline]
    pub fn increment_scanned(&self) {
        self.scanned.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the skipped files counter.
    #[inline]
    pub fn increment_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds to the task counter.
    #[inline]
    pub fn add_tasks(&self, count: u64) {
        self.tasks.fetch_add(count, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            discovered: self.discovered.load(Ordering::Relaxed),
            scanned: self.scanned.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            tasks: self.tasks.load(Ordering::Relaxed),
        }
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.discovered.store(0, Ordering::Relaxed);
        self.scanned.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
        self.tasks.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time copy of [`ScanStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Files selected by the file set.
    pub discovered: u64,
    /// Files read to the end.
    pub scanned: u64,
    /// Files recorded as skipped.
    pub skipped: u64,
    /// Task records produced (before per-line deduplication).
    pub tasks: u64,
}

impl StatsSnapshot {
    /// Files neither scanned nor skipped yet.
    #[inline]
    #[must_use]
    pub const fn pending(&self) -> u64 {
        self.discovered
            .saturating_sub(self.scanned)
            .saturating_sub(self.skipped)
    }

    /// Share of discovered files already handled, in percent.
    ///
    /// Returns 100.0 when nothing was discovered.
    ///
    /// # Examples
    ///
    /// ```
    /// use ot_scanner::StatsSnapshot;
    ///
    /// let snap = StatsSnapshot { discovered: 4, scanned: 2, skipped: 1, tasks: 0 };
    /// assert!((snap.progress_percent() - 75.0).abs() < 0.1);
    /// ```
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Acceptable for statistics display
    pub fn progress_percent(&self) -> f64 {
        if self.discovered == 0 {
            return 100.0;
        }
        ((self.scanned + self.skipped) as f64 / self.discovered as f64) * 100.0
    }
}
