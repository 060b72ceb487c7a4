//! Per-run memo of forward scans
//!
//! Inline rules look ahead for closing delimiters: the `]` of a link, the
//! closer of an emphasis run, the end of a code span. Without a memo every
//! opener repeats the same scan, and input made of many unclosed openers
//! becomes quadratic. A [`ScanCache`] lives for one engine run over one
//! scope text; rules record scan results in it under a table id of their
//! choosing, so a scan that already ran is answered from the cache.
//!
//! Two kinds of entries are kept:
//!
//! - **exact**: the result of the scan that started at one position
//! - **ranged**: the last scan of a table, `(from, result)`. Rules use it
//!   for scans whose answer is "the first X at or after `pos`", where any
//!   later start up to the result gives the same answer. A scan that jumped
//!   over regions (code spans) records them; a start inside one of them saw
//!   different text and is not answered.

use std::sync::{Mutex, MutexGuard, PoisonError};

use ahash::RandomState;
use hashbrown::HashMap;

/// Scan results of one engine run
#[derive(Debug, Default)]
pub struct ScanCache {
    inner: Mutex<Entries>,
}

#[derive(Debug, Default)]
struct Entries {
    exact: HashMap<(u32, usize), Option<usize>, RandomState>,
    ranged: HashMap<u32, Ranged, RandomState>,
}

#[derive(Debug)]
struct Ranged {
    from: usize,
    result: Option<usize>,
    skipped: Vec<(usize, usize)>,
}

impl Ranged {
    fn answers(&self, pos: usize) -> bool {
        if pos < self.from || self.result.is_some_and(|end| pos > end) {
            return false;
        }
        let after = self.skipped.partition_point(|&(start, _)| start < pos);
        after == 0 || self.skipped[after - 1].1 <= pos
    }
}

impl ScanCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Result of the scan of `table` that started at `pos`, if recorded
    #[inline]
    pub fn get(&self, table: u32, pos: usize) -> Option<Option<usize>> {
        self.entries().exact.get(&(table, pos)).copied()
    }

    /// Record the result of the scan of `table` that started at `pos`
    #[inline]
    pub fn insert(&self, table: u32, pos: usize, result: Option<usize>) {
        self.entries().exact.insert((table, pos), result);
    }

    /// Record one result for several start positions
    pub fn insert_all(&self, table: u32, positions: &[usize], result: Option<usize>) {
        let mut entries = self.entries();
        for &pos in positions {
            entries.exact.insert((table, pos), result);
        }
    }

    /// Answer a scan of `table` from `pos` with the last ranged scan
    ///
    /// Hits when `pos` lies between that scan's start and its result, or
    /// anywhere after its start when it found nothing, unless `pos` is
    /// inside a region the scan skipped.
    pub fn covering(&self, table: u32, pos: usize) -> Option<Option<usize>> {
        let entries = self.entries();
        let ranged = entries.ranged.get(&table)?;
        ranged.answers(pos).then_some(ranged.result)
    }

    /// Record a ranged scan of `table`, replacing the previous one
    pub fn record_range(&self, table: u32, from: usize, result: Option<usize>) {
        self.record_range_skipping(table, from, result, Vec::new());
    }

    /// Record a ranged scan that jumped over `skipped`
    ///
    /// `skipped` holds `(start, end)` pairs in ascending order.
    pub fn record_range_skipping(
        &self,
        table: u32,
        from: usize,
        result: Option<usize>,
        skipped: Vec<(usize, usize)>,
    ) {
        self.entries().ranged.insert(
            table,
            Ranged {
                from,
                result,
                skipped,
            },
        );
    }

    /// Number of recorded entries
    pub fn len(&self) -> usize {
        let entries = self.entries();
        entries.exact.len() + entries.ranged.len()
    }

    /// Check if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_entries() {
        let cache = ScanCache::new();
        assert_eq!(cache.get(1, 4), None);
        cache.insert(1, 4, Some(9));
        cache.insert_all(1, &[5, 6], None);
        assert_eq!(cache.get(1, 4), Some(Some(9)));
        assert_eq!(cache.get(1, 6), Some(None));
        assert_eq!(cache.get(2, 4), None);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_ranged_hit_inside_scanned_range() {
        let cache = ScanCache::new();
        cache.record_range(7, 10, Some(20));
        assert_eq!(cache.covering(7, 9), None);
        assert_eq!(cache.covering(7, 10), Some(Some(20)));
        assert_eq!(cache.covering(7, 20), Some(Some(20)));
        assert_eq!(cache.covering(7, 21), None);
        assert_eq!(cache.covering(8, 15), None);
    }

    #[test]
    fn test_skipped_regions_are_not_answered() {
        let cache = ScanCache::new();
        cache.record_range_skipping(5, 0, None, vec![(4, 9), (20, 30)]);
        assert_eq!(cache.covering(5, 4), Some(None));
        assert_eq!(cache.covering(5, 6), None);
        assert_eq!(cache.covering(5, 9), Some(None));
        assert_eq!(cache.covering(5, 25), None);
        assert_eq!(cache.covering(5, 31), Some(None));
    }

    #[test]
    fn test_failed_range_covers_everything_after() {
        let cache = ScanCache::new();
        cache.record_range(3, 50, None);
        assert_eq!(cache.covering(3, 49), None);
        assert_eq!(cache.covering(3, 50), Some(None));
        assert_eq!(cache.covering(3, 10_000), Some(None));
    }
}
