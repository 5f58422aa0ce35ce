//! # Temporary Block Manager
//!
//! Free-space accounting for the temporary region. Spill files come and go
//! quickly, so rather than persisting anything the manager keeps an ordered
//! in-memory list of free LBA extents and hands out contiguous runs
//! first-fit.
//!
//! ## Design Overview
//!
//! The free list starts as a single extent covering the whole temporary
//! region. `allocate` walks the list in address order and trims the
//! requested block count off the low end of the first extent large enough;
//! `free` re-inserts an extent in sorted position and merges it with
//! touching neighbours. Two invariants hold after every operation:
//!
//! 1. The list is sorted by start and entries never overlap.
//! 2. No two adjacent entries touch (`a.end < b.start`): freed space is
//!    always coalesced, so fragmentation only reflects live allocations.
//!
//! Together with the file table above, the union of free extents and live
//! file ranges is exactly the temporary region at all times.
//!
//! First-fit over a plain vector is O(n), which is the right trade here:
//! spill files number in the dozens and allocations happen at file creation
//! and growth only, never per-I/O.
//!
//! ## Thread Safety
//!
//! The manager is not synchronized on its own. The temporary file manager
//! holds a mutex across every call, which also serializes the map mutations
//! that accompany allocation.

use crate::error::{NvmeError, Result};

/// A half-open extent of logical blocks `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LbaRange {
    pub start: u64,
    pub end: u64,
}

impl LbaRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "range start must not exceed end");
        Self { start, end }
    }

    /// Number of blocks the extent spans.
    pub fn nr_blocks(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `lba` falls inside the extent.
    pub fn contains(&self, lba: u64) -> bool {
        self.start <= lba && lba < self.end
    }
}

/// First-fit allocator over the temporary region.
#[derive(Debug)]
pub struct TemporaryBlockManager {
    region: LbaRange,
    free: Vec<LbaRange>,
}

impl TemporaryBlockManager {
    /// Creates a manager whose free list covers `[start, end)` entirely.
    pub fn new(start: u64, end: u64) -> Self {
        let region = LbaRange::new(start, end);
        Self {
            region,
            free: vec![region],
        }
    }

    /// The region this manager allocates from.
    pub fn region(&self) -> LbaRange {
        self.region
    }

    /// Allocates a contiguous run of exactly `nr_blocks` blocks.
    ///
    /// First fit in address order; the chosen extent is trimmed from its low
    /// end so allocations pack towards the region start. Fails with
    /// [`NvmeError::NoSpace`] leaving the free list untouched.
    pub fn allocate(&mut self, nr_blocks: u64) -> Result<LbaRange> {
        debug_assert!(nr_blocks > 0, "zero-block allocation");

        for i in 0..self.free.len() {
            let extent = self.free[i];
            if extent.nr_blocks() < nr_blocks {
                continue;
            }

            let allocated = LbaRange::new(extent.start, extent.start + nr_blocks);
            if extent.nr_blocks() == nr_blocks {
                self.free.remove(i);
            } else {
                self.free[i].start = allocated.end;
            }
            return Ok(allocated);
        }

        Err(NvmeError::NoSpace {
            requested: nr_blocks,
            available: self.available(),
        })
    }

    /// Returns an extent to the free list, merging with touching neighbours.
    pub fn free(&mut self, range: LbaRange) {
        if range.is_empty() {
            return;
        }

        debug_assert!(
            self.region.start <= range.start && range.end <= self.region.end,
            "freed range outside temporary region"
        );

        let pos = self.free.partition_point(|e| e.start < range.start);

        debug_assert!(
            pos == 0 || self.free[pos - 1].end <= range.start,
            "double free overlaps left neighbour"
        );
        debug_assert!(
            pos == self.free.len() || range.end <= self.free[pos].start,
            "double free overlaps right neighbour"
        );

        let touches_left = pos > 0 && self.free[pos - 1].end == range.start;
        let touches_right = pos < self.free.len() && self.free[pos].start == range.end;

        match (touches_left, touches_right) {
            (true, true) => {
                self.free[pos - 1].end = self.free[pos].end;
                self.free.remove(pos);
            }
            (true, false) => self.free[pos - 1].end = range.end,
            (false, true) => self.free[pos].start = range.start,
            (false, false) => self.free.insert(pos, range),
        }
    }

    /// Total free blocks across the list.
    pub fn available(&self) -> u64 {
        self.free.iter().map(LbaRange::nr_blocks).sum()
    }

    /// Returns the list to the single initial extent.
    pub fn reset(&mut self) {
        self.free.clear();
        self.free.push(self.region);
    }

    #[cfg(test)]
    fn free_extents(&self) -> &[LbaRange] {
        &self.free
    }
}
