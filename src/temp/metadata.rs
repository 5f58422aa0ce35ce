//! # Temporary File Metadata Manager
//!
//! Maps spill-file names onto contiguous block ranges inside the temporary
//! region. Each file owns exactly one range at any time; growth swaps the
//! range for a larger one rather than chaining extents, which keeps the
//! offset→LBA translation a single addition.
//!
//! ## Growth Contract
//!
//! When a write would land past the end of a file's range, the manager
//! allocates a replacement range large enough for the union of the current
//! range and the requested extension (doubling when that is larger), frees
//! the old range and installs the new one. The manager does **not** copy
//! data between ranges: the client owns the spill content in its buffer
//! pool and rewrites it after a grow. This is the documented contract of
//! the temporary directory, not an optimization to add later.
//!
//! ## Locking
//!
//! One mutex covers the name map and the block manager together, so a grow
//! decision and the allocation it implies are a single critical section and
//! concurrent `get_lba` calls on the same file observe a consistent
//! `{range, frontier}` pair. The mutex is never held across device I/O.

use hashbrown::HashMap;
use parking_lot::Mutex;
use tracing::debug;

use super::block_manager::{LbaRange, TemporaryBlockManager};
use crate::config::INITIAL_TEMP_FILE_BLOCKS;
use crate::error::{NvmeError, Result};

#[derive(Debug)]
struct TempFile {
    range: LbaRange,
    /// Next write position, as an absolute LBA inside `range`.
    frontier: u64,
}

/// Registry of live temporary files and their block ranges.
pub struct TemporaryFileManager {
    lba_size: u64,
    inner: Mutex<Inner>,
}

struct Inner {
    files: HashMap<String, TempFile>,
    blocks: TemporaryBlockManager,
}

impl TemporaryFileManager {
    /// Creates a manager over the temporary region `[start_lba, end_lba)`.
    pub fn new(start_lba: u64, end_lba: u64, lba_size: u64) -> Self {
        Self {
            lba_size,
            inner: Mutex::new(Inner {
                files: HashMap::new(),
                blocks: TemporaryBlockManager::new(start_lba, end_lba),
            }),
        }
    }

    /// Registers a file and allocates its initial range. Re-creating an
    /// existing name is a reopen and leaves its state alone.
    pub fn create(&self, name: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.files.contains_key(name) {
            return Ok(());
        }

        let range = inner.blocks.allocate(INITIAL_TEMP_FILE_BLOCKS)?;
        debug!(name, start = range.start, blocks = range.nr_blocks(), "temporary file created");
        inner.files.insert(
            name.to_string(),
            TempFile {
                range,
                frontier: range.start,
            },
        );
        Ok(())
    }

    /// Resolves a byte offset to the absolute LBA it maps to, growing the
    /// file when `nr_lbas` blocks starting there would not fit.
    ///
    /// On growth the old range is released and a fresh one installed; the
    /// caller rewrites content from its buffer pool (see module docs).
    pub fn get_lba(&self, name: &str, byte_offset: u64, nr_lbas: u64) -> Result<u64> {
        let mut inner = self.inner.lock();
        let file = inner
            .files
            .get(name)
            .ok_or_else(|| NvmeError::NotFound(name.to_string()))?;

        let offset_blocks = byte_offset / self.lba_size;
        let range = file.range;

        if range.start + offset_blocks + nr_lbas <= range.end {
            return Ok(range.start + offset_blocks);
        }

        let required = offset_blocks + nr_lbas;
        let target = required.max(range.nr_blocks() * 2);
        let new_range = match inner.blocks.allocate(target) {
            Ok(r) => r,
            // Doubling overshot what is left; an exact fit may still work.
            Err(NvmeError::NoSpace { .. }) if required < target => {
                inner.blocks.allocate(required)?
            }
            Err(e) => return Err(e),
        };

        inner.blocks.free(range);
        let file = inner.files.get_mut(name).expect("entry present above");
        file.frontier = new_range.start + (file.frontier - range.start);
        file.range = new_range;
        debug!(
            name,
            from = range.nr_blocks(),
            to = new_range.nr_blocks(),
            "temporary file grown"
        );

        Ok(new_range.start + offset_blocks)
    }

    /// Advances the file's write frontier; positions behind the current
    /// frontier are ignored, so completion order does not matter.
    pub fn move_frontier(&self, name: &str, new_lba: u64) -> Result<()> {
        let mut inner = self.inner.lock();
        let file = inner
            .files
            .get_mut(name)
            .ok_or_else(|| NvmeError::NotFound(name.to_string()))?;

        if new_lba > file.frontier {
            file.frontier = new_lba;
        }
        Ok(())
    }

    /// Shrinks the file to `new_size` bytes, returning tail blocks to the
    /// free list. Truncating to zero removes the file entirely.
    pub fn truncate(&self, name: &str, new_size: u64) -> Result<()> {
        if new_size == 0 {
            let mut inner = self.inner.lock();
            let file = inner
                .files
                .remove(name)
                .ok_or_else(|| NvmeError::NotFound(name.to_string()))?;
            inner.blocks.free(file.range);
            return Ok(());
        }

        let mut inner = self.inner.lock();
        let file = inner
            .files
            .get(name)
            .ok_or_else(|| NvmeError::NotFound(name.to_string()))?;

        let keep_blocks = new_size.div_ceil(self.lba_size);
        let range = file.range;
        if keep_blocks >= range.nr_blocks() {
            return Ok(());
        }

        let tail = LbaRange::new(range.start + keep_blocks, range.end);
        let file = inner.files.get_mut(name).expect("entry present above");
        file.range = LbaRange::new(range.start, range.start + keep_blocks);
        file.frontier = file.frontier.min(file.range.end);
        inner.blocks.free(tail);
        Ok(())
    }

    /// Removes the file and frees its range. Deleting an absent name is a
    /// no-op.
    pub fn delete(&self, name: &str) {
        let mut inner = self.inner.lock();
        if let Some(file) = inner.files.remove(name) {
            inner.blocks.free(file.range);
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.inner.lock().files.contains_key(name)
    }

    /// Allocated size of the file in whole blocks.
    pub fn size_lbas(&self, name: &str) -> Result<u64> {
        let inner = self.inner.lock();
        inner
            .files
            .get(name)
            .map(|f| f.range.nr_blocks())
            .ok_or_else(|| NvmeError::NotFound(name.to_string()))
    }

    /// Upper bound for seeks within the file, in bytes.
    pub fn seek_bound(&self, name: &str) -> Result<u64> {
        self.size_lbas(name).map(|blocks| blocks * self.lba_size)
    }

    /// Names of all live files, in unspecified order.
    pub fn list(&self) -> Vec<String> {
        self.inner.lock().files.keys().cloned().collect()
    }

    /// Drops every file and restores the free list to the whole region.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.files.clear();
        inner.blocks.reset();
    }

    /// Free blocks remaining in the temporary region.
    pub fn available_blocks(&self) -> u64 {
        self.inner.lock().blocks.available()
    }

    #[cfg(test)]
    fn frontier(&self, name: &str) -> Option<u64> {
        self.inner.lock().files.get(name).map(|f| f.frontier)
    }
}
