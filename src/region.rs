//! # Region Router and Frontier Manager
//!
//! The namespace is carved into fixed regions at initialization time:
//!
//! ```text
//! LBA 0                                  wal_start      tmp_start
//! +------------+--------------------------+--------------+----------------+
//! | superblock |        DATABASE          |     WAL      |   TEMPORARY    |
//! +------------+--------------------------+--------------+----------------+
//! 0            1                                                  lba_count
//! ```
//!
//! Regions never move or overlap after initialization. This module owns the
//! mapping from a path to its region, the derivation of the partition
//! boundaries from configured sizes, and the two write frontiers that track
//! how far the database and WAL regions have been filled.
//!
//! ## Frontier Semantics
//!
//! A frontier is the next-free LBA of its region and is monotone
//! non-decreasing (truncate and WAL removal excepted). Concurrent writers
//! advance it with a compare-and-swap maximum: each writer proposes the end
//! of its own run, and losers whose proposal is already covered simply stop.
//! The result is `max(start + nr)` over all completed writes regardless of
//! completion order, so the file size never depends on scheduling.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::SUPERBLOCK_PATH;
use crate::device::DeviceGeometry;
use crate::error::{NvmeError, Result};
use crate::superblock::Superblock;

/// Classification of a path into the region it addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Superblock,
    Database,
    Wal,
    Temporary,
}

/// Classifies a path. First match wins, checked in a fixed order so that
/// `nvmefs:///tmp/a.db.wal` is temporary, not WAL.
pub fn classify_path(path: &str) -> Result<PathKind> {
    if path == SUPERBLOCK_PATH {
        Ok(PathKind::Superblock)
    } else if path.contains("/tmp") {
        Ok(PathKind::Temporary)
    } else if path.ends_with(".wal") {
        Ok(PathKind::Wal)
    } else if path.contains(".db") {
        Ok(PathKind::Database)
    } else {
        Err(NvmeError::UnknownPathKind(path.to_string()))
    }
}

/// A half-open LBA interval `[start, end)` reserved for one kind of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: u64,
    pub end: u64,
}

impl Region {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn nr_blocks(&self) -> u64 {
        self.end - self.start
    }

    /// Verifies that the run `[start_lba, start_lba + nr_lbas)` stays inside
    /// the region; no device command may be issued when this fails.
    pub fn check_run(&self, path: &str, start_lba: u64, nr_lbas: u64) -> Result<()> {
        if start_lba >= self.start && start_lba.saturating_add(nr_lbas) <= self.end {
            return Ok(());
        }

        Err(NvmeError::OutOfRange {
            path: path.to_string(),
            start_lba,
            nr_lbas,
            region_start: self.start,
            region_end: self.end,
        })
    }
}

/// The fixed partitioning of a namespace.
#[derive(Debug, Clone, Copy)]
pub struct RegionLayout {
    pub lba_size: u64,
    pub lba_count: u64,
    pub database: Region,
    pub wal: Region,
    pub temporary: Region,
}

impl RegionLayout {
    /// Derives the partition boundaries for a fresh namespace: the
    /// temporary region takes the top of the LBA space, the WAL sits below
    /// it, and everything between LBA 1 and the WAL belongs to the database.
    pub fn derive(geometry: DeviceGeometry, max_wal_size: u64, max_temp_size: u64) -> Result<Self> {
        let wal_blocks = max_wal_size.div_ceil(geometry.lba_size);
        let tmp_blocks = max_temp_size.div_ceil(geometry.lba_size);

        let reserved = 1 + wal_blocks + tmp_blocks;
        if reserved >= geometry.lba_count {
            return Err(NvmeError::device(format!(
                "namespace of {} blocks cannot hold {} WAL and {} temporary blocks plus a database",
                geometry.lba_count, wal_blocks, tmp_blocks
            )));
        }

        let tmp_start = geometry.lba_count - tmp_blocks;
        let wal_start = tmp_start - wal_blocks;

        Ok(Self {
            lba_size: geometry.lba_size,
            lba_count: geometry.lba_count,
            database: Region::new(1, wal_start),
            wal: Region::new(wal_start, tmp_start),
            temporary: Region::new(tmp_start, geometry.lba_count),
        })
    }

    /// Reconstructs the layout recorded in a superblock.
    pub fn from_superblock(sb: &Superblock, geometry: DeviceGeometry) -> Self {
        Self {
            lba_size: geometry.lba_size,
            lba_count: geometry.lba_count,
            database: Region::new(sb.db_start(), sb.wal_start()),
            wal: Region::new(sb.wal_start(), sb.tmp_start()),
            temporary: Region::new(sb.tmp_start(), geometry.lba_count),
        }
    }

    /// The region a path kind addresses. The superblock owns exactly LBA 0.
    pub fn region(&self, kind: PathKind) -> Region {
        match kind {
            PathKind::Superblock => Region::new(0, 1),
            PathKind::Database => self.database,
            PathKind::Wal => self.wal,
            PathKind::Temporary => self.temporary,
        }
    }
}

/// Lock-free write frontiers for the database and WAL regions.
#[derive(Debug)]
pub struct FrontierManager {
    db: AtomicU64,
    wal: AtomicU64,
}

impl FrontierManager {
    pub fn new(db_frontier: u64, wal_frontier: u64) -> Self {
        Self {
            db: AtomicU64::new(db_frontier),
            wal: AtomicU64::new(wal_frontier),
        }
    }

    pub fn db(&self) -> u64 {
        self.db.load(Ordering::Acquire)
    }

    pub fn wal(&self) -> u64 {
        self.wal.load(Ordering::Acquire)
    }

    /// Raises the frontier to `candidate` unless another writer already
    /// passed it. Returns the frontier value after the call.
    pub fn advance(&self, kind: PathKind, candidate: u64) -> u64 {
        let cell = match kind {
            PathKind::Database => &self.db,
            PathKind::Wal => &self.wal,
            _ => return 0,
        };

        let mut current = cell.load(Ordering::Acquire);
        while candidate > current {
            match cell.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return candidate,
                Err(observed) => current = observed,
            }
        }
        current
    }

    /// Lowers the frontier to `target` for truncation; raising through this
    /// path is not possible.
    pub fn truncate_to(&self, kind: PathKind, target: u64) {
        let cell = match kind {
            PathKind::Database => &self.db,
            PathKind::Wal => &self.wal,
            _ => return,
        };

        let mut current = cell.load(Ordering::Acquire);
        while target < current {
            match cell.compare_exchange_weak(current, target, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }

    /// Resets the WAL frontier to the region start; used by WAL removal.
    pub fn reset_wal(&self, wal_start: u64) {
        self.wal.store(wal_start, Ordering::Release);
    }
}
