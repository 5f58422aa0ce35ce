//! # nvmefs - Thin Filesystem over a Raw NVMe Namespace
//!
//! nvmefs maps a small, fixed set of logical files (one database file, one
//! write-ahead log, and short-lived temporary spill files) directly onto
//! the LBA space of a single NVMe namespace. There is no kernel page cache
//! and no general-purpose filesystem underneath: the embedded analytical
//! database on top drives its own buffer management, and this crate's job
//! is to turn path-addressed byte I/O into block-aligned device commands
//! against statically partitioned regions.
//!
//! Writes are routed through NVMe Flexible Data Placement handles derived
//! from the path, so data of different lifetimes (database pages, WAL
//! appends, spill files) lands on physically separated flash.
//!
//! ## Quick Start
//!
//! ```ignore
//! use nvmefs::{MemoryDevice, NvmeConfig, NvmeFileSystem, OpenFlags};
//!
//! let config = NvmeConfig::builder()
//!     .device_path("/dev/ng0n1")
//!     .max_wal_size(32 << 20)
//!     .build();
//! let device = Box::new(MemoryDevice::new(4096, 262144));
//! let fs = NvmeFileSystem::new(config, device);
//!
//! let handle = fs.open_file("nvmefs://analytics.db", OpenFlags::READ | OpenFlags::WRITE)?;
//! fs.write(&handle, b"page zero", 0)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │        Facade (NvmeFileSystem)           │  open/read/write/list/sync
//! ├──────────────────────────────────────────┤
//! │  Region router + frontiers │ Temp files  │  classify, bounds, CAS-max
//! ├──────────────────────────────────────────┤
//! │    Handle translation (bytes → LBAs)     │
//! ├──────────────────────────────────────────┤
//! │       Superblock codec (LBA 0)           │
//! ├──────────────────────────────────────────┤
//! │   Device capability (trait + backends)   │  geometry, LBA-run I/O, FDP
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## On-Device Layout
//!
//! ```text
//! LBA 0          1                 wal_start     tmp_start      lba_count
//! +------------+-------------------+-------------+----------------+
//! | superblock |     DATABASE      |     WAL     |   TEMPORARY    |
//! +------------+-------------------+-------------+----------------+
//! ```
//!
//! ## Module Overview
//!
//! - [`config`]: configuration record, backend sanitization, layout constants
//! - [`device`]: the `Device` capability and the memory/file backends
//! - [`superblock`]: the persistent metadata record at LBA 0
//! - [`temp`]: free-range allocator and spill-file metadata
//! - [`region`]: path classification, partition layout, write frontiers
//! - [`handle`]: file handles and byte↔LBA translation
//! - [`filesystem`]: the facade tying it all together

pub mod config;
pub mod device;
pub mod error;
pub mod filesystem;
pub mod handle;
pub mod region;
pub mod superblock;
pub mod temp;

pub use config::{NvmeConfig, NvmeConfigBuilder};
pub use device::{Device, DeviceGeometry, FileDevice, IoCommand, MemoryDevice};
pub use error::{NvmeError, Result};
pub use filesystem::{DirEntry, NvmeFileSystem};
pub use handle::{NvmeFileHandle, OpenFlags};
pub use region::PathKind;
pub use superblock::Superblock;
pub use temp::{LbaRange, TemporaryBlockManager, TemporaryFileManager};
