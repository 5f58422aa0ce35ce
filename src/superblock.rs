//! # Superblock Codec
//!
//! The superblock is the single persistent metadata record of the namespace,
//! stored at LBA 0. It records how the LBA space is partitioned into the
//! database, write-ahead-log and temporary regions, the write frontiers of
//! the first two, and the path of the attached database.
//!
//! ## On-Disk Layout
//!
//! Little-endian, 155 bytes at the start of LBA 0; the rest of the block is
//! reserved and zero:
//!
//! ```text
//! Offset  Size  Description
//! 0       6     Magic: "NVMEFS" (no NUL)
//! 6       8     db_start      (always 1)
//! 14      8     wal_start
//! 22      8     tmp_start
//! 30      8     db_frontier
//! 38      8     wal_frontier
//! 46      8     db_path_len
//! 54      101   db_path       (NUL-terminated, NUL-padded)
//! ```
//!
//! A namespace whose first six bytes do not spell the magic is considered
//! uninitialized; [`Superblock::decode`] reports that as `Ok(None)` rather
//! than an error, because it is the normal state of a fresh drive.
//!
//! ## Purity
//!
//! The codec never touches the device. The facade reads and writes LBA 0 and
//! hands the bytes here; encoding is the exact inverse of decoding.

use zerocopy::little_endian::U64;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::{DB_PATH_FIELD_LEN, MAX_DB_PATH_LEN};
use crate::error::{NvmeError, Result};

/// Magic tag opening the superblock.
pub const SUPERBLOCK_MAGIC: &[u8; 6] = b"NVMEFS";

/// Encoded size of the superblock record.
pub const SUPERBLOCK_SIZE: usize = std::mem::size_of::<Superblock>();

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct Superblock {
    magic: [u8; 6],
    db_start: U64,
    wal_start: U64,
    tmp_start: U64,
    db_frontier: U64,
    wal_frontier: U64,
    db_path_len: U64,
    db_path: [u8; DB_PATH_FIELD_LEN],
}

const _: () = assert!(std::mem::size_of::<Superblock>() == 155);

impl Superblock {
    /// Builds a fresh superblock for a just-initialized namespace: both
    /// frontiers sit at the start of their regions and the database path is
    /// recorded verbatim.
    pub fn new(db_start: u64, wal_start: u64, tmp_start: u64, db_path: &str) -> Result<Self> {
        let mut sb = Self {
            magic: *SUPERBLOCK_MAGIC,
            db_start: U64::new(db_start),
            wal_start: U64::new(wal_start),
            tmp_start: U64::new(tmp_start),
            db_frontier: U64::new(db_start),
            wal_frontier: U64::new(wal_start),
            db_path_len: U64::new(0),
            db_path: [0u8; DB_PATH_FIELD_LEN],
        };
        sb.set_db_path(db_path)?;
        Ok(sb)
    }

    /// Decodes a superblock from the first bytes of LBA 0.
    ///
    /// Returns `Ok(None)` when the magic is absent (uninitialized
    /// namespace). A present magic with an inconsistent record is an error.
    pub fn decode(bytes: &[u8]) -> Result<Option<Self>> {
        if bytes.len() < SUPERBLOCK_SIZE {
            return Err(NvmeError::device(format!(
                "buffer too small for superblock: {} < {}",
                bytes.len(),
                SUPERBLOCK_SIZE
            )));
        }

        if &bytes[..SUPERBLOCK_MAGIC.len()] != SUPERBLOCK_MAGIC {
            return Ok(None);
        }

        let sb = Self::read_from_bytes(&bytes[..SUPERBLOCK_SIZE])
            .map_err(|e| NvmeError::device(format!("failed to parse superblock: {e:?}")))?;

        if sb.db_path_len.get() as usize > MAX_DB_PATH_LEN {
            return Err(NvmeError::device(format!(
                "corrupt superblock: path length {} exceeds {}",
                sb.db_path_len.get(),
                MAX_DB_PATH_LEN
            )));
        }

        if !(sb.db_start.get() <= sb.wal_start.get() && sb.wal_start.get() <= sb.tmp_start.get()) {
            return Err(NvmeError::device(format!(
                "corrupt superblock: region boundaries {} / {} / {} are not ordered",
                sb.db_start.get(),
                sb.wal_start.get(),
                sb.tmp_start.get()
            )));
        }

        Ok(Some(sb))
    }

    /// Encodes the record into the head of `buf`; the remainder is zeroed by
    /// the caller's block buffer.
    pub fn encode(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() < SUPERBLOCK_SIZE {
            return Err(NvmeError::device(format!(
                "buffer too small for superblock: {} < {}",
                buf.len(),
                SUPERBLOCK_SIZE
            )));
        }

        buf[..SUPERBLOCK_SIZE].copy_from_slice(self.as_bytes());
        Ok(())
    }

    pub fn db_start(&self) -> u64 {
        self.db_start.get()
    }

    pub fn wal_start(&self) -> u64 {
        self.wal_start.get()
    }

    pub fn tmp_start(&self) -> u64 {
        self.tmp_start.get()
    }

    pub fn db_frontier(&self) -> u64 {
        self.db_frontier.get()
    }

    pub fn set_db_frontier(&mut self, lba: u64) {
        self.db_frontier = U64::new(lba);
    }

    pub fn wal_frontier(&self) -> u64 {
        self.wal_frontier.get()
    }

    pub fn set_wal_frontier(&mut self, lba: u64) {
        self.wal_frontier = U64::new(lba);
    }

    /// The stored database path, without scheme prefix.
    pub fn db_path(&self) -> &str {
        let len = self.db_path_len.get() as usize;
        std::str::from_utf8(&self.db_path[..len]).unwrap_or("")
    }

    pub fn set_db_path(&mut self, path: &str) -> Result<()> {
        if path.len() > MAX_DB_PATH_LEN {
            return Err(NvmeError::PathTooLong {
                path: path.to_string(),
                len: path.len(),
                max: MAX_DB_PATH_LEN,
            });
        }

        self.db_path = [0u8; DB_PATH_FIELD_LEN];
        self.db_path[..path.len()].copy_from_slice(path.as_bytes());
        self.db_path_len = U64::new(path.len() as u64);
        Ok(())
    }
}
