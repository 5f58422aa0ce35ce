//! # Configuration Constants
//!
//! Centralizes the fixed values of the on-device layout and the path scheme.
//! Constants that depend on each other are co-located and guarded by
//! compile-time assertions so a change to one cannot silently break another.
//!
//! ## Dependency Notes
//!
//! ```text
//! MAX_DB_PATH_LEN (100)
//!       └─> DB_PATH_FIELD_LEN (101, NUL-terminated field in the superblock)
//!
//! DEFAULT_MAX_WAL_SIZE / DEFAULT_MAX_TEMP_SIZE
//!       └─> region partition boundaries derived at namespace initialization;
//!           both are rounded up to whole LBAs during layout derivation.
//! ```

/// URI scheme prefix routing a path to this filesystem.
pub const PATH_PREFIX: &str = "nvmefs://";

/// Sentinel path addressing the superblock at LBA 0.
pub const SUPERBLOCK_PATH: &str = "nvmefs://.superblock";

/// Directory under which all temporary spill files live.
pub const TEMP_DIR_PATH: &str = "nvmefs:///tmp";

/// LBA holding the superblock. Never moves.
pub const SUPERBLOCK_LBA: u64 = 0;

/// Maximum stored length of the database path, excluding the NUL terminator.
pub const MAX_DB_PATH_LEN: usize = 100;

/// Size of the NUL-padded path field in the superblock.
pub const DB_PATH_FIELD_LEN: usize = 101;

const _: () = assert!(
    DB_PATH_FIELD_LEN == MAX_DB_PATH_LEN + 1,
    "superblock path field must hold MAX_DB_PATH_LEN bytes plus a NUL"
);

/// Default upper bound on the temporary region, in bytes (200 GiB).
pub const DEFAULT_MAX_TEMP_SIZE: u64 = 200 << 30;

/// Default upper bound on the write-ahead-log region, in bytes (32 MiB).
pub const DEFAULT_MAX_WAL_SIZE: u64 = 1 << 25;

/// Default number of FDP placement handles to discover on the controller.
pub const DEFAULT_PLACEMENT_HANDLES: u64 = 8;

/// Blocks handed to a temporary file on creation. Growth doubles from here,
/// so the constant only bounds the smallest spill files.
pub const INITIAL_TEMP_FILE_BLOCKS: u64 = 8;
