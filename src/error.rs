//! Error types for nvmefs.
//!
//! Every fallible operation in the crate returns [`Result`], carrying a
//! structured [`NvmeError`] code. The host dispatches on the code, not on
//! message text; messages exist for logs and diagnostics only.
//!
//! The taxonomy mirrors the failure classes of the filesystem: state (no
//! database attached, second database), configuration (malformed or oversized
//! paths), bounds (seek or I/O leaving its region), resource exhaustion in
//! the temporary region, and device failures. Device errors are surfaced
//! verbatim and never retried; no persistent state is mutated on a failed
//! write.

use thiserror::Error;

/// Result type alias using [`NvmeError`].
pub type Result<T> = std::result::Result<T, NvmeError>;

/// Structured error codes surfaced by the filesystem.
#[derive(Debug, Error)]
pub enum NvmeError {
    /// The namespace carries no superblock and the operation requires one.
    #[error("no database attached to namespace")]
    NoDatabaseAttached,

    /// The path matches none of the recognized shapes (database, WAL,
    /// temporary, superblock sentinel).
    #[error("cannot classify path '{0}'")]
    UnknownPathKind(String),

    /// A seek or I/O request left the LBA region assigned to its path.
    #[error("out of range on '{path}': LBA run [{start_lba}, {start_lba}+{nr_lbas}) exceeds region [{region_start}, {region_end})")]
    OutOfRange {
        path: String,
        start_lba: u64,
        nr_lbas: u64,
        region_start: u64,
        region_end: u64,
    },

    /// The temporary region cannot satisfy an allocation.
    #[error("temporary region exhausted: {requested} blocks requested, {available} free")]
    NoSpace { requested: u64, available: u64 },

    /// The named file does not exist.
    #[error("file not found: '{0}'")]
    NotFound(String),

    /// The path exceeds the superblock's stored-path capacity.
    #[error("path '{path}' is {len} bytes, limit is {max}")]
    PathTooLong {
        path: String,
        len: usize,
        max: usize,
    },

    /// A second database path was addressed while another is attached.
    #[error("database '{attached}' is attached, cannot address '{requested}'")]
    MultipleDatabases { attached: String, requested: String },

    /// The operation is not defined for this path kind.
    #[error("operation '{operation}' is not supported on '{path}'")]
    Unsupported {
        operation: &'static str,
        path: String,
    },

    /// The underlying device reported an I/O failure.
    #[error("device I/O failed: {0}")]
    Device(#[from] std::io::Error),
}

impl NvmeError {
    /// Shorthand for device failures that do not originate in `std::io`.
    pub fn device(msg: impl Into<String>) -> Self {
        NvmeError::Device(std::io::Error::other(msg.into()))
    }
}
