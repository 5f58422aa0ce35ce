//! # Device and Filesystem Configuration
//!
//! [`NvmeConfig`] describes the target namespace and the layout knobs the
//! filesystem derives its partitioning from. The backend tag selects the
//! device-submission driver; it is sanitized against a fixed set of known
//! backends and never affects the core translation contract.

mod constants;

pub use constants::{
    DB_PATH_FIELD_LEN, DEFAULT_MAX_TEMP_SIZE, DEFAULT_MAX_WAL_SIZE, DEFAULT_PLACEMENT_HANDLES,
    INITIAL_TEMP_FILE_BLOCKS, MAX_DB_PATH_LEN, PATH_PREFIX, SUPERBLOCK_LBA, SUPERBLOCK_PATH,
    TEMP_DIR_PATH,
};

/// Backends that complete commands asynchronously.
const ASYNC_BACKENDS: &[&str] = &[
    "io_uring",
    "io_uring_cmd",
    "spdk_async",
    "libaio",
    "io_ring",
    "iocp",
    "iocp_th",
    "posix",
    "emu",
    "thrpool",
    "nil",
];

/// Backends that complete commands synchronously.
const SYNC_BACKENDS: &[&str] = &["spdk_sync", "nvme"];

/// Configuration record consumed by the device layer and the facade.
#[derive(Debug, Clone)]
pub struct NvmeConfig {
    /// Target NVMe device node, e.g. `/dev/ng0n1`.
    pub device_path: String,

    /// Sanitized storage backend tag.
    pub backend: String,

    /// Whether the selected backend completes commands asynchronously.
    pub async_io: bool,

    /// Number of FDP placement handles to discover.
    pub placement_handles: u64,

    /// Upper bound (bytes) on the temporary region.
    pub max_temp_size: u64,

    /// Upper bound (bytes) on the write-ahead-log region.
    pub max_wal_size: u64,

    /// Advisory parallelism hint for the device.
    pub max_threads: usize,
}

impl NvmeConfig {
    /// Creates a new config builder.
    pub fn builder() -> NvmeConfigBuilder {
        NvmeConfigBuilder::default()
    }
}

impl Default for NvmeConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            backend: "nvme".to_string(),
            async_io: false,
            placement_handles: DEFAULT_PLACEMENT_HANDLES,
            max_temp_size: DEFAULT_MAX_TEMP_SIZE,
            max_wal_size: DEFAULT_MAX_WAL_SIZE,
            max_threads: 1,
        }
    }
}

/// Builder for [`NvmeConfig`].
///
/// The backend tag is sanitized in [`build`](NvmeConfigBuilder::build):
/// unknown or empty tags fall back to the synchronous `nvme` backend, and
/// the two SPDK tags normalize to `spdk`.
#[derive(Debug, Default)]
pub struct NvmeConfigBuilder {
    config: NvmeConfig,
    raw_backend: Option<String>,
}

impl NvmeConfigBuilder {
    pub fn device_path(mut self, path: impl Into<String>) -> Self {
        self.config.device_path = path.into();
        self
    }

    pub fn backend(mut self, backend: impl Into<String>) -> Self {
        self.raw_backend = Some(backend.into());
        self
    }

    pub fn placement_handles(mut self, count: u64) -> Self {
        self.config.placement_handles = count;
        self
    }

    pub fn max_temp_size(mut self, bytes: u64) -> Self {
        self.config.max_temp_size = bytes;
        self
    }

    pub fn max_wal_size(mut self, bytes: u64) -> Self {
        self.config.max_wal_size = bytes;
        self
    }

    pub fn max_threads(mut self, threads: usize) -> Self {
        self.config.max_threads = threads;
        self
    }

    pub fn build(mut self) -> NvmeConfig {
        let raw = self.raw_backend.take().unwrap_or_default();
        self.config.async_io = is_async_backend(&raw);
        self.config.backend = sanitize_backend(&raw);
        self.config
    }
}

/// Returns true if the tag names a backend with asynchronous completion.
pub fn is_async_backend(backend: &str) -> bool {
    ASYNC_BACKENDS.contains(&backend)
}

/// Maps an arbitrary backend tag onto the fixed supported set.
pub fn sanitize_backend(backend: &str) -> String {
    if backend.is_empty()
        || (!SYNC_BACKENDS.contains(&backend) && !ASYNC_BACKENDS.contains(&backend))
    {
        return "nvme".to_string();
    }

    if backend == "spdk_async" || backend == "spdk_sync" {
        return "spdk".to_string();
    }

    backend.to_string()
}
