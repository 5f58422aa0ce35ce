//! # Temporary Region Management
//!
//! Everything that lives under `nvmefs:///tmp`: the first-fit block
//! allocator over the temporary LBA region and the per-file metadata that
//! maps spill-file names onto contiguous block ranges.
//!
//! - `block_manager`: free-range list, allocation, coalescing
//! - `metadata`: name → `{range, frontier}` table and growth orchestration

mod block_manager;
mod metadata;

pub use block_manager::{LbaRange, TemporaryBlockManager};
pub use metadata::TemporaryFileManager;
