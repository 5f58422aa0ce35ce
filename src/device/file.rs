//! # File-Backed Device Emulation
//!
//! Emulates an NVMe namespace over a regular file using memory-mapped I/O.
//! This is the backend for development and integration testing on machines
//! without an FDP-capable drive: the file is sized to `lba_size × lba_count`
//! and every read or write becomes offset arithmetic into the mapping.
//!
//! ## Durability
//!
//! `sync` flushes the mapping with `msync`; the facade calls it when it
//! re-persists the superblock. There is no write-ahead journal here: the
//! emulation inherits exactly the atomicity the core expects from hardware,
//! a single-block write being atomic in practice.
//!
//! ## Concurrency
//!
//! The filesystem issues I/O from many threads against `&self`, so the
//! mapping lives behind a `Mutex`. Contention is irrelevant for an emulation
//! backend; a production backend submits to hardware queues instead.

use std::fs::OpenOptions;
use std::path::Path;

use memmap2::MmapMut;
use parking_lot::Mutex;

use super::{placement_index, Device, DeviceGeometry, IoCommand};
use crate::error::{NvmeError, Result};

/// Namespace emulation over a memory-mapped file.
pub struct FileDevice {
    geometry: DeviceGeometry,
    mmap: Mutex<MmapMut>,
}

impl FileDevice {
    /// Creates (or truncates) the backing file and maps a fresh namespace.
    pub fn create<P: AsRef<Path>>(path: P, lba_size: u64, lba_count: u64) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        let size = lba_size * lba_count;
        file.set_len(size)?;

        // SAFETY: MmapMut::map_mut is unsafe because the mapping can be
        // invalidated by external file modification. This is safe because:
        // 1. The file was just created with truncate=true and is owned by
        //    this process for the lifetime of the device.
        // 2. The file size is fixed at creation; the device never grows it.
        // 3. All access goes through read()/write() which bounds-check the
        //    LBA run against the geometry.
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        Ok(Self {
            geometry: DeviceGeometry {
                lba_size,
                lba_count,
            },
            mmap: Mutex::new(mmap),
        })
    }

    /// Maps an existing backing file, validating its size against the
    /// expected geometry.
    pub fn open<P: AsRef<Path>>(path: P, lba_size: u64) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let size = file.metadata()?.len();

        if size == 0 || size % lba_size != 0 {
            return Err(NvmeError::device(format!(
                "backing file '{}' size {} is not a multiple of the {}-byte LBA size",
                path.display(),
                size,
                lba_size
            )));
        }

        // SAFETY: same argument as in create(); additionally the size was
        // validated to be a whole number of blocks above.
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        Ok(Self {
            geometry: DeviceGeometry {
                lba_size,
                lba_count: size / lba_size,
            },
            mmap: Mutex::new(mmap),
        })
    }

    /// Flushes the mapping to the backing file.
    pub fn sync(&self) -> Result<()> {
        self.mmap.lock().flush()?;
        Ok(())
    }

    fn check_run(&self, cmd: &IoCommand<'_>, nr_bytes: usize) -> Result<usize> {
        let end_lba = cmd.start_lba.saturating_add(cmd.nr_lbas);
        if end_lba > self.geometry.lba_count {
            return Err(NvmeError::device(format!(
                "LBA run [{}, {}) exceeds namespace of {} blocks",
                cmd.start_lba, end_lba, self.geometry.lba_count
            )));
        }

        let run_bytes = (cmd.nr_lbas * self.geometry.lba_size) as usize;
        if cmd.offset as usize + nr_bytes > run_bytes {
            return Err(NvmeError::device(format!(
                "{} bytes at in-block offset {} overflow a {}-block run",
                nr_bytes, cmd.offset, cmd.nr_lbas
            )));
        }

        Ok((cmd.start_lba * self.geometry.lba_size + cmd.offset) as usize)
    }
}

impl Device for FileDevice {
    fn geometry(&self) -> DeviceGeometry {
        self.geometry
    }

    fn read(&self, dst: &mut [u8], cmd: &IoCommand<'_>) -> Result<()> {
        let start = self.check_run(cmd, dst.len())?;

        let mmap = self.mmap.lock();
        dst.copy_from_slice(&mmap[start..start + dst.len()]);
        Ok(())
    }

    fn write(&self, src: &[u8], cmd: &IoCommand<'_>) -> Result<u64> {
        let start = self.check_run(cmd, src.len())?;
        let _plid = placement_index(cmd.path);

        let mut mmap = self.mmap.lock();
        let lba_size = self.geometry.lba_size as usize;
        let run_start = cmd.start_lba as usize * lba_size;
        let run_end = run_start + cmd.nr_lbas as usize * lba_size;

        // Blocks the payload reaches are read-modify-written in place;
        // whole blocks past it are zero-filled.
        let reached = (cmd.offset as usize + src.len()).div_ceil(lba_size);
        let zero_from = (run_start + reached * lba_size).min(run_end);
        mmap[zero_from..run_end].fill(0);
        mmap[start..start + src.len()].copy_from_slice(src);

        Ok(cmd.nr_lbas)
    }

    fn name(&self) -> &str {
        "file"
    }
}
