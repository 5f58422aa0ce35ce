//! In-memory device backend.
//!
//! Backs the namespace with a heap buffer. Used by unit tests and by hosts
//! that want the full translation stack without touching hardware. Reads and
//! writes are plain `memcpy`s guarded by an `RwLock`; the bounce-buffer
//! read-modify-write of a real controller degenerates to copying the payload
//! in place.

use parking_lot::RwLock;

use super::{placement_index, Device, DeviceGeometry, IoCommand};
use crate::error::{NvmeError, Result};

/// Emulated namespace held in memory.
pub struct MemoryDevice {
    geometry: DeviceGeometry,
    data: RwLock<Vec<u8>>,
}

impl MemoryDevice {
    /// Creates a zero-filled namespace with the given geometry.
    pub fn new(lba_size: u64, lba_count: u64) -> Self {
        let bytes = (lba_size * lba_count) as usize;
        Self {
            geometry: DeviceGeometry {
                lba_size,
                lba_count,
            },
            data: RwLock::new(vec![0u8; bytes]),
        }
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

impl Device for MemoryDevice {
    fn geometry(&self) -> DeviceGeometry {
        self.geometry
    }

    fn read(&self, dst: &mut [u8], cmd: &IoCommand<'_>) -> Result<()> {
        let start = self.check_run(cmd, dst.len())?;

        let data = self.data.read();
        dst.copy_from_slice(&data[start..start + dst.len()]);
        Ok(())
    }

    fn write(&self, src: &[u8], cmd: &IoCommand<'_>) -> Result<u64> {
        let start = self.check_run(cmd, src.len())?;

        // A real backend attaches the placement identifier to the command;
        // in memory the hint has nowhere to go.
        let _plid = placement_index(cmd.path);

        let mut data = self.data.write();
        let lba_size = self.geometry.lba_size as usize;
        let run_start = cmd.start_lba as usize * lba_size;
        let run_end = run_start + cmd.nr_lbas as usize * lba_size;

        // Blocks the payload reaches are read-modify-written in place;
        // whole blocks past it are zero-filled.
        let reached = (cmd.offset as usize + src.len()).div_ceil(lba_size);
        let zero_from = (run_start + reached * lba_size).min(run_end);
        data[zero_from..run_end].fill(0);
        data[start..start + src.len()].copy_from_slice(src);

        Ok(cmd.nr_lbas)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> MemoryDevice {
        MemoryDevice::new(4096, 64)
    }

    fn cmd(start_lba: u64, nr_lbas: u64, offset: u64) -> IoCommand<'static> {
        IoCommand {
            start_lba,
            nr_lbas,
            offset,
            path: "nvmefs://test.db",
        }
    }

    #[test]
    fn write_then_read_round_trips() {
        let dev = device();
        let payload = b"Hello, World!";

        let written = dev.write(payload, &cmd(3, 1, 0)).unwrap();
        assert_eq!(written, 1);

        let mut out = vec![0u8; payload.len()];
        dev.read(&mut out, &cmd(3, 1, 0)).unwrap();
        assert_eq!(&out, payload);
    }

    #[test]
    fn write_honors_in_block_offset() {
        let dev = device();

        dev.write(b"abc", &cmd(0, 1, 100)).unwrap();

        let mut out = [0u8; 3];
        dev.read(&mut out, &cmd(0, 1, 100)).unwrap();
        assert_eq!(&out, b"abc");
    }

    #[test]
    fn partial_write_preserves_surrounding_bytes() {
        let dev = device();

        dev.write(&[0xFFu8; 4096], &cmd(5, 1, 0)).unwrap();
        dev.write(b"x", &cmd(5, 1, 0)).unwrap();
        dev.write(b"y", &cmd(5, 1, 200)).unwrap();

        let mut out = [0u8; 4096];
        dev.read(&mut out, &cmd(5, 1, 0)).unwrap();
        assert_eq!(out[0], b'x');
        assert_eq!(out[200], b'y');
        assert!(out[1..200].iter().all(|&b| b == 0xFF));
        assert!(out[201..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn blocks_past_the_payload_are_zero_filled() {
        let dev = device();

        dev.write(&[0xFFu8; 8192], &cmd(5, 2, 0)).unwrap();
        dev.write(b"x", &cmd(5, 2, 0)).unwrap();

        let mut out = [0u8; 8192];
        dev.read(&mut out, &cmd(5, 2, 0)).unwrap();
        assert_eq!(out[0], b'x');
        assert!(out[1..4096].iter().all(|&b| b == 0xFF));
        assert!(out[4096..].iter().all(|&b| b == 0));
    }

    #[test]
    fn run_past_namespace_end_is_a_device_error() {
        let dev = device();

        let result = dev.write(b"x", &cmd(63, 2, 0));
        assert!(matches!(result, Err(NvmeError::Device(_))));
    }

    #[test]
    fn oversized_payload_for_run_is_a_device_error() {
        let dev = device();

        let result = dev.write(&[0u8; 4097], &cmd(0, 1, 0));
        assert!(matches!(result, Err(NvmeError::Device(_))));
    }
}
