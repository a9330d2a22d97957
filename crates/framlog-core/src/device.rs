//! Device identification, status register and sleep

use crate::engine::FramStore;
use crate::error::{FramError, FramResult};
use crate::format::{address_frame, Opcode, DEVICE_ID_LEN, STATUS_WRITABLE};
use crate::transport::Transport;

/// Address reported by `WriteFailed` for a status register mismatch.
/// Lies outside every supported memory array.
pub const STATUS_REGISTER: u16 = 0xFFFF;

impl<T: Transport> FramStore<T> {
    /// RDID: manufacturer id, family, density, sub and revision
    pub fn device_id(&mut self) -> FramResult<[u8; DEVICE_ID_LEN]> {
        self.state()?;
        let mut id = [0u8; DEVICE_ID_LEN];
        self.bus.transaction(&[Opcode::ReadDeviceId as u8], &mut id)?;
        Ok(id)
    }

    /// RDSR
    pub fn read_status(&mut self) -> FramResult<u8> {
        self.state()?;
        let mut status = [0u8; 1];
        self.bus.transaction(&[Opcode::ReadStatus as u8], &mut status)?;
        Ok(status[0])
    }

    /// Gated WRSR, then read back BP0, BP1 and WPEN.
    ///
    /// Other bits of `value` are ignored by the device.
    pub fn write_status(&mut self, value: u8) -> FramResult<()> {
        self.state()?;
        self.bus.with_write_enabled(|bus| bus.transaction(&[Opcode::WriteStatus as u8, value], &mut []))?;

        let mut status = [0u8; 1];
        self.bus.transaction(&[Opcode::ReadStatus as u8], &mut status)?;
        let expected = value & STATUS_WRITABLE;
        let actual = status[0] & STATUS_WRITABLE;
        if actual != expected {
            return Err(FramError::WriteFailed { address: STATUS_REGISTER, expected, actual });
        }
        Ok(())
    }

    /// Put the device to sleep. The next chip select wakes it.
    pub fn sleep(&mut self) -> FramResult<()> {
        self.state()?;
        self.bus.command(Opcode::Sleep)
    }

    /// FSTRD of `buf.len()` bytes from `address`
    pub fn fast_read(&mut self, address: u16, buf: &mut [u8]) -> FramResult<()> {
        self.state()?;
        let [op, hi, lo] = address_frame(Opcode::FastRead, address);
        self.bus.transaction(&[op, hi, lo, 0x00], buf)
    }
}
