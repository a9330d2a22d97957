//! Write-then-verify commit protocol
//!
//! The device never acknowledges a write. The only way to detect a dropped or
//! partial write (brown-out, protected block, stuck cell) is to read the byte
//! back. A mismatch is reported as `WriteFailed` and never retried here.

use tracing::debug;

use crate::bus::Bus;
use crate::error::{FramError, FramResult};
use crate::format::{address_frame, write_frame, Opcode};
use crate::transport::Transport;

impl<T: Transport> Bus<T> {
    /// Read `buf.len()` consecutive bytes starting at `address`
    pub fn read(&mut self, address: u16, buf: &mut [u8]) -> FramResult<()> {
        self.transaction(&address_frame(Opcode::Read, address), buf)
    }

    /// Read a big-endian u16 at `address`
    pub fn read_u16(&mut self, address: u16) -> FramResult<u16> {
        let mut buf = [0u8; 2];
        self.read(address, &mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Gated WRITE of `data` to consecutive addresses, without read-back
    pub fn write_unverified(&mut self, address: u16, data: &[u8]) -> FramResult<()> {
        let frame = write_frame(address, data);
        self.with_write_enabled(|bus| bus.transaction(&frame, &mut []))
    }

    /// Write `bytes` at `address` one gated byte at a time, reading each back.
    ///
    /// Returns on the first transport failure or mismatch; bytes after that
    /// point are not written.
    pub fn write_and_verify(&mut self, address: u16, bytes: &[u8]) -> FramResult<()> {
        for (offset, &expected) in bytes.iter().enumerate() {
            let target = u16::try_from(offset)
                .ok()
                .and_then(|offset| address.checked_add(offset))
                .ok_or(FramError::InvalidArgument {
                    argument: "address",
                    value: address as u32 + offset as u32,
                    min: 0,
                    max: u16::MAX as u32,
                })?;

            self.write_unverified(target, &[expected])?;

            let mut actual = [0u8; 1];
            self.read(target, &mut actual)?;
            if actual[0] != expected {
                debug!(address = target, expected, actual = actual[0], "read-back mismatch");
                return Err(FramError::WriteFailed { address: target, expected, actual: actual[0] });
            }
        }
        Ok(())
    }

    /// Write a big-endian u16 with verification
    pub fn write_u16_verified(&mut self, address: u16, value: u16) -> FramResult<()> {
        self.write_and_verify(address, &value.to_be_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedFram;
    use crate::transport::TransportFault;
    use std::time::Duration;

    fn sim_bus() -> (Bus<SimulatedFram>, crate::sim::MediumHandle) {
        let sim = SimulatedFram::new();
        let handle = sim.handle();
        (Bus::new(sim, Duration::from_millis(10)), handle)
    }

    #[test]
    fn test_write_and_verify_roundtrip() {
        let (mut bus, medium) = sim_bus();
        bus.write_and_verify(0x0100, &[0xDE, 0xAD, 0xBE]).unwrap();

        assert_eq!(medium.peek(0x0100), 0xDE);
        assert_eq!(medium.peek(0x0101), 0xAD);
        assert_eq!(medium.peek(0x0102), 0xBE);
        assert!(!medium.write_latch());
    }

    #[test]
    fn test_each_byte_is_its_own_write_command() {
        let (mut bus, medium) = sim_bus();
        bus.write_and_verify(0x0200, &[1, 2]).unwrap();
        assert_eq!(medium.write_commands(), 2);
    }

    #[test]
    fn test_stuck_cell_reports_write_failed() {
        let (mut bus, medium) = sim_bus();
        medium.stick(0x0201, 0x55);

        let result = bus.write_and_verify(0x0200, &[0x11, 0x22, 0x33]);
        assert_eq!(result, Err(FramError::WriteFailed { address: 0x0201, expected: 0x22, actual: 0x55 }));
        // Bytes after the mismatch are not attempted
        assert_eq!(medium.peek(0x0202), 0x00);
        assert_eq!(medium.peek(0x0200), 0x11);
    }

    #[test]
    fn test_transport_fault_passes_through() {
        let (mut bus, medium) = sim_bus();
        medium.fail_after(0, TransportFault::Busy);
        assert_eq!(bus.write_and_verify(0x0300, &[7]), Err(FramError::TransportBusy));
    }

    #[test]
    fn test_u16_big_endian() {
        let (mut bus, medium) = sim_bus();
        bus.write_u16_verified(0x0064, 0x3F9B).unwrap();

        assert_eq!(medium.peek(0x0064), 0x3F);
        assert_eq!(medium.peek(0x0065), 0x9B);
        assert_eq!(bus.read_u16(0x0064).unwrap(), 0x3F9B);
    }

    #[test]
    fn test_address_overflow_rejected() {
        let (mut bus, _medium) = sim_bus();
        let result = bus.write_and_verify(u16::MAX, &[1, 2]);
        assert!(matches!(result, Err(FramError::InvalidArgument { argument: "address", .. })));
    }
}
