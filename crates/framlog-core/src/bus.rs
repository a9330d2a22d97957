//! Framed transactions over a `Transport`
//!
//! Every exchange with the device has the same shape: assert chip select,
//! transmit a frame, optionally receive N bytes, release chip select. `Bus`
//! owns the transport and the fixed timeout so callers only describe frames.

use std::time::Duration;

use crate::error::FramResult;
use crate::format::Opcode;
use crate::transport::{ChipSelect, Transport};

/// Owned transport plus the timeout applied to every transmit/receive
pub struct Bus<T> {
    transport: T,
    timeout: Duration,
}

impl<T: Transport> Bus<T> {
    /// Wrap `transport`; `timeout` bounds each transmit and receive
    pub fn new(transport: T, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// One chip-select window: transmit `frame`, then fill `response` if non-empty.
    ///
    /// Chip select is released on every path, including a failed transmit.
    pub fn transaction(&mut self, frame: &[u8], response: &mut [u8]) -> FramResult<()> {
        let mut cs = ChipSelect::new(&mut self.transport);
        cs.transmit(frame, self.timeout)?;
        if !response.is_empty() {
            cs.receive(response, self.timeout)?;
        }
        Ok(())
    }

    /// Single-byte command with no response (WREN, WRDI, SLEEP)
    pub fn command(&mut self, opcode: Opcode) -> FramResult<()> {
        self.transaction(&[opcode as u8], &mut [])
    }

    /// Timeout applied to each exchange
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Borrow the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Release the underlying transport
    pub fn into_inner(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FramError;
    use crate::transport::TransportFault;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Vec<u8>>,
        open: bool,
        fault: Option<TransportFault>,
        seen_timeout: Option<Duration>,
    }

    impl Transport for Recorder {
        fn select(&mut self) {
            self.open = true;
            self.frames.push(Vec::new());
        }

        fn deselect(&mut self) { self.open = false }

        fn transmit(&mut self, bytes: &[u8], timeout: Duration) -> Result<(), TransportFault> {
            self.seen_timeout = Some(timeout);
            if let Some(fault) = self.fault {
                return Err(fault);
            }
            if let Some(frame) = self.frames.last_mut() {
                frame.extend_from_slice(bytes);
            }
            Ok(())
        }

        fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<(), TransportFault> {
            buf.fill(0xA5);
            Ok(())
        }
    }

    #[test]
    fn test_transaction_with_response() {
        let mut bus = Bus::new(Recorder::default(), Duration::from_millis(250));
        let mut response = [0u8; 2];
        bus.transaction(&[0x03, 0x00, 0xC8], &mut response).unwrap();

        assert_eq!(response, [0xA5, 0xA5]);
        assert_eq!(bus.transport().frames, vec![vec![0x03, 0x00, 0xC8]]);
        assert_eq!(bus.transport().seen_timeout, Some(Duration::from_millis(250)));
        assert!(!bus.transport().open);
    }

    #[test]
    fn test_fault_maps_and_releases() {
        let recorder = Recorder { fault: Some(TransportFault::Timeout), ..Recorder::default() };
        let mut bus = Bus::new(recorder, Duration::from_millis(1));

        assert_eq!(bus.command(Opcode::WriteEnable), Err(FramError::TransportTimeout));
        assert!(!bus.transport().open);
    }
}
