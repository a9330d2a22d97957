//! Serial transport boundary
//!
//! A `Transport` moves bytes to and from the device inside a chip-select
//! window. Hardware bindings (SPI peripheral, GPIO chip select) implement this
//! trait outside the crate; `sim::SimulatedFram` implements it for host tests.

use std::time::Duration;

/// Failure reported by a transport exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFault {
    /// Hard error on the link
    Error,
    /// Peripheral is busy with another exchange
    Busy,
    /// Exchange did not complete within the timeout
    Timeout,
}

/// Byte-level request/response link to the device.
///
/// `select` and `deselect` bracket one command frame. Callers never invoke them
/// directly; `ChipSelect` pairs them on every exit path.
pub trait Transport {
    /// Assert chip select, starting a command frame
    fn select(&mut self);

    /// Release chip select, ending the command frame
    fn deselect(&mut self);

    /// Clock `bytes` out to the device
    fn transmit(&mut self, bytes: &[u8], timeout: Duration) -> Result<(), TransportFault>;

    /// Clock `buf.len()` bytes in from the device
    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<(), TransportFault>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn select(&mut self) { (**self).select() }

    fn deselect(&mut self) { (**self).deselect() }

    fn transmit(&mut self, bytes: &[u8], timeout: Duration) -> Result<(), TransportFault> {
        (**self).transmit(bytes, timeout)
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<(), TransportFault> {
        (**self).receive(buf, timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn select(&mut self) { (**self).select() }

    fn deselect(&mut self) { (**self).deselect() }

    fn transmit(&mut self, bytes: &[u8], timeout: Duration) -> Result<(), TransportFault> {
        (**self).transmit(bytes, timeout)
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<(), TransportFault> {
        (**self).receive(buf, timeout)
    }
}

/// Scoped chip-select window. Deselects on drop.
pub struct ChipSelect<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
}

impl<'a, T: Transport + ?Sized> ChipSelect<'a, T> {
    /// Assert chip select on `transport`
    pub fn new(transport: &'a mut T) -> Self {
        transport.select();
        Self { transport }
    }

    /// Transmit within the window
    pub fn transmit(&mut self, bytes: &[u8], timeout: Duration) -> Result<(), TransportFault> {
        self.transport.transmit(bytes, timeout)
    }

    /// Receive within the window
    pub fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<(), TransportFault> {
        self.transport.receive(buf, timeout)
    }
}

impl<T: Transport + ?Sized> Drop for ChipSelect<'_, T> {
    fn drop(&mut self) {
        self.transport.deselect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records the call sequence and fails transmit on demand
    #[derive(Default)]
    struct Probe {
        calls: Vec<&'static str>,
        fail_transmit: bool,
    }

    impl Transport for Probe {
        fn select(&mut self) { self.calls.push("select") }

        fn deselect(&mut self) { self.calls.push("deselect") }

        fn transmit(&mut self, _bytes: &[u8], _timeout: Duration) -> Result<(), TransportFault> {
            self.calls.push("transmit");
            if self.fail_transmit { Err(TransportFault::Busy) } else { Ok(()) }
        }

        fn receive(&mut self, _buf: &mut [u8], _timeout: Duration) -> Result<(), TransportFault> {
            self.calls.push("receive");
            Ok(())
        }
    }

    #[test]
    fn test_chip_select_pairs_on_success() {
        let mut probe = Probe::default();
        {
            let mut cs = ChipSelect::new(&mut probe);
            cs.transmit(&[0x03], Duration::from_millis(1)).unwrap();
            cs.receive(&mut [0u8; 2], Duration::from_millis(1)).unwrap();
        }
        assert_eq!(probe.calls, vec!["select", "transmit", "receive", "deselect"]);
    }

    #[test]
    fn test_chip_select_released_on_error() {
        let mut probe = Probe { fail_transmit: true, ..Probe::default() };
        let result = {
            let mut cs = ChipSelect::new(&mut probe);
            cs.transmit(&[0x06], Duration::from_millis(1))
        };
        assert_eq!(result, Err(TransportFault::Busy));
        assert_eq!(probe.calls.last(), Some(&"deselect"));
    }

    #[test]
    fn test_mut_ref_forwards() {
        fn drive<T: Transport>(mut transport: T) {
            let _cs = ChipSelect::new(&mut transport);
        }

        let mut probe = Probe::default();
        drive(&mut probe);
        assert_eq!(probe.calls, vec!["select", "deselect"]);
    }
}
