//! Ordered traversal of retained records
//!
//! `Records` walks the retained window slot by slot, tracking the physical
//! address incrementally: O(count) for a whole pass instead of resolving
//! every logical index from the cursor. Front to back is oldest to newest;
//! `rev()` gives newest to oldest.

use crate::bus::Bus;
use crate::error::FramResult;
use crate::record::LogRecord;
use crate::ring::{RingGeometry, RingState};
use crate::transport::Transport;

/// Lazy, forward-only sequence of records. Stops after the first error.
pub struct Records<'a, T: Transport> {
    bus: &'a mut Bus<T>,
    geometry: RingGeometry,
    /// Address of the oldest record not yet yielded from the front
    front: u16,
    /// Address of the newest record not yet yielded from the back
    back: u16,
    remaining: u16,
}

impl<'a, T: Transport> Records<'a, T> {
    pub(crate) fn new(bus: &'a mut Bus<T>, geometry: RingGeometry, state: RingState) -> Self {
        Self {
            bus,
            geometry,
            front: geometry.rewind(state.cursor, state.count),
            back: geometry.prev_slot(state.cursor),
            remaining: state.count,
        }
    }

    fn read_slot(&mut self, address: u16) -> Option<FramResult<LogRecord>> {
        let mut slot = [0u8; 2];
        match self.bus.read(address, &mut slot) {
            Ok(()) => {
                self.remaining -= 1;
                Some(Ok(LogRecord::from_bytes(slot)))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }
}

impl<T: Transport> Iterator for Records<'_, T> {
    type Item = FramResult<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let address = self.front;
        self.front = self.geometry.next_slot(address);
        self.read_slot(address)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

impl<T: Transport> DoubleEndedIterator for Records<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let address = self.back;
        self.back = self.geometry.prev_slot(address);
        self.read_slot(address)
    }
}
