//! Ring addressing and cursor/counter bookkeeping
//!
//! The ring is `capacity + 1` physical slots from `start` to `end` inclusive.
//! The cursor names the slot that receives the next record; the `count`
//! slots behind it, oldest first, are the retained history. Logical index 1
//! is the oldest retained record and `count` the newest.

use crate::config::Config;
use crate::error::{FramError, FramResult};
use crate::format::SLOT_SIZE;

/// Cached copy of the persistent counter and cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingState {
    /// Retained records, `0..=capacity`
    pub count: u16,
    /// Address of the next slot to write
    pub cursor: u16,
}

/// Slot arithmetic for one ring region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingGeometry {
    start: u16,
    end: u16,
}

impl RingGeometry {
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ring_start, config.ring_end)
    }

    pub fn start(&self) -> u16 { self.start }

    pub fn end(&self) -> u16 { self.end }

    /// Records retained once full; one less than the physical slot count
    pub fn capacity(&self) -> u16 {
        (self.end - self.start) / SLOT_SIZE
    }

    fn slots(&self) -> u32 {
        self.capacity() as u32 + 1
    }

    /// True if `address` is a slot boundary inside the ring
    pub fn contains(&self, address: u16) -> bool {
        address >= self.start && address <= self.end && (address - self.start) % SLOT_SIZE == 0
    }

    /// Slot after `address`, wrapping `end` to `start`
    pub fn next_slot(&self, address: u16) -> u16 {
        if address == self.end { self.start } else { address + SLOT_SIZE }
    }

    /// Slot before `address`, wrapping `start` to `end`
    pub fn prev_slot(&self, address: u16) -> u16 {
        if address == self.start { self.end } else { address - SLOT_SIZE }
    }

    /// Slot `steps` positions behind `address`.
    ///
    /// Same result as applying `prev_slot` `steps` times.
    pub fn rewind(&self, address: u16, steps: u16) -> u16 {
        let slots = self.slots();
        let index = (address - self.start) as u32 / SLOT_SIZE as u32;
        let back = steps as u32 % slots;
        let target = (index + slots - back) % slots;
        self.start + (target * SLOT_SIZE as u32) as u16
    }

    /// Physical address of `logical_index` (1 = oldest) for `state`
    pub fn address_of(&self, state: RingState, logical_index: u16) -> FramResult<u16> {
        if state.count == 0 {
            return Err(FramError::ZeroRecords);
        }
        if logical_index < 1 || logical_index > state.count {
            return Err(FramError::InvalidArgument {
                argument: "logical index",
                value: logical_index as u32,
                min: 1,
                max: state.count as u32,
            });
        }
        Ok(self.rewind(state.cursor, state.count - logical_index + 1))
    }

    /// Address of the newest record
    pub fn last_address(&self, state: RingState) -> FramResult<u16> {
        if state.count == 0 {
            return Err(FramError::ZeroRecords);
        }
        Ok(self.prev_slot(state.cursor))
    }

    /// State after one more record: count saturates at capacity, cursor wraps
    pub fn advance(&self, state: RingState) -> RingState {
        RingState {
            count: state.count.saturating_add(1).min(self.capacity()),
            cursor: self.next_slot(state.cursor),
        }
    }
}
