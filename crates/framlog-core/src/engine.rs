//! FRAM event store: ring manager over the commit protocol
//!
//! `FramStore` owns one transport and one region layout. It starts
//! Uninitialized; `init` (or `open`) reads and repairs the persisted count and
//! cursor and moves it to Bootstrapped. Every ring, config table and device
//! operation fails with `Uninitialized` until then.
//!
//! **Append ordering** (each step verified before the next starts):
//! 1. record bytes into the slot under the cursor
//! 2. saturating count
//! 3. advanced cursor
//!
//! The cache follows each persisted step, so after a failure it matches what
//! the medium holds. Power loss after step 1 leaves the new record outside the
//! counted window; after step 2 the counted window may include one stale slot
//! while the cursor still names it. The cursor itself is two single-byte
//! writes, so a cut between them when the high byte changes leaves a cursor
//! mixing old and new bytes.

use tracing::{info, trace};

use crate::bootstrap::load_ring_state;
use crate::bus::Bus;
use crate::config::Config;
use crate::error::{FramError, FramResult};
use crate::record::LogRecord;
use crate::ring::{RingGeometry, RingState};
use crate::transport::Transport;
use crate::traversal::Records;

/// Bytes per WRITE frame during a factory reset
pub const RESET_CHUNK: usize = 256;

/// Event ring, config table and device access for one FRAM device.
///
/// Single owner, blocking, no internal locking. Wrap it in a
/// `SharedStore` when several threads need it.
pub struct FramStore<T> {
    pub(crate) bus: Bus<T>,
    config: Config,
    geometry: RingGeometry,
    /// `None` until bootstrapped
    ring: Option<RingState>,
}

impl<T: Transport> FramStore<T> {
    /// Build an Uninitialized store. No device access.
    pub fn new(transport: T, config: Config) -> FramResult<Self> {
        config.validate().map_err(|reason| FramError::InvalidConfig { reason })?;
        Ok(Self {
            bus: Bus::new(transport, config.transport_timeout),
            geometry: RingGeometry::from_config(&config),
            config,
            ring: None,
        })
    }

    /// Build and bootstrap in one step
    pub fn open(transport: T, config: Config) -> FramResult<Self> {
        let mut store = Self::new(transport, config)?;
        store.init()?;
        Ok(store)
    }

    /// Load the ring state from the medium, repairing out-of-range values.
    ///
    /// On failure the store is left Uninitialized.
    pub fn init(&mut self) -> FramResult<()> {
        self.ring = None;
        self.ring = Some(load_ring_state(&mut self.bus, &self.config)?);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.ring.is_some()
    }

    pub(crate) fn state(&self) -> FramResult<RingState> {
        self.ring.ok_or(FramError::Uninitialized)
    }

    /// Append one event, overwriting the oldest once the ring is full.
    ///
    /// Arguments are checked before any device access.
    pub fn append(&mut self, level: u8, thread: u8, code: u16) -> FramResult<()> {
        let state = self.state()?;
        let record = LogRecord::new(level, thread, code)?;
        self.commit(state, record)
    }

    /// Append an already validated record
    pub fn append_record(&mut self, record: LogRecord) -> FramResult<()> {
        let state = self.state()?;
        self.commit(state, record)
    }

    fn commit(&mut self, state: RingState, record: LogRecord) -> FramResult<()> {
        let next = self.geometry.advance(state);

        self.bus.write_and_verify(state.cursor, &record.to_bytes())?;

        self.bus.write_u16_verified(self.config.count_address, next.count)?;
        self.ring = Some(RingState { count: next.count, cursor: state.cursor });

        self.bus.write_u16_verified(self.config.cursor_address, next.cursor)?;
        self.ring = Some(next);

        trace!(
            level = record.level(),
            thread = record.thread(),
            code = record.code(),
            slot = state.cursor,
            count = next.count,
            "record appended"
        );
        Ok(())
    }

    /// Newest record
    pub fn last_record(&mut self) -> FramResult<LogRecord> {
        let address = self.geometry.last_address(self.state()?)?;
        self.read_record(address)
    }

    /// Record at `logical_index`, 1 = oldest retained, `count` = newest
    pub fn record_at(&mut self, logical_index: u16) -> FramResult<LogRecord> {
        let address = self.address_of(logical_index)?;
        self.read_record(address)
    }

    /// Physical slot address `record_at(logical_index)` reads
    pub fn address_of(&self, logical_index: u16) -> FramResult<u16> {
        self.geometry.address_of(self.state()?, logical_index)
    }

    fn read_record(&mut self, address: u16) -> FramResult<LogRecord> {
        let mut slot = [0u8; 2];
        self.bus.read(address, &mut slot)?;
        Ok(LogRecord::from_bytes(slot))
    }

    /// Retained records
    pub fn count(&self) -> FramResult<u16> {
        Ok(self.state()?.count)
    }

    /// Address of the slot the next append writes
    pub fn write_cursor(&self) -> FramResult<u16> {
        Ok(self.state()?.cursor)
    }

    /// Records retained once the ring is full
    pub fn capacity(&self) -> u16 {
        self.geometry.capacity()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lazy walk over the retained window, oldest first; `rev()` for newest first
    pub fn records(&mut self) -> FramResult<Records<'_, T>> {
        let state = self.state()?;
        Ok(Records::new(&mut self.bus, self.geometry, state))
    }

    /// Every retained record, oldest first
    pub fn all_from_oldest(&mut self) -> FramResult<Vec<LogRecord>> {
        self.records()?.collect()
    }

    /// Every retained record, newest first
    pub fn all_from_newest(&mut self) -> FramResult<Vec<LogRecord>> {
        self.records()?.rev().collect()
    }

    /// Fill the whole device with the erase value and restart with an empty ring.
    ///
    /// Works in either state. Bulk frames are not read back; the count and
    /// cursor are. Cells under block protection keep their contents. On
    /// failure the store is left Uninitialized.
    pub fn factory_reset(&mut self) -> FramResult<()> {
        self.ring = None;

        let erase = [self.config.erase_value; RESET_CHUNK];
        let end = self.config.last_address as usize + 1;
        let mut address = 0usize;
        while address < end {
            let len = (end - address).min(RESET_CHUNK);
            self.bus.write_unverified(address as u16, &erase[..len])?;
            address += len;
        }

        self.bus.write_u16_verified(self.config.count_address, 0)?;
        self.bus.write_u16_verified(self.config.cursor_address, self.geometry.start())?;
        self.ring = Some(RingState { count: 0, cursor: self.geometry.start() });

        info!(erase_value = self.config.erase_value, bytes = end, "factory reset complete");
        Ok(())
    }

    pub fn transport(&self) -> &T {
        self.bus.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.bus.transport_mut()
    }

    /// Release the transport
    pub fn into_transport(self) -> T {
        self.bus.into_inner()
    }
}
