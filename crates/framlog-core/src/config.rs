//! Region layout configuration
//!
//! Provides the FM25V02A memory map as the default preset, a compact preset
//! for small rings, and validation of custom layouts.

use std::time::Duration;

use crate::format::{
    CONFIG_SLOTS, CONFIG_START, COUNT_ADDRESS, CURSOR_ADDRESS, ERASE_VALUE, LAST_ADDRESS,
    RING_END, RING_START, SLOT_SIZE,
};

/// Transport timeout used by the presets: 10,000 milliseconds
pub const DEFAULT_TRANSPORT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Fixed region layout of one FRAM device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of single-byte config slots, starting at address 0
    pub config_slots: u16,
    /// Address of the big-endian record count
    pub count_address: u16,
    /// Address of the big-endian write cursor
    pub cursor_address: u16,
    /// First ring slot address
    pub ring_start: u16,
    /// Last ring slot address
    pub ring_end: u16,
    /// Highest byte address of the device
    pub last_address: u16,
    /// Byte value written everywhere by a factory reset
    pub erase_value: u8,
    /// Bound on each transmit/receive
    pub transport_timeout: Duration,
}

impl Config {
    /// FM25V02A: 32 KiB, 100 config slots, 16,283-record ring
    pub fn fm25v02a() -> Self {
        Self {
            config_slots: CONFIG_SLOTS,
            count_address: COUNT_ADDRESS,
            cursor_address: CURSOR_ADDRESS,
            ring_start: RING_START,
            ring_end: RING_END,
            last_address: LAST_ADDRESS,
            erase_value: ERASE_VALUE,
            transport_timeout: DEFAULT_TRANSPORT_TIMEOUT,
        }
    }

    /// Default memory map with the ring shrunk to retain `capacity` records
    pub fn compact(capacity: u16) -> Self {
        Self {
            ring_end: RING_START.saturating_add(capacity.saturating_mul(SLOT_SIZE)),
            ..Self::fm25v02a()
        }
    }

    /// Records retained once the ring is full.
    ///
    /// The ring has one more physical slot than this; the spare slot is the
    /// one under the cursor.
    pub fn capacity(&self) -> u16 {
        self.ring_end.saturating_sub(self.ring_start) / SLOT_SIZE
    }

    /// Validate all layout parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.config_slots == 0 {
            return Err("config_slots must be > 0".into());
        }
        let config_end = CONFIG_START as u32 + self.config_slots as u32;
        for (name, address) in [("count_address", self.count_address), ("cursor_address", self.cursor_address)] {
            if (address as u32) < config_end {
                return Err(format!("{} overlaps the config table", name));
            }
            if address as u32 + 1 >= self.ring_start as u32 {
                return Err(format!("{} overlaps the ring", name));
            }
        }
        if self.count_address.abs_diff(self.cursor_address) < 2 {
            return Err("count_address and cursor_address overlap".into());
        }
        if self.ring_end <= self.ring_start {
            return Err("ring_end must be > ring_start".into());
        }
        if (self.ring_end - self.ring_start) % SLOT_SIZE != 0 {
            return Err("ring must span a whole number of slots".into());
        }
        if self.ring_end as u32 + SLOT_SIZE as u32 - 1 > self.last_address as u32 {
            return Err("ring extends past the end of the device".into());
        }
        if self.transport_timeout.as_millis() == 0 {
            return Err("transport_timeout must be > 0".into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self { Self::fm25v02a() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_valid() {
        assert!(Config::fm25v02a().validate().is_ok());
        assert!(Config::compact(1).validate().is_ok());
        assert!(Config::compact(8).validate().is_ok());
    }

    #[test]
    fn test_default_capacity_matches_device() {
        assert_eq!(Config::default().capacity(), 16283);
        assert_eq!(Config::compact(5).capacity(), 5);
        assert_eq!(Config::compact(5).ring_end, RING_START + 10);
    }

    #[test]
    fn test_empty_ring_rejected() {
        assert!(Config::compact(0).validate().is_err());
    }

    #[test]
    fn test_misaligned_ring_rejected() {
        let mut config = Config::compact(4);
        config.ring_end += 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ring_past_device_rejected() {
        let mut config = Config::fm25v02a();
        config.ring_end = LAST_ADDRESS;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overlapping_metadata_rejected() {
        let mut config = Config::fm25v02a();
        config.cursor_address = config.count_address + 1;
        assert!(config.validate().is_err());

        let mut config = Config::fm25v02a();
        config.count_address = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::fm25v02a();
        config.transport_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
