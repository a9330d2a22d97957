//! Flat table of single-byte configuration slots at the bottom of the device

use crate::engine::FramStore;
use crate::error::{FramError, FramResult};
use crate::format::CONFIG_START;
use crate::transport::Transport;

impl<T: Transport> FramStore<T> {
    fn config_slot_address(&self, slot: u16) -> FramResult<u16> {
        self.state()?;
        let slots = self.config().config_slots;
        if slot >= slots {
            return Err(FramError::InvalidArgument {
                argument: "config slot",
                value: slot as u32,
                min: 0,
                max: slots as u32 - 1,
            });
        }
        Ok(CONFIG_START + slot)
    }

    /// Store `value` in config `slot`, verified
    pub fn write_config(&mut self, slot: u16, value: u8) -> FramResult<()> {
        let address = self.config_slot_address(slot)?;
        self.bus.write_and_verify(address, &[value])
    }

    pub fn read_config(&mut self, slot: u16) -> FramResult<u8> {
        let address = self.config_slot_address(slot)?;
        let mut value = [0u8; 1];
        self.bus.read(address, &mut value)?;
        Ok(value[0])
    }

    /// Every config slot in one READ
    pub fn read_config_table(&mut self) -> FramResult<Vec<u8>> {
        self.state()?;
        let mut table = vec![0u8; self.config().config_slots as usize];
        self.bus.read(CONFIG_START, &mut table)?;
        Ok(table)
    }
}
