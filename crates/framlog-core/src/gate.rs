//! Write-enable gate
//!
//! The device clears its write enable latch after every WRITE or WRSR frame,
//! so each mutating frame must be preceded by its own WREN. Centralising the
//! WREN/WRDI bracket here keeps every call site from re-implementing it.

use crate::bus::Bus;
use crate::error::FramResult;
use crate::format::Opcode;
use crate::transport::Transport;

impl<T: Transport> Bus<T> {
    /// Run `action` with the write enable latch set.
    ///
    /// Sequence:
    /// 1. WREN: on failure, return without running `action`
    /// 2. `action`: one or more frames with exclusive use of the bus
    /// 3. WRDI: always sent, whatever `action` returned
    ///
    /// The action's error wins over a WRDI error.
    pub fn with_write_enabled<R, F>(&mut self, action: F) -> FramResult<R>
    where
        F: FnOnce(&mut Self) -> FramResult<R>,
    {
        self.command(Opcode::WriteEnable)?;
        let result = action(self);
        let disabled = self.command(Opcode::WriteDisable);
        let value = result?;
        disabled?;
        Ok(value)
    }
}
