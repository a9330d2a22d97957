//! Bit-packed 16-bit event record
//!
//! ```text
//!   MSB                                   LSB
//!   [ code: 10 bits ][ thread: 3 ][ level: 3 ]
//!
//!   hi byte: code[9..2]
//!   lo byte: code[1..0] thread[2..0] level[2..0]
//! ```
//!
//! Stored hi byte first. The codec is pure; range checks happen once in
//! `LogRecord::new`.

use crate::error::{FramError, FramResult};

/// Largest accepted level
pub const MAX_LEVEL: u8 = 7;

/// Largest accepted thread
pub const MAX_THREAD: u8 = 7;

/// Largest accepted code. The field can hold 1023, but 1023 is rejected.
pub const MAX_CODE: u16 = 1022;

const LEVEL_MASK: u8 = 0x07;
const THREAD_MASK: u8 = 0x38;
const THREAD_SHIFT: u8 = 3;
const CODE_LO_SHIFT: u8 = 6;
const CODE_FIELD_MASK: u16 = 0x03FF;

/// Pack the three fields into `[hi, lo]`. Inputs wider than their field are truncated.
pub fn encode(level: u8, thread: u8, code: u16) -> [u8; 2] {
    let code = code & CODE_FIELD_MASK;
    let hi = (code >> 2) as u8;
    let lo = ((code as u8) << CODE_LO_SHIFT)
        | ((thread << THREAD_SHIFT) & THREAD_MASK)
        | (level & LEVEL_MASK);
    [hi, lo]
}

/// Unpack `[hi, lo]` into `(level, thread, code)`. Total over all inputs.
pub fn decode(bytes: [u8; 2]) -> (u8, u8, u16) {
    let [hi, lo] = bytes;
    let code = ((hi as u16) << 2) | (lo >> CODE_LO_SHIFT) as u16;
    let thread = (lo & THREAD_MASK) >> THREAD_SHIFT;
    let level = lo & LEVEL_MASK;
    (level, thread, code)
}

/// One event: severity level, origin thread, event code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogRecord {
    level: u8,
    thread: u8,
    code: u16,
}

impl LogRecord {
    /// Validate and build a record
    pub fn new(level: u8, thread: u8, code: u16) -> FramResult<Self> {
        if level > MAX_LEVEL {
            return Err(FramError::InvalidArgument {
                argument: "level",
                value: level as u32,
                min: 0,
                max: MAX_LEVEL as u32,
            });
        }
        if thread > MAX_THREAD {
            return Err(FramError::InvalidArgument {
                argument: "thread",
                value: thread as u32,
                min: 0,
                max: MAX_THREAD as u32,
            });
        }
        if code > MAX_CODE {
            return Err(FramError::InvalidArgument {
                argument: "code",
                value: code as u32,
                min: 0,
                max: MAX_CODE as u32,
            });
        }
        Ok(Self { level, thread, code })
    }

    /// Decode a slot read from the medium. Any bit pattern is accepted,
    /// so a corrupted slot may yield code 1023.
    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        let (level, thread, code) = decode(bytes);
        Self { level, thread, code }
    }

    /// Slot bytes, hi byte first
    pub fn to_bytes(&self) -> [u8; 2] {
        encode(self.level, self.thread, self.code)
    }

    pub fn level(&self) -> u8 { self.level }

    pub fn thread(&self) -> u8 { self.thread }

    pub fn code(&self) -> u16 { self.code }
}
