//! On-medium layout and command framing for FM25V02A-class SPI FRAM
//!
//! Every command frame starts with a one-byte opcode. Memory commands follow it
//! with a big-endian 16-bit address, then either data bytes (WRITE) or a
//! receive phase (READ, FSTRD after one dummy byte).
//!
//! Default memory map (32 KiB device):
//!
//! ```text
//!   [0x0000..=0x0063]  config table, 100 single-byte slots
//!   [0x0064..=0x00C7]  metadata
//!       0x0064..=0x0065  record count, big-endian u16
//!       0x0066..=0x0067  write cursor, big-endian u16
//!       0x0068..=0x00C7  reserved
//!   [0x00C8..=0x7FFF]  event ring, 2-byte slots at 0x00C8, 0x00CA, .. 0x7FFE
//! ```

/// Highest byte address of the default device
pub const LAST_ADDRESS: u16 = 0x7FFF;

/// Total device size in bytes
pub const DEVICE_SIZE: usize = LAST_ADDRESS as usize + 1;

/// First config table byte
pub const CONFIG_START: u16 = 0x0000;

/// Number of config table slots
pub const CONFIG_SLOTS: u16 = 100;

/// Location of the record count (hi byte, then lo byte)
pub const COUNT_ADDRESS: u16 = 0x0064;

/// Location of the write cursor (hi byte, then lo byte)
pub const CURSOR_ADDRESS: u16 = 0x0066;

/// First ring slot
pub const RING_START: u16 = 0x00C8;

/// Last ring slot (occupies 0x7FFE and 0x7FFF)
pub const RING_END: u16 = 0x7FFE;

/// Bytes per ring slot
pub const SLOT_SIZE: u16 = 2;

/// Records retained by the default ring, decimal 16,283
pub const CAPACITY: u16 = (RING_END - RING_START) / SLOT_SIZE;

/// Value of every byte after a factory reset
pub const ERASE_VALUE: u8 = 0x00;

/// Length of the RDID response
pub const DEVICE_ID_LEN: usize = 9;

/// RDID response of an FM25V02A: manufacturer 7F7F7F7F7F7FC2, family 001,
/// density 00010, sub 00, rev 001
pub const FM25V02A_DEVICE_ID: [u8; DEVICE_ID_LEN] =
    [0x7F, 0x7F, 0x7F, 0x7F, 0x7F, 0x7F, 0xC2, 0x22, 0x08];

/// Status register: write enable latch (read-only)
pub const STATUS_WEL: u8 = 0x02;
/// Status register: block protect bit 0
pub const STATUS_BP0: u8 = 0x04;
/// Status register: block protect bit 1
pub const STATUS_BP1: u8 = 0x08;
/// Status register: write-protect pin enable
pub const STATUS_WPEN: u8 = 0x80;
/// Bits that WRSR can change
pub const STATUS_WRITABLE: u8 = STATUS_BP0 | STATUS_BP1 | STATUS_WPEN;

/// Device command set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Set the write enable latch
    WriteEnable = 0x06,
    /// Reset the write enable latch
    WriteDisable = 0x04,
    /// Read the status register
    ReadStatus = 0x05,
    /// Write the status register
    WriteStatus = 0x01,
    /// Read memory
    Read = 0x03,
    /// Read memory with one dummy byte after the address
    FastRead = 0x0B,
    /// Write memory
    Write = 0x02,
    /// Enter sleep mode
    Sleep = 0xB9,
    /// Read the 9-byte device id
    ReadDeviceId = 0x9F,
}

impl Opcode {
    /// Parse an opcode byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x06 => Some(Opcode::WriteEnable),
            0x04 => Some(Opcode::WriteDisable),
            0x05 => Some(Opcode::ReadStatus),
            0x01 => Some(Opcode::WriteStatus),
            0x03 => Some(Opcode::Read),
            0x0B => Some(Opcode::FastRead),
            0x02 => Some(Opcode::Write),
            0xB9 => Some(Opcode::Sleep),
            0x9F => Some(Opcode::ReadDeviceId),
            _ => None,
        }
    }
}

/// Build an opcode + address frame
///
/// Layout:
///   [0]  opcode
///   [1]  address hi byte
///   [2]  address lo byte
pub fn address_frame(opcode: Opcode, address: u16) -> [u8; 3] {
    let [hi, lo] = address.to_be_bytes();
    [opcode as u8, hi, lo]
}

/// Build a WRITE frame carrying `data` for consecutive addresses from `address`
pub fn write_frame(address: u16, data: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(3 + data.len());
    frame.extend_from_slice(&address_frame(Opcode::Write, address));
    frame.extend_from_slice(data);
    frame
}

/// Parse the big-endian address that follows the opcode, if the frame has one
pub fn frame_address(frame: &[u8]) -> Option<u16> {
    match frame {
        [_, hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
    }
}
