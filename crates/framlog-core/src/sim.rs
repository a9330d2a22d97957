//! Simulated FM25V02A on the far side of a `Transport`
//!
//! `SimulatedFram` interprets command frames the way the chip does: bytes
//! accumulate between select and deselect, reads are answered during the
//! receive phase, and WRITE/WRSR/WREN/WRDI/SLEEP take effect when chip select
//! is released. The memory array lives behind a `MediumHandle` so a test can
//! inspect or tamper with it while a `FramStore` owns the transport, and can
//! attach a fresh transport to the same array to emulate a reboot.
//!
//! Fault injection covers the failure modes the store must survive:
//! - stuck cells: reads return a fixed value, writes are dropped
//! - link faults: after N successful transmit/receive calls every call fails
//!   until cleared, and the frame in flight is discarded

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hashbrown::HashMap;
use parking_lot::Mutex;
use tracing::error;

use crate::error::FramResult;
use crate::format::{
    frame_address, Opcode, DEVICE_SIZE, ERASE_VALUE, FM25V02A_DEVICE_ID, LAST_ADDRESS,
    STATUS_BP0, STATUS_BP1, STATUS_WEL, STATUS_WRITABLE,
};
use crate::image::ImageFile;
use crate::transport::{Transport, TransportFault};

/// Device state shared by every transport attached to one array
struct Medium {
    cells: Vec<u8>,
    /// Writable status bits only; WEL is derived from `latch`
    status: u8,
    latch: bool,
    asleep: bool,
    stuck: HashMap<u16, u8>,
    /// Successful link operations left before `fault` fires
    fault: Option<(u64, TransportFault)>,
    write_commands: u64,
    image: Option<ImageFile>,
}

fn wrap(address: usize) -> usize {
    address & LAST_ADDRESS as usize
}

impl Medium {
    fn new(cells: Vec<u8>, image: Option<ImageFile>) -> Self {
        Self {
            cells,
            status: 0,
            latch: false,
            asleep: false,
            stuck: HashMap::new(),
            fault: None,
            write_commands: 0,
            image,
        }
    }

    fn cell(&self, address: usize) -> u8 {
        let address = wrap(address);
        self.stuck.get(&(address as u16)).copied().unwrap_or(self.cells[address])
    }

    fn status_register(&self) -> u8 {
        self.status | if self.latch { STATUS_WEL } else { 0 }
    }

    /// First address covered by block protection
    fn protected_from(&self) -> usize {
        match self.status & (STATUS_BP0 | STATUS_BP1) {
            0 => DEVICE_SIZE,
            STATUS_BP0 => DEVICE_SIZE - DEVICE_SIZE / 4,
            STATUS_BP1 => DEVICE_SIZE / 2,
            _ => 0,
        }
    }

    fn tick(&mut self) -> Result<(), TransportFault> {
        match &mut self.fault {
            Some((0, fault)) => Err(*fault),
            Some((remaining, _)) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Fill `buf` for the receive phase of `frame`, `offset` bytes in
    fn answer(&self, frame: &[u8], offset: usize, buf: &mut [u8]) {
        let opcode = frame.first().copied().and_then(Opcode::from_byte);
        let data_start = match opcode {
            Some(Opcode::Read) => 3,
            Some(Opcode::FastRead) => 4,
            Some(Opcode::ReadStatus) => {
                buf.fill(self.status_register());
                return;
            }
            Some(Opcode::ReadDeviceId) => {
                for (i, byte) in buf.iter_mut().enumerate() {
                    *byte = FM25V02A_DEVICE_ID.get(offset + i).copied().unwrap_or(0);
                }
                return;
            }
            _ => {
                buf.fill(0xFF);
                return;
            }
        };

        match frame_address(frame) {
            Some(address) if frame.len() >= data_start => {
                for (i, byte) in buf.iter_mut().enumerate() {
                    *byte = self.cell(address as usize + offset + i);
                }
            }
            _ => buf.fill(0xFF),
        }
    }

    /// Apply a frame whose chip select was released without a link fault
    fn finish(&mut self, frame: &[u8]) {
        match frame.first().copied().and_then(Opcode::from_byte) {
            Some(Opcode::WriteEnable) => self.latch = true,
            Some(Opcode::WriteDisable) => self.latch = false,
            Some(Opcode::Write) if self.latch => {
                if let Some(address) = frame_address(frame) {
                    self.apply_write(address as usize, &frame[3..]);
                }
            }
            Some(Opcode::WriteStatus) if self.latch => {
                if let Some(&value) = frame.get(1) {
                    self.status = value & STATUS_WRITABLE;
                    self.latch = false;
                }
            }
            Some(Opcode::Sleep) => self.asleep = true,
            _ => {}
        }
    }

    fn apply_write(&mut self, address: usize, data: &[u8]) {
        let protected_from = self.protected_from();
        for (i, &byte) in data.iter().enumerate() {
            let target = wrap(address + i);
            if target >= protected_from || self.stuck.contains_key(&(target as u16)) {
                continue;
            }
            self.cells[target] = byte;
        }
        self.latch = false;
        self.write_commands += 1;
        self.write_through(address, data.len());
    }

    /// Mirror `len` cells from `address` into the image, if one is attached
    fn write_through(&mut self, address: usize, len: usize) {
        let Some(image) = self.image.as_mut() else { return };
        let start = wrap(address);
        let len = len.min(DEVICE_SIZE);
        let head = len.min(DEVICE_SIZE - start);

        let mut result = image.persist(start, &self.cells[start..start + head]);
        if result.is_ok() && head < len {
            result = image.persist(0, &self.cells[..len - head]);
        }
        if let Err(e) = result {
            error!(path = %image.path().display(), error = %e, "medium image write failed");
            self.fault = Some((0, TransportFault::Error));
        }
    }
}

/// In-memory FRAM device implementing `Transport`
pub struct SimulatedFram {
    medium: Arc<Mutex<Medium>>,
    frame: Vec<u8>,
    /// Bytes already clocked out in this frame's receive phase
    answered: usize,
    /// A link fault hit this frame; it is dropped on deselect
    aborted: bool,
}

impl SimulatedFram {
    /// Device with every cell at the erase value
    pub fn new() -> Self {
        Self::filled(ERASE_VALUE)
    }

    /// Device with every cell set to `value`
    pub fn filled(value: u8) -> Self {
        Self::attach(Arc::new(Mutex::new(Medium::new(vec![value; DEVICE_SIZE], None))))
    }

    /// Device backed by the image file at `path`, created with `fill` if absent
    pub fn open_image(path: &Path, fill: u8) -> FramResult<Self> {
        let (image, cells) = ImageFile::open(path, DEVICE_SIZE, fill)?;
        Ok(Self::attach(Arc::new(Mutex::new(Medium::new(cells, Some(image))))))
    }

    fn attach(medium: Arc<Mutex<Medium>>) -> Self {
        Self { medium, frame: Vec::new(), answered: 0, aborted: false }
    }

    /// Handle onto this device's memory array
    pub fn handle(&self) -> MediumHandle {
        MediumHandle { medium: Arc::clone(&self.medium) }
    }
}

impl Default for SimulatedFram {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SimulatedFram {
    fn select(&mut self) {
        self.frame.clear();
        self.answered = 0;
        self.aborted = false;
        self.medium.lock().asleep = false;
    }

    fn deselect(&mut self) {
        let frame = std::mem::take(&mut self.frame);
        if !self.aborted {
            self.medium.lock().finish(&frame);
        }
        self.answered = 0;
        self.aborted = false;
    }

    fn transmit(&mut self, bytes: &[u8], _timeout: Duration) -> Result<(), TransportFault> {
        let mut medium = self.medium.lock();
        if let Err(fault) = medium.tick() {
            self.aborted = true;
            return Err(fault);
        }
        self.frame.extend_from_slice(bytes);
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<(), TransportFault> {
        let mut medium = self.medium.lock();
        if let Err(fault) = medium.tick() {
            self.aborted = true;
            return Err(fault);
        }
        medium.answer(&self.frame, self.answered, buf);
        self.answered += buf.len();
        Ok(())
    }
}

/// Shared view of a simulated memory array
#[derive(Clone)]
pub struct MediumHandle {
    medium: Arc<Mutex<Medium>>,
}

impl MediumHandle {
    /// A new transport on the same array
    pub fn transport(&self) -> SimulatedFram {
        SimulatedFram::attach(Arc::clone(&self.medium))
    }

    /// Emulate a supply drop: clear the link fault, the write latch and sleep
    pub fn power_cycle(&self) {
        let mut medium = self.medium.lock();
        medium.fault = None;
        medium.latch = false;
        medium.asleep = false;
    }

    /// Byte as the device would report it
    pub fn peek(&self, address: u16) -> u8 {
        self.medium.lock().cell(address as usize)
    }

    pub fn peek_u16(&self, address: u16) -> u16 {
        let medium = self.medium.lock();
        u16::from_be_bytes([medium.cell(address as usize), medium.cell(address as usize + 1)])
    }

    /// Set a cell directly, bypassing the command interface
    pub fn poke(&self, address: u16, value: u8) {
        let mut medium = self.medium.lock();
        let target = wrap(address as usize);
        medium.cells[target] = value;
        medium.write_through(target, 1);
    }

    pub fn poke_u16(&self, address: u16, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.poke(address, hi);
        self.poke(address.wrapping_add(1), lo);
    }

    /// Set every cell to `value`
    pub fn fill(&self, value: u8) {
        let mut medium = self.medium.lock();
        medium.cells.fill(value);
        medium.write_through(0, DEVICE_SIZE);
    }

    /// Pin `address` to `value`: reads return it, writes are dropped
    pub fn stick(&self, address: u16, value: u8) {
        self.medium.lock().stuck.insert(wrap(address as usize) as u16, value);
    }

    pub fn unstick(&self, address: u16) {
        self.medium.lock().stuck.remove(&(wrap(address as usize) as u16));
    }

    /// Let `ops` more transmit/receive calls succeed, then fail every call with `fault`
    pub fn fail_after(&self, ops: u64, fault: TransportFault) {
        self.medium.lock().fault = Some((ops, fault));
    }

    pub fn clear_faults(&self) {
        self.medium.lock().fault = None;
    }

    /// WRITE frames the device has applied
    pub fn write_commands(&self) -> u64 {
        self.medium.lock().write_commands
    }

    pub fn write_latch(&self) -> bool {
        self.medium.lock().latch
    }

    /// Status register including WEL
    pub fn status(&self) -> u8 {
        self.medium.lock().status_register()
    }

    pub fn asleep(&self) -> bool {
        self.medium.lock().asleep
    }

    /// Copy of the whole array, stuck cells as reported
    pub fn bytes(&self) -> Vec<u8> {
        let medium = self.medium.lock();
        (0..DEVICE_SIZE).map(|address| medium.cell(address)).collect()
    }
}
