//! FramLog Core: power-loss tolerant event log for SPI FRAM
//!
//! A fixed-capacity ring of 16-bit event records plus a small table of
//! configuration bytes, stored on an FM25V02A-class ferroelectric RAM behind
//! a byte-oriented serial transport.
//!
//! # Architecture
//!
//! - **Transport**: the caller's SPI binding, one chip-select window per frame
//! - **Write gate**: WREN before and WRDI after every mutating frame
//! - **Commit**: every persisted byte is read back; a mismatch is an error
//! - **Ring**: payload, then count, then cursor; the in-memory cache only
//!   follows what reached the medium
//! - **Bootstrap**: out-of-range count or cursor on the medium is repaired
//!   before first use
//!
//! # Host testing
//!
//! `sim::SimulatedFram` interprets the command set over an in-memory array,
//! optionally backed by an image file, with stuck-cell and link-fault
//! injection.

pub mod bootstrap;
pub mod bus;
mod commit;
pub mod config;
pub mod config_table;
pub mod device;
pub mod engine;
pub mod error;
pub mod format;
mod gate;
pub mod image;
pub mod platform_durability;
pub mod record;
pub mod ring;
pub mod shared;
pub mod sim;
pub mod transport;
pub mod traversal;

// Re-export key types for convenience
pub use config::Config;
pub use engine::FramStore;
pub use error::{FramError, FramResult};
pub use record::LogRecord;
pub use shared::SharedStore;
pub use sim::{MediumHandle, SimulatedFram};
pub use transport::{Transport, TransportFault};
pub use traversal::Records;
