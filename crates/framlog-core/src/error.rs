//! Error types for FRAM store operations
//!
//! Every failure is returned to the caller as a `FramError`. Nothing in this
//! crate retries, panics or swallows an error; retry policy belongs to the
//! surrounding system.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use crate::transport::TransportFault;

/// FRAM store error types with detailed context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramError {
    /// Operation attempted before the ring was bootstrapped
    Uninitialized,

    /// The transport reported a hard error
    TransportError,

    /// The transport was busy with another exchange
    TransportBusy,

    /// The transport did not complete within its timeout
    TransportTimeout,

    /// A field, slot or logical index is outside its accepted range
    InvalidArgument {
        /// Name of the rejected argument
        argument: &'static str,
        /// Value that was supplied
        value: u32,
        /// Smallest accepted value
        min: u32,
        /// Largest accepted value
        max: u32,
    },

    /// Read-back after a write did not match what was written
    WriteFailed {
        /// Device address of the mismatching byte
        address: u16,
        /// Byte that was written
        expected: u8,
        /// Byte that was read back
        actual: u8,
    },

    /// Lookup on an empty ring
    ZeroRecords,

    /// Region layout or medium image is inconsistent
    InvalidConfig {
        /// Description of the problem
        reason: String,
    },

    /// I/O on a medium image file failed
    Io {
        /// The file path where the error occurred
        path: Option<PathBuf>,
        /// The underlying I/O error kind
        kind: std::io::ErrorKind,
        /// Human-readable description
        message: String,
    },
}

impl fmt::Display for FramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramError::Uninitialized => write!(f, "FRAM store used before bootstrap"),

            FramError::TransportError => write!(f, "Transport error"),

            FramError::TransportBusy => write!(f, "Transport busy"),

            FramError::TransportTimeout => write!(f, "Transport timed out"),

            FramError::InvalidArgument { argument, value, min, max } => {
                write!(f, "Invalid {}: {} is outside {}..={}", argument, value, min, max)
            }

            FramError::WriteFailed { address, expected, actual } => {
                write!(f, "Write failed at 0x{:04x}: wrote 0x{:02x}, read back 0x{:02x}",
                       address, expected, actual)
            }

            FramError::ZeroRecords => write!(f, "Log ring holds no records"),

            FramError::InvalidConfig { reason } => write!(f, "Invalid configuration: {}", reason),

            FramError::Io { path, kind, message } => {
                if let Some(path) = path {
                    write!(f, "I/O error in {}: {} ({})", path.display(), message, kind)
                } else {
                    write!(f, "I/O error: {} ({})", message, kind)
                }
            }
        }
    }
}

impl Error for FramError {}

impl From<TransportFault> for FramError {
    fn from(fault: TransportFault) -> Self {
        match fault {
            TransportFault::Error => FramError::TransportError,
            TransportFault::Busy => FramError::TransportBusy,
            TransportFault::Timeout => FramError::TransportTimeout,
        }
    }
}

/// Convert std::io::Error to FramError::Io
impl From<std::io::Error> for FramError {
    fn from(err: std::io::Error) -> Self {
        FramError::Io {
            path: None,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for FRAM store operations
pub type FramResult<T> = Result<T, FramError>;
