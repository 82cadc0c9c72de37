//! Raw I2C adapter interface
use core::fmt;
use thiserror::Error;

/// Operating-system error code reported by an adapter (`errno` on Linux)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Errno(pub i32);

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "errno {}", self.0)
    }
}

/// Byte-stream access to an I2C adapter, shaped after the Linux `i2c-dev` interface.
///
/// An adapter is a single handle that may front several devices. The slave
/// address set by [`I2cTransport::set_slave_address`] stays in effect for
/// every following `read`/`write` until it is changed again, so callers that
/// share one adapter must re-select their device before each transfer.
///
/// `read` and `write` report how many bytes actually moved; a short count is
/// not an error at this level.
pub trait I2cTransport: Send {
    /// Bind subsequent transfers to `address`
    fn set_slave_address(&mut self, address: u16) -> Result<(), Errno>;

    /// Write `data` to the selected device
    fn write(&mut self, data: &[u8]) -> Result<usize, Errno>;

    /// Read into `buffer` from the selected device
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Errno>;
}

/// Step of a register transaction at which a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    /// Binding the adapter to the device address
    Select,
    /// Writing the register address ahead of a read
    RegisterWrite,
    /// Reading the register contents
    DataRead,
    /// Writing a register address and payload
    DataWrite,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferStage::Select => write!(f, "device select"),
            TransferStage::RegisterWrite => write!(f, "register address write"),
            TransferStage::DataRead => write!(f, "data read"),
            TransferStage::DataWrite => write!(f, "data write"),
        }
    }
}

/// Failure of a single register transaction
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The adapter returned an OS error
    #[error("{stage} failed: {errno}")]
    Os {
        stage: TransferStage,
        errno: Errno,
    },

    /// The adapter accepted the call but moved fewer bytes than required
    #[error("{stage} transferred {actual} of {expected} bytes")]
    ShortTransfer {
        stage: TransferStage,
        expected: usize,
        actual: usize,
    },

    /// The adapter was already borrowed further up the calling thread's stack
    #[error("adapter already in use on this thread")]
    Busy,
}

impl BusError {
    /// Stage the transaction failed at
    pub fn stage(&self) -> TransferStage {
        match self {
            BusError::Os { stage, .. } | BusError::ShortTransfer { stage, .. } => *stage,
            BusError::Busy => TransferStage::Select,
        }
    }

    /// OS error code, if the adapter reported one
    pub fn errno(&self) -> Option<i32> {
        match self {
            BusError::Os { errno, .. } => Some(errno.0),
            BusError::ShortTransfer { .. } | BusError::Busy => None,
        }
    }
}
