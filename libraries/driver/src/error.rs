use hal::BusError;
use thiserror::Error;

/// Result alias used across the driver crate
pub type Result<T> = core::result::Result<T, Error>;

/// Primary error type for the sensor drivers
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A register transaction failed on the bus
    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    /// The identity register did not hold the expected chip id
    #[error("unexpected chip id 0x{found:02x} (expected 0x{expected:02x})")]
    ChipId {
        /// Value read from the identity register
        found: u8,
        /// Value the driver expects
        expected: u8,
    },

    /// A measurement was requested before calibration was loaded
    #[error("sensor not initialized")]
    NotInitialized,

    /// A calibration coefficient held a value the chip never programs
    #[error("invalid calibration coefficient {name} = 0x{raw:04x}")]
    InvalidCalibration {
        /// Datasheet name of the coefficient
        name: &'static str,
        /// Raw register word
        raw: u16,
    },

    /// A compensation step would divide by zero
    #[error("compensation term {term} is zero")]
    DivisionByZero {
        /// Datasheet name of the divisor term
        term: &'static str,
    },
}
