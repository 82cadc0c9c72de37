//! Integer status codes for callers ported from the C-style register API.
//!
//! Reads return the value widened to `i32`, or `-1` on any bus failure.
//! Writes return `1` on success and `-1` on failure. The failure itself is
//! still logged by the bus layer with its OS error code.

use crate::bus::RegisterAccess;

/// Returned by every call when the transaction fails
pub const BUS_FAILURE: i32 = -1;

/// Returned by `write8` when the transaction succeeds
pub const WRITE_OK: i32 = 1;

/// Sentinel-returning register calls, available on every [`RegisterAccess`]
pub trait LegacyRegisters {
    /// Byte at `register`, or `-1`
    fn read8(&mut self, register: u8) -> i32;

    /// Big-endian word at `register`, or `-1`
    fn read16(&mut self, register: u8) -> i32;

    /// `1` if `value` was written to `register`, otherwise `-1`
    fn write8(&mut self, register: u8, value: u8) -> i32;
}

impl<R: RegisterAccess + ?Sized> LegacyRegisters for R {
    fn read8(&mut self, register: u8) -> i32 {
        self.read_byte(register).map_or(BUS_FAILURE, i32::from)
    }

    fn read16(&mut self, register: u8) -> i32 {
        self.read_word(register).map_or(BUS_FAILURE, i32::from)
    }

    fn write8(&mut self, register: u8, value: u8) -> i32 {
        match self.write_byte(register, value) {
            Ok(()) => WRITE_OK,
            Err(_) => BUS_FAILURE,
        }
    }
}
