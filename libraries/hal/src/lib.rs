#![no_std]

mod baro;
mod i2c;

pub use baro::*;
pub use i2c::*;
