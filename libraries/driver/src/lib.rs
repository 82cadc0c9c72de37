//! Drivers for barometric pressure sensors on a shared Linux I2C bus.
//!
//! The crate is split into two layers:
//!
//! - [`bus`]: serialized register transactions over an adapter shared by
//!   several devices. Every transaction takes the bus lock, re-selects its
//!   device and releases the lock before returning.
//! - [`baro`]: sensor engines that read factory calibration once and turn raw
//!   ADC counts into temperature, pressure and altitude.
//!
//! ```ignore
//! use driver::baro::Bmp085;
//! use driver::bus::SharedBus;
//! use driver::delay::ThreadDelay;
//!
//! let bus = SharedBus::new(rppal::i2c::I2c::with_bus(1)?);
//! let mut baro = Bmp085::new(bus.device(driver::baro::BMP085_I2C_ADDR), ThreadDelay);
//! baro.init()?;
//! println!("{} Pa", baro.read_pressure()?);
//! ```

pub mod baro;
pub mod bus;
pub mod compat;
pub mod delay;
mod error;
#[cfg(feature = "linux")]
pub mod linux;

#[cfg(test)]
pub(crate) mod mock;

pub use error::{Error, Result};
