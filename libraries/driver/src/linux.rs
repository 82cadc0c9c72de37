//! `/dev/i2c-N` adapters through `rppal`.

use hal::{Errno, I2cTransport};
use rppal::i2c::{self, I2c};

use crate::bus::SharedBus;

const EINVAL: i32 = 22;

fn errno(err: i2c::Error) -> Errno {
    match err {
        i2c::Error::Io(io) => Errno(io.raw_os_error().unwrap_or(EINVAL)),
        _ => Errno(EINVAL),
    }
}

impl I2cTransport for I2c {
    fn set_slave_address(&mut self, address: u16) -> Result<(), Errno> {
        I2c::set_slave_address(self, address).map_err(errno)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Errno> {
        I2c::write(self, data).map_err(errno)
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Errno> {
        I2c::read(self, buffer).map_err(errno)
    }
}

/// Open `/dev/i2c-{bus}` and wrap it for sharing between devices
pub fn open_bus(bus: u8) -> Result<SharedBus<I2c>, i2c::Error> {
    let adapter = I2c::with_bus(bus)?;
    log::debug!(
        "opened i2c bus {} at {} Hz",
        adapter.bus(),
        adapter.clock_speed().unwrap_or_default()
    );
    Ok(SharedBus::new(adapter))
}
