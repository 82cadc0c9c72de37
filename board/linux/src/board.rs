use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use driver::baro::{Bmp085, Bmp085Config, Oversampling, BMP085_I2C_ADDR};
use driver::bus::{I2cDevice, SharedBus};
use driver::delay::ThreadDelay;
use rppal::i2c::I2c;

pub type Barometer = Bmp085<I2cDevice<I2c>, ThreadDelay>;

/// Runtime settings, read from `BARO_*` environment variables
#[derive(Debug, Clone, Copy)]
pub struct BoardConfig {
    pub i2c_bus: u8,
    pub interval: Duration,
    /// Readings to take before exiting; 0 runs forever
    pub samples: u64,
    pub sensor: Bmp085Config,
}

impl BoardConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let level: u8 = env_or("BARO_OVERSAMPLING", 3)?;
        let sensor = Bmp085Config {
            oversampling: Oversampling::from_level(level),
            sea_level_pressure_pa: env_or("BARO_SEA_LEVEL_PA", hal::STD_SEA_LEVEL_PRESSURE_PA)?,
            ..Bmp085Config::default()
        };
        Ok(Self {
            i2c_bus: env_or("BARO_I2C_BUS", 1)?,
            interval: Duration::from_millis(env_or("BARO_INTERVAL_MS", 1000)?),
            samples: env_or("BARO_SAMPLES", 0)?,
            sensor,
        })
    }
}

fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("invalid {name}: {value:?}")),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("cannot read {name}")),
    }
}

pub struct LinuxBoard {
    bus: SharedBus<I2c>,
    bus_number: u8,
}

impl LinuxBoard {
    pub fn open(bus_number: u8) -> anyhow::Result<Self> {
        let bus = driver::linux::open_bus(bus_number)
            .with_context(|| format!("failed to open /dev/i2c-{bus_number}"))?;
        Ok(LinuxBoard { bus, bus_number })
    }

    pub fn get_name(&self) -> &str {
        "Linux"
    }

    pub fn bus_number(&self) -> u8 {
        self.bus_number
    }

    /// BMP085 at its fixed address, sharing this board's bus
    pub fn barometer(&self, config: Bmp085Config) -> Barometer {
        Bmp085::new_with_config(self.bus.device(BMP085_I2C_ADDR), ThreadDelay, config)
    }
}
