use embedded_hal::delay::DelayNs;
use hal::{BaroSensor, STD_SEA_LEVEL_PRESSURE_PA};
use heapless::Vec;
use log::{debug, error, info, trace, warn};

use super::baseline_altitude;
use super::compensation::{self, Calibration, Oversampling};
use crate::bus::RegisterAccess;
use crate::{Error, Result};

// BMP085/BMP180 I2C address (fixed)
pub const BMP085_I2C_ADDR: u8 = 0x77;

// Register addresses
pub const BMP085_REG_CHIP_ID: u8 = 0xD0;
pub const BMP085_REG_CAL_AC1: u8 = 0xAA;
pub const BMP085_REG_CAL_AC2: u8 = 0xAC;
pub const BMP085_REG_CAL_AC3: u8 = 0xAE;
pub const BMP085_REG_CAL_AC4: u8 = 0xB0;
pub const BMP085_REG_CAL_AC5: u8 = 0xB2;
pub const BMP085_REG_CAL_AC6: u8 = 0xB4;
pub const BMP085_REG_CAL_B1: u8 = 0xB6;
pub const BMP085_REG_CAL_B2: u8 = 0xB8;
pub const BMP085_REG_CAL_MB: u8 = 0xBA;
pub const BMP085_REG_CAL_MC: u8 = 0xBC;
pub const BMP085_REG_CAL_MD: u8 = 0xBE;
pub const BMP085_REG_CONTROL: u8 = 0xF4;
pub const BMP085_REG_RESULT: u8 = 0xF6;

// Chip ID for verification
pub const BMP085_CHIP_ID: u8 = 0x55;

// Control register commands
pub const BMP085_CMD_READ_TEMP: u8 = 0x2E;
pub const BMP085_CMD_READ_PRESSURE: u8 = 0x34;

// Temperature conversion time in milliseconds
pub const BMP085_TEMP_CONVERSION_MS: u32 = 5;

/// Number of altitude samples taken at startup to fix the baseline
pub const DEFAULT_STARTUP_SAMPLES: usize = 50;
/// Upper bound on startup samples
pub const MAX_STARTUP_SAMPLES: usize = 64;

const CALIBRATION_REGISTERS: [u8; 11] = [
    BMP085_REG_CAL_AC1,
    BMP085_REG_CAL_AC2,
    BMP085_REG_CAL_AC3,
    BMP085_REG_CAL_AC4,
    BMP085_REG_CAL_AC5,
    BMP085_REG_CAL_AC6,
    BMP085_REG_CAL_B1,
    BMP085_REG_CAL_B2,
    BMP085_REG_CAL_MB,
    BMP085_REG_CAL_MC,
    BMP085_REG_CAL_MD,
];

/// Configuration for BMP085 sensor
#[derive(Debug, Clone, Copy)]
pub struct Bmp085Config {
    /// Pressure oversampling mode
    pub oversampling: Oversampling,

    /// Altitude samples taken at startup; the baseline is picked from these
    pub startup_samples: usize,

    /// Sea-level reference used by `read_altitude`, in Pascals
    pub sea_level_pressure_pa: f32,
}

impl Default for Bmp085Config {
    fn default() -> Self {
        Self {
            oversampling: Oversampling::UltraHighRes,
            startup_samples: DEFAULT_STARTUP_SAMPLES,
            sea_level_pressure_pa: STD_SEA_LEVEL_PRESSURE_PA,
        }
    }
}

/// BMP085/BMP180 pressure and temperature sensor.
///
/// The driver starts out uninitialized. [`Bmp085::init`] checks the chip id,
/// loads the factory calibration and takes the startup altitude samples;
/// until it succeeds every measurement returns [`Error::NotInitialized`].
///
/// Each measurement issues a conversion command, blocks for the conversion
/// time, then reads the result. Command and read are separate bus
/// transactions, so other devices on the bus may be served in between.
/// Hold [`SharedBus::lock`](crate::bus::SharedBus::lock) around the call to
/// keep them out.
pub struct Bmp085<R: RegisterAccess, D: DelayNs> {
    config: Bmp085Config,
    device: R,
    delay: D,
    calibration: Option<Calibration>,
    baseline_altitude: Option<f32>,
}

impl<R: RegisterAccess, D: DelayNs> Bmp085<R, D> {
    /// Create a new driver with the default configuration
    pub fn new(device: R, delay: D) -> Self {
        Self::new_with_config(device, delay, Bmp085Config::default())
    }

    /// Create a new driver with custom configuration
    pub fn new_with_config(device: R, delay: D, config: Bmp085Config) -> Self {
        Self {
            config,
            device,
            delay,
            calibration: None,
            baseline_altitude: None,
        }
    }

    /// Initialize with the configured oversampling mode
    pub fn init(&mut self) -> Result<()> {
        self.calibration = None;
        self.baseline_altitude = None;

        let chip_id = self.device.read_byte(BMP085_REG_CHIP_ID)?;
        if chip_id != BMP085_CHIP_ID {
            warn!("BMP085 chip id mismatch: 0x{:02x}", chip_id);
            return Err(Error::ChipId {
                found: chip_id,
                expected: BMP085_CHIP_ID,
            });
        }

        let calibration = self.read_calibration()?;
        debug!("BMP085 calibration: {:?}", calibration);
        self.calibration = Some(calibration);

        match self.sample_baseline() {
            Ok(baseline) => {
                info!("baseline altitude set to {:.2} m", baseline);
                self.baseline_altitude = Some(baseline);
                Ok(())
            }
            Err(err) => {
                error!("BMP085 startup sampling failed: {}", err);
                self.calibration = None;
                Err(err)
            }
        }
    }

    /// Initialize with the given oversampling mode
    pub fn init_with_mode(&mut self, mode: Oversampling) -> Result<()> {
        self.config.oversampling = mode;
        self.init()
    }

    /// Initialize with a numeric oversampling level, clamped to 0..=3
    pub fn init_with_level(&mut self, level: u8) -> Result<()> {
        self.init_with_mode(Oversampling::from_level(level))
    }

    /// Whether calibration has been loaded
    pub fn is_ready(&self) -> bool {
        self.calibration.is_some()
    }

    /// Loaded calibration coefficients
    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Active oversampling mode
    pub fn oversampling(&self) -> Oversampling {
        self.config.oversampling
    }

    /// Current configuration
    pub fn config(&self) -> &Bmp085Config {
        &self.config
    }

    /// Altitude fixed at startup, in meters relative to the configured sea-level pressure
    pub fn baseline_altitude(&self) -> Option<f32> {
        self.baseline_altitude
    }

    /// Give back the bus device and delay
    pub fn release(self) -> (R, D) {
        (self.device, self.delay)
    }

    /// Start a temperature conversion and read the 16-bit result
    pub fn read_raw_temperature(&mut self) -> Result<u16> {
        self.ready()?;
        self.device.write_byte(BMP085_REG_CONTROL, BMP085_CMD_READ_TEMP)?;
        self.delay.delay_ms(BMP085_TEMP_CONVERSION_MS);
        let raw = self.device.read_word(BMP085_REG_RESULT)?;
        trace!("raw temperature {}", raw);
        Ok(raw)
    }

    /// Start a pressure conversion and read the up-to-19-bit result
    pub fn read_raw_pressure(&mut self) -> Result<u32> {
        self.ready()?;
        let oss = self.config.oversampling.level();
        self.device
            .write_byte(BMP085_REG_CONTROL, BMP085_CMD_READ_PRESSURE + (oss << 6))?;
        self.delay.delay_ms(self.config.oversampling.conversion_time_ms());

        let msb = self.device.read_word(BMP085_REG_RESULT)?;
        let xlsb = self.device.read_byte(BMP085_REG_RESULT + 2)?;
        // bits below the selected resolution are not significant
        let raw = ((u32::from(msb) << 8) | u32::from(xlsb)) >> (8 - u32::from(oss));
        trace!("raw pressure {}", raw);
        Ok(raw)
    }

    /// Temperature in degrees Celsius, to 0.1 degree
    pub fn read_temperature(&mut self) -> Result<f32> {
        let calibration = self.ready()?;
        let ut = self.read_raw_temperature()?;
        calibration.temperature(ut)
    }

    /// Pressure in Pascals
    pub fn read_pressure(&mut self) -> Result<i32> {
        let calibration = self.ready()?;
        let ut = self.read_raw_temperature()?;
        let up = self.read_raw_pressure()?;
        calibration.pressure(ut, up, self.config.oversampling)
    }

    /// Temperature and pressure from one temperature conversion
    pub fn read_temperature_and_pressure(&mut self) -> Result<(f32, i32)> {
        let calibration = self.ready()?;
        let ut = self.read_raw_temperature()?;
        let up = self.read_raw_pressure()?;
        Ok((
            calibration.temperature(ut)?,
            calibration.pressure(ut, up, self.config.oversampling)?,
        ))
    }

    /// Pressure reduced to sea level, given the altitude of the sensor in meters
    pub fn read_sealevel_pressure(&mut self, altitude_m: f32) -> Result<i32> {
        let pressure = self.read_pressure()?;
        Ok(compensation::sea_level_pressure(pressure, altitude_m))
    }

    /// Altitude in meters relative to the configured sea-level pressure
    pub fn read_altitude(&mut self) -> Result<f32> {
        self.read_altitude_with(self.config.sea_level_pressure_pa)
    }

    /// Altitude in meters relative to `sea_level_pa`
    pub fn read_altitude_with(&mut self, sea_level_pa: f32) -> Result<f32> {
        let pressure = self.read_pressure()?;
        Ok(compensation::altitude(pressure, sea_level_pa))
    }

    /// Altitude in meters above the startup baseline
    pub fn read_relative_altitude(&mut self) -> Result<f32> {
        let baseline = self.baseline_altitude.ok_or(Error::NotInitialized)?;
        Ok(self.read_altitude()? - baseline)
    }

    fn ready(&self) -> Result<Calibration> {
        self.calibration.ok_or(Error::NotInitialized)
    }

    fn read_calibration(&mut self) -> Result<Calibration> {
        let mut words = [0u16; 11];
        for (word, register) in words.iter_mut().zip(CALIBRATION_REGISTERS) {
            *word = self.device.read_word(register)?;
        }
        Calibration::from_words(words)
    }

    fn sample_baseline(&mut self) -> Result<f32> {
        let count = self.config.startup_samples.clamp(1, MAX_STARTUP_SAMPLES);
        let mut samples = (0..count)
            .map(|_| self.read_altitude())
            .collect::<Result<Vec<f32, MAX_STARTUP_SAMPLES>>>()?;
        baseline_altitude(&mut samples).ok_or(Error::NotInitialized)
    }
}

impl<R: RegisterAccess, D: DelayNs> BaroSensor for Bmp085<R, D> {
    type Error = Error;

    fn init(&mut self) -> bool {
        self.init().is_ok()
    }

    fn read_temperature(&mut self) -> Result<f32> {
        self.read_temperature()
    }

    fn read_pressure(&mut self) -> Result<i32> {
        self.read_pressure()
    }

    fn read_sealevel_pressure(&mut self, altitude_m: f32) -> Result<i32> {
        self.read_sealevel_pressure(altitude_m)
    }

    fn read_altitude(&mut self, sea_level_pa: f32) -> Result<f32> {
        self.read_altitude_with(sea_level_pa)
    }

    fn chip_name(&self) -> &'static str {
        "BMP085"
    }
}
