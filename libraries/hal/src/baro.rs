//! Barometer sensor interface

/// Standard sea-level pressure in Pascals (1013.25 hPa)
pub const STD_SEA_LEVEL_PRESSURE_PA: f32 = 101_325.0;

/// Barometer sensor interface
pub trait BaroSensor {
    /// Error reported by a failed reading
    type Error;

    /// Initialize the barometer sensor
    ///
    /// Returns true if the sensor is ready for measurements
    fn init(&mut self) -> bool;

    /// Get the current temperature in Celsius
    fn read_temperature(&mut self) -> Result<f32, Self::Error>;

    /// Get the current pressure in Pascals
    fn read_pressure(&mut self) -> Result<i32, Self::Error>;

    /// Get the pressure reduced to sea level, given the current altitude in meters
    fn read_sealevel_pressure(&mut self, altitude_m: f32) -> Result<i32, Self::Error>;

    /// Get the estimated altitude in meters relative to `sea_level_pa`
    fn read_altitude(&mut self, sea_level_pa: f32) -> Result<f32, Self::Error>;

    /// Get the name of the chip
    fn chip_name(&self) -> &'static str;
}
