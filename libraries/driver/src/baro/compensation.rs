//! Fixed-point compensation for the BMP085/BMP180.
//!
//! The integer pipeline follows the datasheet step for step. Shift amounts,
//! operand signedness and the unsigned `B4`/`B7` stage all matter: the result
//! is calibrated against this exact arithmetic, and a floating-point rewrite
//! drifts by several Pascals. Intermediate products use two's-complement
//! wrapping, so out-of-range raw counts yield a meaningless number rather
//! than a panic.

use crate::{Error, Result};

/// Pressure oversampling setting; trades conversion time for resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Oversampling {
    /// 1 sample, 4.5 ms
    UltraLowPower = 0,
    /// 2 samples, 7.5 ms
    Standard = 1,
    /// 4 samples, 13.5 ms
    HighRes = 2,
    /// 8 samples, 25.5 ms
    #[default]
    UltraHighRes = 3,
}

impl Oversampling {
    /// Mode for a numeric level; anything above 3 becomes `UltraHighRes`
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Oversampling::UltraLowPower,
            1 => Oversampling::Standard,
            2 => Oversampling::HighRes,
            _ => Oversampling::UltraHighRes,
        }
    }

    /// The `oss` value used in the control command and the compensation shifts
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Time to wait after starting a pressure conversion, in milliseconds
    pub fn conversion_time_ms(self) -> u32 {
        match self {
            Oversampling::UltraLowPower => 5,
            Oversampling::Standard => 8,
            Oversampling::HighRes => 14,
            Oversampling::UltraHighRes => 26,
        }
    }
}

/// Factory calibration coefficients, in register order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub ac1: i16,
    pub ac2: i16,
    pub ac3: i16,
    pub ac4: u16,
    pub ac5: u16,
    pub ac6: u16,
    pub b1: i16,
    pub b2: i16,
    pub mb: i16,
    pub mc: i16,
    pub md: i16,
}

/// Coefficient names in register order, starting at 0xAA
pub const COEFFICIENT_NAMES: [&str; 11] = [
    "AC1", "AC2", "AC3", "AC4", "AC5", "AC6", "B1", "B2", "MB", "MC", "MD",
];

impl Calibration {
    /// Coefficients of the worked example in the datasheet
    pub const DATASHEET: Calibration = Calibration {
        ac1: 408,
        ac2: -72,
        ac3: -14383,
        ac4: 32741,
        ac5: 32757,
        ac6: 23153,
        b1: 6190,
        b2: 4,
        mb: -32768,
        mc: -8711,
        md: 2868,
    };

    /// Build from the eleven raw register words, in register order.
    ///
    /// A word of 0x0000 or 0xFFFF means the bus or the EEPROM read failed;
    /// the chip never programs either value.
    pub fn from_words(words: [u16; 11]) -> Result<Self> {
        if let Some((&name, &raw)) = COEFFICIENT_NAMES
            .iter()
            .zip(words.iter())
            .find(|&(_, &raw)| raw == 0x0000 || raw == 0xFFFF)
        {
            return Err(Error::InvalidCalibration { name, raw });
        }
        let [ac1, ac2, ac3, ac4, ac5, ac6, b1, b2, mb, mc, md] = words;
        Ok(Self {
            ac1: ac1 as i16,
            ac2: ac2 as i16,
            ac3: ac3 as i16,
            ac4,
            ac5,
            ac6,
            b1: b1 as i16,
            b2: b2 as i16,
            mb: mb as i16,
            mc: mc as i16,
            md: md as i16,
        })
    }

    /// `B5`, the temperature term shared by both compensations
    pub fn compute_b5(&self, ut: i32) -> Result<i32> {
        let x1 = ut
            .wrapping_sub(i32::from(self.ac6))
            .wrapping_mul(i32::from(self.ac5))
            >> 15;
        let divisor = x1.wrapping_add(i32::from(self.md));
        if divisor == 0 {
            return Err(Error::DivisionByZero { term: "X1 + MD" });
        }
        let x2 = (i32::from(self.mc) << 11) / divisor;
        Ok(x1.wrapping_add(x2))
    }

    /// Temperature in tenths of a degree Celsius
    pub fn temperature_tenths(&self, ut: u16) -> Result<i32> {
        let b5 = self.compute_b5(i32::from(ut))?;
        Ok(b5.wrapping_add(8) >> 4)
    }

    /// Temperature in degrees Celsius
    pub fn temperature(&self, ut: u16) -> Result<f32> {
        Ok(self.temperature_tenths(ut)? as f32 / 10.0)
    }

    /// Pressure in Pascals from raw temperature `ut` and raw pressure `up`
    pub fn pressure(&self, ut: u16, up: u32, oversampling: Oversampling) -> Result<i32> {
        let oss = u32::from(oversampling.level());
        let b5 = self.compute_b5(i32::from(ut))?;

        let b6 = b5.wrapping_sub(4000);
        let b6_sq = b6.wrapping_mul(b6) >> 12;
        let x1 = i32::from(self.b2).wrapping_mul(b6_sq) >> 11;
        let x2 = i32::from(self.ac2).wrapping_mul(b6) >> 11;
        let x3 = x1.wrapping_add(x2);
        let b3 =
            ((i32::from(self.ac1).wrapping_mul(4).wrapping_add(x3) << oss).wrapping_add(2)) / 4;

        let x1 = i32::from(self.ac3).wrapping_mul(b6) >> 13;
        let x2 = i32::from(self.b1).wrapping_mul(b6_sq) >> 16;
        let x3 = (x1.wrapping_add(x2).wrapping_add(2)) >> 2;
        let b4 = u32::from(self.ac4).wrapping_mul(x3.wrapping_add(32768) as u32) >> 15;
        let b7 = up.wrapping_sub(b3 as u32).wrapping_mul(50_000u32 >> oss);
        if b4 == 0 {
            return Err(Error::DivisionByZero { term: "B4" });
        }

        // B7 * 2 only fits in u32 while the top bit is clear
        let p = if b7 < 0x8000_0000 {
            (b7 * 2) / b4
        } else {
            (b7 / b4).wrapping_mul(2)
        } as i32;

        let x1 = (p >> 8).wrapping_mul(p >> 8);
        let x1 = x1.wrapping_mul(3038) >> 16;
        let x2 = (-7357i32).wrapping_mul(p) >> 16;
        Ok(p.wrapping_add(x1.wrapping_add(x2).wrapping_add(3791) >> 4))
    }
}

/// Altitude in meters for `pressure_pa`, relative to `sea_level_pa`
pub fn altitude(pressure_pa: i32, sea_level_pa: f32) -> f32 {
    let ratio = f64::from(pressure_pa) / f64::from(sea_level_pa);
    (44330.0 * (1.0 - ratio.powf(0.1903))) as f32
}

/// Pressure reduced to sea level from a reading taken at `altitude_m`
pub fn sea_level_pressure(pressure_pa: i32, altitude_m: f32) -> i32 {
    let scale = (1.0 - f64::from(altitude_m) / 44330.0).powf(5.255);
    (f64::from(pressure_pa) / scale) as i32
}
