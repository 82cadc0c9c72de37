// Barometer drivers
//
// Each chip driver owns its calibration, talks to the bus through
// `RegisterAccess`, and exposes the generic `hal::BaroSensor` interface.

pub mod bmp085;
pub mod compensation;

pub use self::bmp085::{
    Bmp085, Bmp085Config, BMP085_I2C_ADDR, DEFAULT_STARTUP_SAMPLES, MAX_STARTUP_SAMPLES,
};
pub use self::compensation::{Calibration, Oversampling};
pub use hal::STD_SEA_LEVEL_PRESSURE_PA;

/// Reference altitude from a batch of startup samples.
///
/// Sorts `samples` ascending and returns the element at index `ceil(n / 2)`.
/// For an even count this is the upper of the two middle values rather than
/// their mean, and for an odd count it is the element after the middle one.
/// Baselines recorded by earlier deployments were taken this way.
pub fn baseline_altitude(samples: &mut [f32]) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }
    samples.sort_unstable_by(f32::total_cmp);
    let index = samples.len().div_ceil(2).min(samples.len() - 1);
    Some(samples[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_of_fifty_samples() {
        let mut samples = [
            12.4, 11.9, 12.8, 12.0, 12.6, 11.7, 12.2, 12.9, 12.1, 12.5, //
            11.8, 12.3, 13.0, 12.7, 11.6, 12.4, 12.0, 12.2, 12.8, 11.9, //
            12.6, 12.1, 12.3, 12.5, 12.9, 11.5, 12.7, 12.0, 12.4, 13.1, //
            12.2, 11.8, 12.6, 12.3, 12.1, 12.9, 11.7, 12.5, 12.8, 12.0, //
            13.2, 12.2, 11.9, 12.4, 12.7, 12.4, 12.1, 12.6, 11.6, 12.5,
        ];
        // sorted by hand:
        // 11.5 11.6 11.6 11.7 11.7 11.8 11.8 11.9 11.9 11.9
        // 12.0 12.0 12.0 12.0 12.1 12.1 12.1 12.1 12.2 12.2
        // 12.2 12.2 12.3 12.3 12.3 [12.4] 12.4 12.4 12.4 12.4 ...
        assert_eq!(samples.len(), 50);
        assert_eq!(baseline_altitude(&mut samples), Some(12.4));
        // the lower middle differs, so taking n/2 - 1 would fail here
        assert_eq!(samples[24], 12.3);
        assert_eq!(samples[25], 12.4);
    }

    #[test]
    fn test_baseline_takes_upper_middle() {
        let mut samples = [4.0, 1.0, 3.0, 2.0];
        // mean of the middle pair would be 2.5
        assert_eq!(baseline_altitude(&mut samples), Some(3.0));
    }

    #[test]
    fn test_baseline_odd_and_tiny_counts() {
        // ceil(3 / 2) = 2 is one past the middle element
        assert_eq!(baseline_altitude(&mut [5.0, 1.0, 3.0]), Some(5.0));
        assert_eq!(baseline_altitude(&mut [7.0]), Some(7.0));
        assert_eq!(baseline_altitude(&mut []), None);
    }
}
