//! Decibel/linear conversions with fixed floor semantics
//!
//! All level conversions in the crate go through these helpers so that
//! clamping near zero behaves the same everywhere.

/// Smallest power added before taking a logarithm (-100 dB)
pub const LOW_LIMIT_POWER: f64 = 1e-10;

/// Level corresponding to [`LOW_LIMIT_POWER`]
pub const LOW_LIMIT_DB: f64 = -100.0;

/// Convert power to decibels, flooring at [`LOW_LIMIT_DB`]
///
/// The floor is applied by adding [`LOW_LIMIT_POWER`] to the input, so the
/// result is smooth rather than hard-clipped and never `-inf`.
#[inline]
pub fn power_to_decibels(power: f64) -> f64 {
    10.0 * (power.max(0.0) + LOW_LIMIT_POWER).log10()
}

/// Convert decibels to a power ratio
#[inline]
pub fn decibels_to_power(decibels: f64) -> f64 {
    10.0_f64.powf(decibels / 10.0)
}

/// Convert amplitude to decibels
///
/// Returns `clip_value` when `amplitude` is not above `min_value`.
#[inline]
pub fn amplitude_to_decibels(amplitude: f64, min_value: f64, clip_value: f64) -> f64 {
    if amplitude > min_value {
        20.0 * amplitude.log10()
    } else {
        clip_value
    }
}

/// Convert decibels to amplitude
///
/// Returns `clip_value` when `decibels` is not above `min_value`.
#[inline]
pub fn decibels_to_amplitude(decibels: f64, min_value: f64, clip_value: f64) -> f64 {
    if decibels > min_value {
        10.0_f64.powf(decibels / 20.0)
    } else {
        clip_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_floor() {
        assert!((power_to_decibels(0.0) - LOW_LIMIT_DB).abs() < 1e-9);
        assert!(power_to_decibels(-1.0).is_finite());
        assert!((power_to_decibels(1.0) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_power_conversions() {
        assert!((decibels_to_power(10.0) - 10.0).abs() < 1e-12);
        assert!((decibels_to_power(-30.0) - 0.001).abs() < 1e-15);
        assert!((power_to_decibels(100.0) - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_amplitude_clipping() {
        assert_eq!(amplitude_to_decibels(0.0, 1e-5, -100.0), -100.0);
        assert!((amplitude_to_decibels(0.1, 1e-5, -100.0) + 20.0).abs() < 1e-9);
        assert_eq!(decibels_to_amplitude(-200.0, -100.0, 0.0), 0.0);
        assert!((decibels_to_amplitude(-6.0, -100.0, 0.0) - 0.501187).abs() < 1e-5);
    }
}
