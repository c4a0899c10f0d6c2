//! Binaural inhibition of specific loudness (Moore & Glasberg, 2007)
//!
//! Each ear's specific loudness pattern is smoothed with a Gaussian kernel on
//! the Cam scale. The smoothed patterns of the two ears inhibit one another:
//!
//! ```text
//! inhib_left  = 2 / (1 + sech(smooth_right / smooth_left)^1.5978)
//! inhib_right = 2 / (1 + sech(smooth_left / smooth_right)^1.5978)
//! ```
//!
//! and the raw specific loudness of each ear is divided by its own divisor.
//! A diotic sound (equal patterns) gets a divisor of `2 / (1 + sech(1)^1.5978)`
//! in both ears.
//!
//! # References
//!
//! Moore, B. C. J., & Glasberg, B. R. (2007). Modeling binaural loudness.
//! The Journal of the Acoustical Society of America, 121(3), 1604-1612.

use crate::error::{AuditoryError, Result};
use crate::signal_bank::SignalBank;
use crate::stage::Stage;
use tracing::debug;

/// Width of the smoothing kernel (per Cam)
pub const KERNEL_WIDTH: f64 = 0.08;

/// Exponent applied to the hyperbolic secant
pub const INHIBITION_EXPONENT: f64 = 1.5978;

/// Floor applied to smoothed patterns before taking their ratio
pub const SMOOTHED_FLOOR: f64 = 1e-12;

/// Inhibition divisor of one ear given both smoothed values at a channel
#[inline]
pub fn inhibition_divisor(smoothed_self: f64, smoothed_other: f64) -> f64 {
    let sech = 1.0 / (smoothed_other / smoothed_self).cosh();
    2.0 / (1.0 + sech.powf(INHIBITION_EXPONENT))
}

/// Cross-ear inhibition stage
#[derive(Default)]
pub struct BinauralInhibition {
    // kernel weight by channel distance
    gaussian: Vec<f64>,
}

impl BinauralInhibition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smoothing kernel weight indexed by channel distance
    pub fn kernel(&self) -> &[f64] {
        &self.gaussian
    }

    fn smooth(&self, pattern: &[f64], chn: usize) -> f64 {
        pattern
            .iter()
            .enumerate()
            .map(|(i, &x)| x * self.gaussian[i.abs_diff(chn)])
            .sum()
    }
}

impl Stage for BinauralInhibition {
    fn name(&self) -> &'static str {
        "BinauralInhibition"
    }

    fn initialize(&mut self, input: &SignalBank) -> Result<SignalBank> {
        if input.n_ears() != 2 {
            return Err(AuditoryError::InvalidEarCount {
                expected: 2,
                found: input.n_ears(),
            });
        }
        let cam_step = match input.channel_spacing_in_cams() {
            Some(step) if step > 0.0 => step,
            _ => return Err(AuditoryError::ChannelSpacingNotSet),
        };

        self.gaussian = (0..input.n_channels())
            .map(|k| {
                let arg = KERNEL_WIDTH * cam_step * k as f64;
                (-arg * arg).exp()
            })
            .collect();

        debug!(
            "{}: Gaussian kernel over {} channels at {} Cam spacing",
            self.name(),
            self.gaussian.len(),
            cam_step
        );

        Ok(SignalBank::with_shape_of(input))
    }

    fn process(&mut self, input: &SignalBank, output: &mut SignalBank) {
        for src in 0..input.n_sources() {
            let left = input.channels(src, 0);
            let right = input.channels(src, 1);

            for chn in 0..input.n_channels() {
                let smooth_left = self.smooth(left, chn).max(SMOOTHED_FLOOR);
                let smooth_right = self.smooth(right, chn).max(SMOOTHED_FLOOR);

                let inhib_left = inhibition_divisor(smooth_left, smooth_right);
                let inhib_right = inhibition_divisor(smooth_right, smooth_left);

                output.set_sample(src, 0, chn, 0, left[chn] / inhib_left);
                output.set_sample(src, 1, chn, 0, right[chn] / inhib_right);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binaural_bank(left: &[f64], right: &[f64]) -> SignalBank {
        let freqs: Vec<f64> = (0..left.len()).map(|i| 100.0 * (i + 1) as f64).collect();
        let mut bank = SignalBank::spectrum(2, freqs, 32000.0, 1000.0);
        bank.set_channel_spacing_in_cams(0.25);
        bank.channels_mut(0, 0).copy_from_slice(left);
        bank.channels_mut(0, 1).copy_from_slice(right);
        bank
    }

    #[test]
    fn test_requires_two_ears() {
        let mut bank = SignalBank::spectrum(1, vec![100.0, 200.0], 32000.0, 1000.0);
        bank.set_channel_spacing_in_cams(0.25);
        let mut stage = BinauralInhibition::new();
        assert_eq!(
            stage.initialize(&bank),
            Err(AuditoryError::InvalidEarCount {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_requires_channel_spacing() {
        let bank = SignalBank::spectrum(2, vec![100.0, 200.0], 32000.0, 1000.0);
        let mut stage = BinauralInhibition::new();
        assert_eq!(stage.initialize(&bank), Err(AuditoryError::ChannelSpacingNotSet));
    }

    #[test]
    fn test_kernel_shape() {
        let input = binaural_bank(&[1.0; 4], &[1.0; 4]);
        let mut stage = BinauralInhibition::new();
        stage.initialize(&input).unwrap();

        let kernel = stage.kernel();
        assert_eq!(kernel[0], 1.0);
        let arg: f64 = 0.08 * 0.25 * 3.0;
        assert!((kernel[3] - (-arg * arg).exp()).abs() < 1e-15);
        assert!(kernel.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_diotic_inhibition_is_symmetric() {
        let pattern = [0.1, 0.5, 1.0, 0.5, 0.1];
        let input = binaural_bank(&pattern, &pattern);
        let mut stage = BinauralInhibition::new();
        let mut output = stage.initialize(&input).unwrap();
        stage.process(&input, &mut output);

        let divisor = 2.0 / (1.0 + (1.0 / 1.0_f64.cosh()).powf(INHIBITION_EXPONENT));
        for (chn, &x) in pattern.iter().enumerate() {
            assert!((output.sample(0, 0, chn, 0) - x / divisor).abs() < 1e-12);
            assert_eq!(output.sample(0, 0, chn, 0), output.sample(0, 1, chn, 0));
        }
    }

    #[test]
    fn test_louder_ear_is_inhibited_less() {
        let input = binaural_bank(&[1.0; 5], &[0.2; 5]);
        let mut stage = BinauralInhibition::new();
        let mut output = stage.initialize(&input).unwrap();
        stage.process(&input, &mut output);

        let left_ratio = output.sample(0, 0, 2, 0) / 1.0;
        let right_ratio = output.sample(0, 1, 2, 0) / 0.2;
        assert!(left_ratio > right_ratio);
    }

    #[test]
    fn test_silence_stays_finite() {
        let input = binaural_bank(&[0.0; 3], &[0.0; 3]);
        let mut stage = BinauralInhibition::new();
        let mut output = stage.initialize(&input).unwrap();
        stage.process(&input, &mut output);
        assert!(output.data().iter().all(|&x| x == 0.0));
    }
}
