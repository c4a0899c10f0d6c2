//! Instantaneous loudness: specific loudness integrated over the Cam scale
//!
//! Channels are assumed uniformly spaced, so the integral is the channel sum
//! times the spacing (in Cams) times an external scale factor.
//!
//! Output layout depends on the number of ears and the presentation mode:
//!
//! | Ears | Presentation | Output ears                                  |
//! |------|--------------|----------------------------------------------|
//! | 1    | diotic       | 1 (loudness doubled for two-eared listening) |
//! | 1    | dichotic     | 1                                            |
//! | 2    | diotic       | 1 (sum of both ears)                         |
//! | 2    | dichotic     | 3 (left, right, overall)                     |

use crate::error::{AuditoryError, Result};
use crate::signal_bank::SignalBank;
use crate::stage::Stage;
use tracing::debug;

/// Channel sum of specific loudness into one value per ear
pub struct InstantaneousLoudness {
    scale: f64,
    diotic: bool,
    // scale * spacing (* 2 for monaural diotic)
    gain: f64,
}

impl InstantaneousLoudness {
    /// Create the stage
    ///
    /// # Arguments
    /// * `scale` - External scale factor applied to the integral
    /// * `diotic` - Treat the sound as presented identically to both ears
    pub fn new(scale: f64, diotic: bool) -> Self {
        Self {
            scale,
            diotic,
            gain: scale,
        }
    }

    /// Combined factor applied to each ear's channel sum
    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn is_diotic(&self) -> bool {
        self.diotic
    }
}

impl Default for InstantaneousLoudness {
    fn default() -> Self {
        Self::new(1.0, true)
    }
}

impl Stage for InstantaneousLoudness {
    fn name(&self) -> &'static str {
        "InstantaneousLoudness"
    }

    fn initialize(&mut self, input: &SignalBank) -> Result<SignalBank> {
        if input.n_channels() < 2 {
            return Err(AuditoryError::InsufficientChannels {
                required: 2,
                found: input.n_channels(),
            });
        }
        if input.n_ears() == 0 || input.n_ears() > 2 {
            return Err(AuditoryError::TooManyEars(input.n_ears()));
        }
        let cam_step = match input.channel_spacing_in_cams() {
            Some(step) if step > 0.0 => step,
            _ => return Err(AuditoryError::ChannelSpacingNotSet),
        };
        debug!("{}: Filter spacing (Cams): {}", self.name(), cam_step);

        self.gain = self.scale * cam_step;

        let n_out_ears = match (input.n_ears(), self.diotic) {
            (1, true) => {
                self.gain *= 2.0;
                debug!("{}: diotic presentation; loudness will be multiplied by 2", self.name());
                1
            }
            (1, false) => 1,
            (_, true) => {
                debug!("{}: diotic presentation; loudness will be summed across ears", self.name());
                1
            }
            (n_ears, false) => {
                debug!(
                    "{}: dichotic presentation; loudness output in each ear plus overall loudness",
                    self.name()
                );
                n_ears + 1
            }
        };

        let mut output = SignalBank::new(input.n_sources(), n_out_ears, 1, 1, input.fs());
        output.set_frame_rate(input.frame_rate());
        Ok(output)
    }

    fn process(&mut self, input: &SignalBank, output: &mut SignalBank) {
        let per_ear = !self.diotic && input.n_ears() > 1;

        for src in 0..input.n_sources() {
            let mut overall = 0.0;
            for ear in 0..input.n_ears() {
                let ear_loudness = self.gain * input.channels(src, ear).iter().sum::<f64>();
                if per_ear {
                    output.set_sample(src, ear, 0, 0, ear_loudness);
                }
                overall += ear_loudness;
            }

            let overall_ear = if per_ear { input.n_ears() } else { 0 };
            output.set_sample(src, overall_ear, 0, 0, overall);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specific_bank(n_ears: usize, spacing: Option<f64>) -> SignalBank {
        let freqs: Vec<f64> = (0..4).map(|i| 100.0 * (i + 1) as f64).collect();
        let mut bank = SignalBank::spectrum(n_ears, freqs, 32000.0, 500.0);
        if let Some(spacing) = spacing {
            bank.set_channel_spacing_in_cams(spacing);
        }
        for ear in 0..n_ears {
            bank.channels_mut(0, ear).fill((ear + 1) as f64);
        }
        bank
    }

    fn run(stage: &mut InstantaneousLoudness, input: &SignalBank) -> SignalBank {
        let mut output = stage.initialize(input).unwrap();
        stage.process(input, &mut output);
        output
    }

    #[test]
    fn test_monaural_diotic_doubles() {
        let input = specific_bank(1, Some(0.5));
        let mut stage = InstantaneousLoudness::new(1.0, true);
        assert!(stage.is_diotic());
        let output = run(&mut stage, &input);

        assert_eq!(output.n_ears(), 1);
        assert_eq!(output.frame_rate(), 500.0);
        assert!((output.sample(0, 0, 0, 0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_monaural_dichotic() {
        let input = specific_bank(1, Some(0.5));
        let mut stage = InstantaneousLoudness::new(2.0, false);
        assert!(!stage.is_diotic());
        let output = run(&mut stage, &input);

        assert_eq!(output.n_ears(), 1);
        assert!((output.sample(0, 0, 0, 0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_binaural_diotic_sums_ears() {
        let input = specific_bank(2, Some(0.25));
        let mut stage = InstantaneousLoudness::new(1.0, true);
        let output = run(&mut stage, &input);

        assert_eq!(output.n_ears(), 1);
        // (4 * 1 + 4 * 2) * 0.25
        assert!((output.sample(0, 0, 0, 0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_binaural_dichotic_three_ears() {
        let input = specific_bank(2, Some(0.25));
        let mut stage = InstantaneousLoudness::new(1.0, false);
        let output = run(&mut stage, &input);

        assert_eq!(output.n_ears(), 3);
        assert!((output.sample(0, 0, 0, 0) - 1.0).abs() < 1e-12);
        assert!((output.sample(0, 1, 0, 0) - 2.0).abs() < 1e-12);
        assert!((output.sample(0, 2, 0, 0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_configuration_errors() {
        let mut stage = InstantaneousLoudness::default();

        let input = specific_bank(1, None);
        assert_eq!(stage.initialize(&input), Err(AuditoryError::ChannelSpacingNotSet));

        let input = specific_bank(1, Some(0.0));
        assert_eq!(stage.initialize(&input), Err(AuditoryError::ChannelSpacingNotSet));

        let mut input = SignalBank::new(1, 3, 4, 1, 32000.0);
        input.set_channel_spacing_in_cams(0.1);
        assert_eq!(stage.initialize(&input), Err(AuditoryError::TooManyEars(3)));

        let mut input = SignalBank::new(1, 1, 1, 1, 32000.0);
        input.set_channel_spacing_in_cams(0.1);
        assert!(matches!(
            stage.initialize(&input),
            Err(AuditoryError::InsufficientChannels { .. })
        ));
    }

    #[test]
    fn test_reinitialize_does_not_compound_gain() {
        let input = specific_bank(1, Some(0.5));
        let mut stage = InstantaneousLoudness::new(1.0, true);
        stage.initialize(&input).unwrap();
        stage.initialize(&input).unwrap();
        assert!((stage.gain() - 1.0).abs() < 1e-12);
    }
}
