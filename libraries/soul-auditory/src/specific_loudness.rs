//! Excitation to specific loudness transformation
//!
//! Applies the piecewise compressive law of Moore, Glasberg & Baer (1997) as
//! revised in ANSI S3.4-2007 to an excitation pattern in linear power units.
//! Below 500 Hz the law's parameters depend on the channel's internal
//! excitation at threshold; from 500 Hz up they are constant.
//!
//! Three regimes are used per channel:
//!
//! | Excitation            | Specific loudness                                    |
//! |-----------------------|------------------------------------------------------|
//! | `E > 1e10`            | `(E / 1.0707)^0.2` (ANSI) or `(E / 1.04e6)^0.5`      |
//! | `E_thr < E <= 1e10`   | `(G E + A)^α - A^α`                                  |
//! | `E <= E_thr`          | `(2E / (E + E_thr))^1.5 ((G E + A)^α - A^α)`         |
//!
//! The extra factor in the lowest regime equals one at `E = E_thr`, so the
//! curve is continuous at the threshold. Every value is finally multiplied by
//! the constant `C`.
//!
//! # References
//!
//! Moore, B. C. J., Glasberg, B. R., & Baer, T. (1997). A Model for the
//! Prediction of Thresholds, Loudness, and Partial Loudness. Journal of the
//! Audio Engineering Society, 45(4), 224-240.
//!
//! ANSI S3.4-2007. Procedure for the Computation of Loudness of Steady Sounds.

use crate::error::{AuditoryError, Result};
use crate::signal_bank::SignalBank;
use crate::stage::Stage;
use tracing::debug;

/// Default value of the scaling constant C (ANSI S3.4-2007)
pub const PARAMETER_C: f64 = 0.046871;

/// Factor C is divided by when binaural inhibition follows this stage
pub const BINAURAL_INHIBITION_COMPENSATION: f64 = 0.75;

/// Excitation above which the high-level law applies
pub const HIGH_LEVEL_EXCITATION: f64 = 1e10;

/// Frequency from which the law's parameters are constant (Hz)
pub const CONSTANT_PARAMETER_FREQ: f64 = 500.0;

/// Threshold excitation from 500 Hz up (linear power)
pub const THRESHOLD_EXCITATION_HIGH: f64 = 2.360_478_233_180_577_1;

/// Parameter A from 500 Hz up
pub const A_HIGH: f64 = 4.72096;

/// Parameter alpha from 500 Hz up
pub const ALPHA_HIGH: f64 = 0.2;

/// `A_HIGH ^ ALPHA_HIGH`
const A_POW_ALPHA_HIGH: f64 = 1.363_973_912_833_054_6;

/// Internal excitation at threshold (dB) for a channel centred at `freq` Hz
///
/// Cubic fit in `log10(freq)`, clamped at 50 Hz; 3.73 dB from 500 Hz up.
pub fn internal_excitation_db(freq: f64) -> f64 {
    if freq >= CONSTANT_PARAMETER_FREQ {
        return 3.73;
    }

    let log_freq = freq.max(50.0).log10();
    10.0_f64.powf(
        0.430_688_109_549_369_98 * log_freq.powi(3) - 2.797_609_882_073_067_5 * log_freq.powi(2)
            + 5.073_846_033_569_696_9 * log_freq
            - 1.206_061_747_679_014_8,
    )
}

/// Parameter A as a function of low-frequency gain G (dB)
pub fn g_db_to_a(g_db: f64) -> f64 {
    if g_db >= 0.0 {
        return A_HIGH;
    }

    -0.000_001_070_649_719_209_604_5 * g_db.powi(5) - 0.000_060_648_487_122_230_512 * g_db.powi(4)
        - 0.001_204_732_657_571_773_3 * g_db.powi(3)
        - 0.006_819_041_791_184_852_5 * g_db.powi(2)
        - 0.118_478_256_416_283_05 * g_db
        + 4.713_872_246_349_734_7
}

/// Parameter alpha as a function of low-frequency gain G (dB)
pub fn g_db_to_alpha(g_db: f64) -> f64 {
    if g_db >= 0.0 {
        return ALPHA_HIGH;
    }

    0.000_026_864_285_714_285_498 * g_db.powi(2) - 0.002_002_335_714_285_723_1 * g_db
        + 0.199_931_071_428_571_39
}

/// Precomputed law parameters of one low-frequency channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowFrequencyParameters {
    /// Threshold excitation (linear power)
    pub threshold: f64,
    /// Gain G (linear)
    pub g: f64,
    /// Parameter A
    pub a: f64,
    /// Exponent alpha
    pub alpha: f64,
}

impl LowFrequencyParameters {
    /// Derive the parameters for a channel centred at `fc` Hz (below 500 Hz)
    pub fn for_frequency(fc: f64) -> Self {
        let threshold_db = internal_excitation_db(fc);
        let g_db = internal_excitation_db(CONSTANT_PARAMETER_FREQ) - threshold_db;
        Self {
            threshold: 10.0_f64.powf(threshold_db / 10.0),
            g: 10.0_f64.powf(g_db / 10.0),
            a: g_db_to_a(g_db),
            alpha: g_db_to_alpha(g_db),
        }
    }

    #[inline]
    fn medium_level(&self, excitation: f64) -> f64 {
        (self.g * excitation + self.a).powf(self.alpha) - self.a.powf(self.alpha)
    }
}

/// Specific loudness (without C) of a low-frequency channel
#[inline]
pub fn low_frequency_specific_loudness(params: &LowFrequencyParameters, excitation: f64) -> f64 {
    if excitation > params.threshold {
        params.medium_level(excitation)
    } else {
        ((2.0 * excitation) / (excitation + params.threshold)).powf(1.5)
            * params.medium_level(excitation)
    }
}

/// Specific loudness (without C) of a channel at or above 500 Hz
#[inline]
pub fn high_frequency_specific_loudness(excitation: f64) -> f64 {
    let medium = (excitation + A_HIGH).powf(ALPHA_HIGH) - A_POW_ALPHA_HIGH;
    if excitation > THRESHOLD_EXCITATION_HIGH {
        medium
    } else {
        ((2.0 * excitation) / (excitation + THRESHOLD_EXCITATION_HIGH)).powf(1.5) * medium
    }
}

/// Specific loudness (without C) above [`HIGH_LEVEL_EXCITATION`]
#[inline]
pub fn high_level_specific_loudness(excitation: f64, ansi_s3_4_2007: bool) -> f64 {
    if ansi_s3_4_2007 {
        (excitation / 1.0707).powf(0.2)
    } else {
        (excitation / 1.04e6).powf(0.5)
    }
}

/// Compressive excitation to specific loudness stage
pub struct SpecificLoudness {
    ansi_s3_4_2007: bool,
    compensate_binaural_inhibition: bool,
    parameter_c: f64,
    c_override: Option<f64>,
    low_frequency: Vec<LowFrequencyParameters>,
}

impl SpecificLoudness {
    /// Create the stage
    ///
    /// # Arguments
    /// * `ansi_s3_4_2007` - Use the ANSI S3.4-2007 high-level law rather than
    ///   the original 1997 one
    /// * `compensate_binaural_inhibition` - Divide C by 0.75 because a binaural
    ///   inhibition stage follows
    pub fn new(ansi_s3_4_2007: bool, compensate_binaural_inhibition: bool) -> Self {
        Self {
            ansi_s3_4_2007,
            compensate_binaural_inhibition,
            parameter_c: PARAMETER_C,
            c_override: None,
            low_frequency: Vec::new(),
        }
    }

    /// Override the scaling constant C
    ///
    /// Takes effect at the next `initialize` and replaces any binaural
    /// inhibition compensation.
    pub fn set_parameter_c(&mut self, parameter_c: f64) {
        self.c_override = Some(parameter_c);
    }

    /// Scaling constant C in use
    pub fn parameter_c(&self) -> f64 {
        self.parameter_c
    }

    /// Number of channels below 500 Hz
    pub fn n_low_frequency_channels(&self) -> usize {
        self.low_frequency.len()
    }

    /// Law parameters of the channels below 500 Hz
    pub fn low_frequency_parameters(&self) -> &[LowFrequencyParameters] {
        &self.low_frequency
    }

    /// Specific loudness (including C) of `excitation` in channel `channel`
    #[inline]
    pub fn transform(&self, channel: usize, excitation: f64) -> f64 {
        let sl = if excitation > HIGH_LEVEL_EXCITATION {
            high_level_specific_loudness(excitation, self.ansi_s3_4_2007)
        } else if let Some(params) = self.low_frequency.get(channel) {
            low_frequency_specific_loudness(params, excitation)
        } else {
            high_frequency_specific_loudness(excitation)
        };

        self.parameter_c * sl
    }
}

impl Default for SpecificLoudness {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Stage for SpecificLoudness {
    fn name(&self) -> &'static str {
        "SpecificLoudness"
    }

    fn initialize(&mut self, input: &SignalBank) -> Result<SignalBank> {
        if input.n_channels() < 2 {
            return Err(AuditoryError::InsufficientChannels {
                required: 2,
                found: input.n_channels(),
            });
        }
        let freqs = input.ascending_centre_frequencies()?;

        self.parameter_c = match self.c_override {
            Some(c) => c,
            None if self.compensate_binaural_inhibition => {
                let c = PARAMETER_C / BINAURAL_INHIBITION_COMPENSATION;
                debug!(
                    "{}: Scaling parameter C for binaural inhibition model: {}",
                    self.name(),
                    c
                );
                c
            }
            None => PARAMETER_C,
        };

        // ascending order means the low-frequency channels form a prefix
        self.low_frequency = freqs
            .iter()
            .take_while(|&&fc| fc < CONSTANT_PARAMETER_FREQ)
            .map(|&fc| LowFrequencyParameters::for_frequency(fc))
            .collect();

        debug!(
            "{}: number of filters <500 Hz: {}",
            self.name(),
            self.low_frequency.len()
        );

        Ok(SignalBank::with_shape_of(input))
    }

    fn process(&mut self, input: &SignalBank, output: &mut SignalBank) {
        let n_samples = input.n_samples();
        for src in 0..input.n_sources() {
            for ear in 0..input.n_ears() {
                let excitation = input.channels(src, ear);
                let specific = output.channels_mut(src, ear);
                for (idx, (out, &e)) in specific.iter_mut().zip(excitation).enumerate() {
                    *out = self.transform(idx / n_samples, e);
                }
            }
        }
    }
}
