//! Double roex auditory filterbank
//!
//! Maps an input power spectrum onto an excitation pattern using the double
//! rounded-exponential filter model of Chen, Hu, Glasberg & Moore (2011).
//! Each filter combines a passive wideband roex response with an active
//! narrowband one; the passive output level sets the gain of the active
//! filter, making the filter shape level dependent.
//!
//! Filters are equally spaced on the Cam scale between `cam_lo` and `cam_hi`.
//! With a coarse spacing the pattern can be resampled to the standard 0.1-Cam
//! grid (388 points spanning 1.5 to 40.2 Cams) by spline interpolation of the
//! log excitation.
//!
//! # Reference
//!
//! Chen, Z., Hu, G., Glasberg, B. R., & Moore, B. C. J. (2011). A new method
//! of calculating auditory excitation patterns and loudness for steady
//! sounds. Hearing Research, 282(1-2), 204-215.

use crate::auditory::{cam_to_hz, hz_to_cam};
use crate::error::{AuditoryError, Result};
use crate::interpolation::{SplineInterpolator, SplineKind};
use crate::signal_bank::SignalBank;
use crate::stage::{ExcitationFilterbank, Stage};
use crate::units::{decibels_to_power, power_to_decibels};
use tracing::{debug, warn};

/// Normalised deviation beyond which filter weights are truncated
pub const MAX_NORMALISED_DEVIATION: f64 = 2.0;

/// First point of the dense interpolation grid (Cams)
pub const INTERPOLATION_CAM_LO: f64 = 1.5;

/// Spacing of the dense interpolation grid (Cams)
pub const INTERPOLATION_CAM_STEP: f64 = 0.1;

/// Number of points on the dense interpolation grid (1.5 to 40.2 Cams)
pub const INTERPOLATION_POINTS: usize = 388;

/// Offset added to excitation before taking its log for interpolation
const LOG_EXCITATION_FLOOR: f64 = 1e-10;

/// Configuration of a [`DoubleRoexBank`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleRoexSettings {
    /// Centre of the first filter (Cams)
    pub cam_lo: f64,
    /// Centre of the last filter (Cams)
    pub cam_hi: f64,
    /// Filter spacing (Cams)
    pub cam_step: f64,
    /// Scaling applied to the final excitation
    pub scaling_factor: f64,
    /// Resample the pattern onto the dense 0.1-Cam grid
    pub interpolate: bool,
    /// Use cubic rather than linear interpolation
    pub interpolation_cubic: bool,
}

impl DoubleRoexSettings {
    /// Default settings: 1.5-40.2 Cams at 0.1-Cam spacing, no scaling
    pub fn new() -> Self {
        Self {
            cam_lo: 1.5,
            cam_hi: 40.2,
            cam_step: 0.1,
            scaling_factor: 1.0,
            interpolate: false,
            interpolation_cubic: true,
        }
    }

    /// Coarse 0.25-Cam filters resampled to the dense grid with a cubic spline
    pub fn faster() -> Self {
        Self {
            cam_step: 0.25,
            interpolate: true,
            ..Self::new()
        }
    }

    /// Number of filters implied by the Cam range and step (inclusive)
    pub fn n_filters(&self) -> usize {
        ((self.cam_hi - self.cam_lo) / self.cam_step).round() as usize + 1
    }

    fn validate(&self) -> Result<()> {
        if self.cam_step.is_nan() || self.cam_step <= 0.0 {
            return Err(AuditoryError::InvalidCamStep(self.cam_step));
        }
        if self.cam_lo.is_nan()
            || self.cam_hi.is_nan()
            || self.cam_hi <= self.cam_lo
            || self.cam_lo < 0.0
        {
            return Err(AuditoryError::InvalidCamRange {
                lo: self.cam_lo,
                hi: self.cam_hi,
            });
        }
        Ok(())
    }
}

impl Default for DoubleRoexSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed weights of one filter
///
/// Weight `j` applies to input channel `j`; the sequence stops at the first
/// channel whose normalised deviation exceeds [`MAX_NORMALISED_DEVIATION`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterShape {
    /// Passive (wideband) weights
    pub passive: Vec<f64>,
    /// Active (narrowband) weights
    pub active: Vec<f64>,
}

/// Roex weight `(1 + p|g|) exp(-p|g|)`
#[inline]
pub fn roex(pg: f64) -> f64 {
    (1.0 + pg) * (-pg).exp()
}

/// Slopes of the passive (`tl`, `tu`) and active (`pl`, `pu`) filters at `fc`
#[inline]
pub fn filter_slopes(fc: f64) -> (f64, f64, f64, f64) {
    let tl = fc / (0.108 * fc + 2.33);
    let tu = 15.6;
    let pl = fc / (0.027 * fc + 5.44);
    let pu = 27.9;
    (tl, tu, pl, pu)
}

/// Build the passive and active weights of a filter centred at `fc`
///
/// `input_freqs` must be ascending: scanning stops at the first channel past
/// the upper cut-off.
pub fn filter_shape(fc: f64, input_freqs: &[f64]) -> FilterShape {
    let (tl, tu, pl, pu) = filter_slopes(fc);
    let mut shape = FilterShape::default();

    for &freq in input_freqs {
        let g = (freq - fc) / fc;
        if g >= MAX_NORMALISED_DEVIATION {
            break;
        }

        let (pg_passive, pg_active) = if g < 0.0 {
            (-tl * g, -pl * g)
        } else {
            (tu * g, pu * g)
        };

        shape.passive.push(roex(pg_passive));
        shape.active.push(roex(pg_active));
    }

    shape
}

/// Maximum active gain (dB) of a filter centred at `fc`
#[inline]
pub fn max_gain_db(fc: f64) -> f64 {
    fc / (0.0191 * fc + 1.1)
}

/// Level-dependent gain (dB) of the active filter
///
/// `passive_db` is the passive filter output level; `third_term` is the
/// precomputed `max_g / (1 + exp(0.05 (100 - max_g)))`.
#[inline]
pub fn active_gain_db(max_g: f64, third_term: f64, passive_db: f64) -> f64 {
    let mut gain =
        max_g - max_g / (1.0 + (-0.05 * (passive_db - (100.0 - max_g))).exp()) + third_term;

    if passive_db > 30.0 {
        let above = passive_db - 30.0;
        gain -= 0.003 * above * above;
    }

    gain
}

/// Bank of double roex filters equally spaced on the Cam scale
pub struct DoubleRoexBank {
    settings: DoubleRoexSettings,
    n_filters: usize,
    shapes: Vec<FilterShape>,
    max_gain_db: Vec<f64>,
    third_gain_term: Vec<f64>,
    // Interpolation state (present only when interpolating)
    spline: Option<SplineInterpolator>,
    grid_cams: Vec<f64>,
    log_excitation: Vec<f64>,
}

impl DoubleRoexBank {
    /// Create a filterbank with the given settings
    pub fn new(settings: DoubleRoexSettings) -> Self {
        Self {
            settings,
            n_filters: 0,
            shapes: Vec::new(),
            max_gain_db: Vec::new(),
            third_gain_term: Vec::new(),
            spline: None,
            grid_cams: Vec::new(),
            log_excitation: Vec::new(),
        }
    }

    pub fn settings(&self) -> &DoubleRoexSettings {
        &self.settings
    }

    /// Number of native (non-interpolated) filters
    pub fn n_filters(&self) -> usize {
        self.n_filters
    }

    /// Whether the output is resampled onto the dense grid
    pub fn is_interpolating(&self) -> bool {
        self.spline.is_some()
    }

    /// Fixed filter weights, one entry per native filter
    pub fn filter_shapes(&self) -> &[FilterShape] {
        &self.shapes
    }

    #[inline]
    fn filter_excitation(&self, i: usize, spectrum: &[f64]) -> f64 {
        let shape = &self.shapes[i];

        let passive: f64 = shape.passive.iter().zip(spectrum).map(|(w, x)| w * x).sum();

        let passive_db = power_to_decibels(passive);
        let gain = decibels_to_power(active_gain_db(
            self.max_gain_db[i],
            self.third_gain_term[i],
            passive_db,
        ));

        let active: f64 = shape.active.iter().zip(spectrum).map(|(w, x)| w * x).sum();

        self.settings.scaling_factor * (passive + gain * active)
    }
}

impl Default for DoubleRoexBank {
    fn default() -> Self {
        Self::new(DoubleRoexSettings::new())
    }
}

impl Stage for DoubleRoexBank {
    fn name(&self) -> &'static str {
        "DoubleRoexBank"
    }

    fn initialize(&mut self, input: &SignalBank) -> Result<SignalBank> {
        self.settings.validate()?;
        if input.n_samples() != 1 {
            return Err(AuditoryError::InvalidSampleCount {
                expected: 1,
                found: input.n_samples(),
            });
        }
        let input_freqs = input.ascending_centre_frequencies()?;
        if input_freqs.is_empty() {
            return Err(AuditoryError::InsufficientChannels {
                required: 1,
                found: 0,
            });
        }

        let settings = self.settings;
        self.n_filters = settings.n_filters();
        debug!("{}: Total number of filters: {}", self.name(), self.n_filters);

        let mut interpolate = settings.interpolate;
        if interpolate && settings.cam_step <= INTERPOLATION_CAM_STEP {
            warn!(
                "{}: Filter spacing {} Cams is already dense; interpolation disabled",
                self.name(),
                settings.cam_step
            );
            interpolate = false;
        }

        let native_cams: Vec<f64> = (0..self.n_filters)
            .map(|i| settings.cam_lo + i as f64 * settings.cam_step)
            .collect();

        self.shapes.clear();
        self.max_gain_db.clear();
        self.third_gain_term.clear();
        for &cam in &native_cams {
            let fc = cam_to_hz(cam);
            let max_g = max_gain_db(fc);
            self.max_gain_db.push(max_g);
            self.third_gain_term
                .push(max_g / (1.0 + (0.05 * (100.0 - max_g)).exp()));
            self.shapes.push(filter_shape(fc, input_freqs));
        }
        debug!("{}: Passive and active filters configured.", self.name());
        debug!(
            "{}: Excitation pattern will be scaled by: {}",
            self.name(),
            settings.scaling_factor
        );

        let (output_cams, spacing) = if interpolate {
            let kind = if settings.interpolation_cubic {
                SplineKind::Cubic
            } else {
                SplineKind::Linear
            };
            self.spline = Some(SplineInterpolator::new(native_cams, kind));
            self.log_excitation = vec![0.0; self.n_filters];
            self.grid_cams = (0..INTERPOLATION_POINTS)
                .map(|i| INTERPOLATION_CAM_LO + i as f64 * INTERPOLATION_CAM_STEP)
                .collect();
            debug!(
                "{}: Interpolating ({:?}) onto {} points at {} Cam spacing",
                self.name(),
                kind,
                INTERPOLATION_POINTS,
                INTERPOLATION_CAM_STEP
            );
            (self.grid_cams.clone(), INTERPOLATION_CAM_STEP)
        } else {
            self.spline = None;
            self.log_excitation.clear();
            self.grid_cams.clear();
            (native_cams, settings.cam_step)
        };

        let mut output = SignalBank::new(
            input.n_sources(),
            input.n_ears(),
            output_cams.len(),
            1,
            input.fs(),
        );
        output.set_frame_rate(input.frame_rate());
        output.set_channel_spacing_in_cams(spacing);
        output.set_centre_frequencies(output_cams.iter().map(|&c| cam_to_hz(c)).collect());

        Ok(output)
    }

    fn process(&mut self, input: &SignalBank, output: &mut SignalBank) {
        for src in 0..input.n_sources() {
            for ear in 0..input.n_ears() {
                let spectrum = input.channels(src, ear);

                if self.spline.is_some() {
                    for i in 0..self.n_filters {
                        let excitation = self.filter_excitation(i, spectrum);
                        self.log_excitation[i] = (excitation + LOG_EXCITATION_FLOOR).ln();
                    }

                    if let Some(spline) = self.spline.as_mut() {
                        spline.fit(&self.log_excitation);
                        let out = output.channels_mut(src, ear);
                        spline.evaluate_into(&self.grid_cams, out);
                        for value in out.iter_mut() {
                            *value = value.exp();
                        }
                    }
                } else {
                    for i in 0..self.n_filters {
                        let excitation = self.filter_excitation(i, spectrum);
                        output.set_sample(src, ear, i, 0, excitation);
                    }
                }
            }
        }
    }
}

impl ExcitationFilterbank for DoubleRoexBank {
    fn n_output_channels(&self) -> usize {
        if self.spline.is_some() {
            INTERPOLATION_POINTS
        } else {
            self.n_filters
        }
    }
}

/// Index of the native filter closest to `freq` Hz
pub fn nearest_filter(settings: &DoubleRoexSettings, freq: f64) -> usize {
    let idx = ((hz_to_cam(freq) - settings.cam_lo) / settings.cam_step).round();
    idx.clamp(0.0, (settings.n_filters() - 1) as f64) as usize
}
