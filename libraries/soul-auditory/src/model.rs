//! Dynamic loudness model builder
//!
//! Assembles the stages of a time-varying loudness model into a
//! [`Pipeline`] once the shape of the input spectrum is known:
//!
//! ```text
//! power spectrum
//!   ─► DoubleRoexBank            (ExcitationPattern)
//!   ─► SpecificLoudness          (ChenHu2012 skips this stage)
//!   ─► [BinauralInhibition]      (SpecificLoudnessPattern)
//!   ─► InstantaneousLoudness     (InstantaneousLoudness)
//!   ─► ArAverager                (ShortTermLoudness)
//!   ─► ArAverager                (LongTermLoudness)
//! ```
//!
//! Binaural inhibition is inserted only when it is enabled and the input has
//! two ears. Its 0.75 compensation (on C, or on the excitation scaling for
//! ChenHu2012) follows the same decision.
//!
//! # Example
//!
//! ```rust
//! use soul_auditory::{auditory, DynamicLoudnessModel, ModelOutput, ModelPreset, SignalBank};
//!
//! let freqs: Vec<f64> = (1..=200).map(|i| auditory::cam_to_hz(i as f64 * 0.2)).collect();
//! let mut spectrum = SignalBank::spectrum(1, freqs, 32000.0, 1000.0);
//! spectrum.channels_mut(0, 0).fill(1e4);
//!
//! let mut model = DynamicLoudnessModel::new(ModelPreset::MooreGlasbergStone2003);
//! model.initialize(&spectrum).unwrap();
//! model.process(&spectrum).unwrap();
//!
//! let stl = model.loudness(ModelOutput::ShortTermLoudness, 0).unwrap();
//! assert!(stl > 0.0);
//! ```

use crate::auditory::sone_to_phon;
use crate::binaural::BinauralInhibition;
use crate::double_roex::{DoubleRoexBank, DoubleRoexSettings};
use crate::error::{AuditoryError, Result};
use crate::instantaneous::InstantaneousLoudness;
use crate::pipeline::Pipeline;
use crate::settings::ModelSettings;
use crate::signal_bank::SignalBank;
use crate::smoother::ArAverager;
use crate::specific_loudness::{SpecificLoudness, BINAURAL_INHIBITION_COMPENSATION};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Excitation scaling that turns double-roex excitation into specific
/// loudness directly (Chen & Hu, 2012)
pub const CHEN_HU_EXCITATION_SCALING: f64 = 1.53e-8;

/// Time constant (s) of a per-millisecond smoothing coefficient
fn per_millisecond(coefficient: f64) -> f64 {
    -0.001 / (1.0 - coefficient).ln()
}

/// Attack and release times (s) of the short- and long-term smoothers
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SmoothingTimes {
    pub short_term_attack: f64,
    pub short_term_release: f64,
    pub long_term_attack: f64,
    pub long_term_release: f64,
}

impl SmoothingTimes {
    /// Glasberg & Moore (2002)
    pub fn glasberg_moore_2002() -> Self {
        Self {
            short_term_attack: per_millisecond(0.045),
            short_term_release: per_millisecond(0.02),
            long_term_attack: per_millisecond(0.01),
            long_term_release: per_millisecond(0.0005),
        }
    }

    /// Moore, Glasberg & Stone (2003): faster long-term release
    pub fn moore_glasberg_stone_2003() -> Self {
        Self {
            long_term_release: per_millisecond(0.005),
            ..Self::glasberg_moore_2002()
        }
    }

    /// Chen & Hu (2012)
    pub fn chen_hu_2012() -> Self {
        Self {
            short_term_attack: 0.016,
            short_term_release: 0.032,
            long_term_attack: 0.1,
            long_term_release: 2.0,
        }
    }
}

/// Published parameter sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum ModelPreset {
    /// Glasberg & Moore (2002), 1997 high-level law
    #[serde(rename = "gm2002")]
    GlasbergMoore2002,
    /// Glasberg & Moore (2002) with the 2003 long-term release and the ANSI
    /// S3.4-2007 high-level law
    #[default]
    #[serde(rename = "mgs2003")]
    MooreGlasbergStone2003,
    /// Chen & Hu (2012): scaled excitation used as specific loudness
    #[serde(rename = "ch2012")]
    ChenHu2012,
}

impl ModelPreset {
    pub fn name(&self) -> &'static str {
        match self {
            ModelPreset::GlasbergMoore2002 => "GM2002",
            ModelPreset::MooreGlasbergStone2003 => "MGS2003",
            ModelPreset::ChenHu2012 => "CH2012",
        }
    }

    /// Filterbank settings of the preset (before binaural compensation)
    pub fn filterbank(&self) -> DoubleRoexSettings {
        match self {
            ModelPreset::GlasbergMoore2002 | ModelPreset::MooreGlasbergStone2003 => {
                DoubleRoexSettings {
                    cam_step: 0.25,
                    ..DoubleRoexSettings::new()
                }
            }
            ModelPreset::ChenHu2012 => DoubleRoexSettings {
                scaling_factor: CHEN_HU_EXCITATION_SCALING,
                ..DoubleRoexSettings::faster()
            },
        }
    }

    pub fn smoothing_times(&self) -> SmoothingTimes {
        match self {
            ModelPreset::GlasbergMoore2002 => SmoothingTimes::glasberg_moore_2002(),
            ModelPreset::MooreGlasbergStone2003 => SmoothingTimes::moore_glasberg_stone_2003(),
            ModelPreset::ChenHu2012 => SmoothingTimes::chen_hu_2012(),
        }
    }

    /// Whether the ANSI S3.4-2007 high-level law is the preset's default
    pub fn ansi_s3_4_2007(&self) -> bool {
        !matches!(self, ModelPreset::GlasbergMoore2002)
    }

    /// Whether excitation passes through the compressive specific loudness law
    pub fn uses_compressive_law(&self) -> bool {
        !matches!(self, ModelPreset::ChenHu2012)
    }
}

/// Observable intermediate results of the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelOutput {
    ExcitationPattern,
    SpecificLoudnessPattern,
    InstantaneousLoudness,
    ShortTermLoudness,
    LongTermLoudness,
}

impl ModelOutput {
    pub const ALL: [ModelOutput; 5] = [
        ModelOutput::ExcitationPattern,
        ModelOutput::SpecificLoudnessPattern,
        ModelOutput::InstantaneousLoudness,
        ModelOutput::ShortTermLoudness,
        ModelOutput::LongTermLoudness,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModelOutput::ExcitationPattern => "ExcitationPattern",
            ModelOutput::SpecificLoudnessPattern => "SpecificLoudnessPattern",
            ModelOutput::InstantaneousLoudness => "InstantaneousLoudness",
            ModelOutput::ShortTermLoudness => "ShortTermLoudness",
            ModelOutput::LongTermLoudness => "LongTermLoudness",
        }
    }
}

/// Time-varying loudness model
pub struct DynamicLoudnessModel {
    settings: ModelSettings,
    pipeline: Pipeline,
    outputs: HashMap<ModelOutput, usize>,
    binaural_inhibition_used: bool,
}

impl DynamicLoudnessModel {
    /// Create a model from a preset with default presentation settings
    pub fn new(preset: ModelPreset) -> Self {
        Self {
            settings: ModelSettings::for_preset(preset),
            pipeline: Pipeline::new(),
            outputs: HashMap::new(),
            binaural_inhibition_used: false,
        }
    }

    /// Create a model from validated settings
    pub fn from_settings(settings: &ModelSettings) -> Result<Self> {
        settings.validate()?;
        let mut model = Self::new(settings.preset);
        model.settings = settings.clone();
        Ok(model)
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// Builder-style presentation mode
    pub fn with_diotic(mut self, diotic: bool) -> Self {
        self.settings.diotic = diotic;
        self
    }

    /// Builder-style binaural inhibition switch
    pub fn with_binaural_inhibition(mut self, enabled: bool) -> Self {
        self.settings.binaural_inhibition = enabled;
        self
    }

    /// Build and initialise the stage chain against the first input frame
    ///
    /// Any previous chain is discarded.
    pub fn initialize(&mut self, input: &SignalBank) -> Result<()> {
        self.pipeline = Pipeline::new();
        self.outputs.clear();
        self.binaural_inhibition_used = false;

        self.settings.validate()?;

        let n_ears = input.n_ears();
        if n_ears == 0 || n_ears > 2 {
            return Err(AuditoryError::TooManyEars(n_ears));
        }

        let preset = self.settings.preset;
        let binaural = self.settings.binaural_inhibition && n_ears == 2;
        if self.settings.binaural_inhibition && !binaural {
            debug!("DynamicLoudnessModel: single ear input; no binaural inhibition");
        }

        let mut pipeline = Pipeline::new();
        let mut outputs = HashMap::new();

        let mut filterbank = self.settings.filterbank();
        if binaural && !preset.uses_compressive_law() {
            filterbank.scaling_factor /= BINAURAL_INHIBITION_COMPENSATION;
        }
        pipeline.add_stage(Box::new(DoubleRoexBank::new(filterbank)));
        outputs.insert(ModelOutput::ExcitationPattern, pipeline.len() - 1);

        if preset.uses_compressive_law() {
            let mut specific = SpecificLoudness::new(self.settings.ansi_s3_4_2007(), binaural);
            if let Some(c) = self.settings.parameter_c {
                specific.set_parameter_c(c);
            }
            pipeline.add_stage(Box::new(specific));
        }

        if binaural {
            pipeline.add_stage(Box::new(BinauralInhibition::new()));
        }
        outputs.insert(ModelOutput::SpecificLoudnessPattern, pipeline.len() - 1);

        pipeline.add_stage(Box::new(InstantaneousLoudness::new(
            self.settings.output_scaling,
            self.settings.diotic,
        )));
        outputs.insert(ModelOutput::InstantaneousLoudness, pipeline.len() - 1);

        let times = self.settings.smoothing_times();
        pipeline.add_stage(Box::new(ArAverager::new(
            times.short_term_attack,
            times.short_term_release,
        )));
        outputs.insert(ModelOutput::ShortTermLoudness, pipeline.len() - 1);

        pipeline.add_stage(Box::new(ArAverager::new(
            times.long_term_attack,
            times.long_term_release,
        )));
        outputs.insert(ModelOutput::LongTermLoudness, pipeline.len() - 1);

        pipeline.initialize(input)?;

        info!(
            "DynamicLoudnessModel: {} initialised with stages {:?}",
            preset.name(),
            pipeline.stage_names()
        );

        self.pipeline = pipeline;
        self.outputs = outputs;
        self.binaural_inhibition_used = binaural;
        Ok(())
    }

    /// Process one power spectrum frame
    pub fn process(&mut self, input: &SignalBank) -> Result<()> {
        self.pipeline.process(input)
    }

    /// Clear all outputs and smoother state
    pub fn reset(&mut self) {
        self.pipeline.reset();
    }

    pub fn is_initialized(&self) -> bool {
        self.pipeline.is_initialized()
    }

    /// Whether binaural inhibition was inserted at the last `initialize`
    pub fn binaural_inhibition_used(&self) -> bool {
        self.binaural_inhibition_used
    }

    /// Names of the stages in processing order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.pipeline.stage_names()
    }

    /// Output bank of an intermediate result
    pub fn output(&self, which: ModelOutput) -> Option<&SignalBank> {
        if !self.pipeline.is_initialized() {
            return None;
        }
        self.outputs
            .get(&which)
            .and_then(|&idx| self.pipeline.output(idx))
    }

    /// Latest scalar loudness (sones) of `ear` for a single-channel output
    ///
    /// Returns `None` for multi-channel outputs such as patterns.
    pub fn loudness(&self, which: ModelOutput, ear: usize) -> Option<f64> {
        let bank = self.output(which)?;
        if bank.n_channels() != 1 || ear >= bank.n_ears() {
            return None;
        }
        bank.signal(0, ear, 0).last().copied()
    }

    /// Latest loudness level (phons) of `ear` for a single-channel output
    pub fn loudness_level(&self, which: ModelOutput, ear: usize) -> Option<f64> {
        self.loudness(which, ear)
            .map(|sones| sone_to_phon(sones, self.settings.ansi_s3_4_2007()))
    }
}
