//! Model settings loaded from file and environment
//!
//! Settings name a [`ModelPreset`] plus optional overrides of the preset's
//! filterbank, specific loudness and smoothing parameters. Anything left
//! unset falls back to the preset.
//!
//! ```toml
//! preset = "ch2012"
//! diotic = false
//! cam_step = 0.5
//! long_term_release = 1.5
//! ```
//!
//! Environment variables prefixed with `AUDITORY_` override the file, e.g.
//! `AUDITORY_PRESET=mgs2003` or `AUDITORY_BINAURAL_INHIBITION=false`.

use crate::double_roex::DoubleRoexSettings;
use crate::error::{AuditoryError, Result};
use crate::model::{ModelPreset, SmoothingTimes};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of a [`crate::DynamicLoudnessModel`]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelSettings {
    #[serde(default)]
    pub preset: ModelPreset,

    /// Sound presented identically to both ears
    #[serde(default = "default_diotic")]
    pub diotic: bool,

    /// Apply binaural inhibition when the input has two ears
    #[serde(default = "default_binaural_inhibition")]
    pub binaural_inhibition: bool,

    /// Scale applied to instantaneous loudness
    #[serde(default = "default_output_scaling")]
    pub output_scaling: f64,

    #[serde(default)]
    pub cam_lo: Option<f64>,

    #[serde(default)]
    pub cam_hi: Option<f64>,

    #[serde(default)]
    pub cam_step: Option<f64>,

    #[serde(default)]
    pub interpolate: Option<bool>,

    #[serde(default)]
    pub interpolation_cubic: Option<bool>,

    /// Use the ANSI S3.4-2007 high-level specific loudness law
    #[serde(default)]
    pub ansi_s3_4_2007: Option<bool>,

    /// Override of the specific loudness constant C
    #[serde(default)]
    pub parameter_c: Option<f64>,

    #[serde(default)]
    pub short_term_attack: Option<f64>,

    #[serde(default)]
    pub short_term_release: Option<f64>,

    #[serde(default)]
    pub long_term_attack: Option<f64>,

    #[serde(default)]
    pub long_term_release: Option<f64>,
}

impl ModelSettings {
    /// Settings of a preset with no overrides
    pub fn for_preset(preset: ModelPreset) -> Self {
        Self {
            preset,
            diotic: default_diotic(),
            binaural_inhibition: default_binaural_inhibition(),
            output_scaling: default_output_scaling(),
            cam_lo: None,
            cam_hi: None,
            cam_step: None,
            interpolate: None,
            interpolation_cubic: None,
            ansi_s3_4_2007: None,
            parameter_c: None,
            short_term_attack: None,
            short_term_release: None,
            long_term_attack: None,
            long_term_release: None,
        }
    }

    /// Load settings from an optional TOML file, then `AUDITORY_*`
    /// environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(AuditoryError::Config(format!(
                    "Settings file not found: {:?}",
                    path
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("AUDITORY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Filterbank configuration after applying overrides
    pub fn filterbank(&self) -> DoubleRoexSettings {
        let base = self.preset.filterbank();
        DoubleRoexSettings {
            cam_lo: self.cam_lo.unwrap_or(base.cam_lo),
            cam_hi: self.cam_hi.unwrap_or(base.cam_hi),
            cam_step: self.cam_step.unwrap_or(base.cam_step),
            scaling_factor: base.scaling_factor,
            interpolate: self.interpolate.unwrap_or(base.interpolate),
            interpolation_cubic: self.interpolation_cubic.unwrap_or(base.interpolation_cubic),
        }
    }

    /// Smoothing time constants after applying overrides
    pub fn smoothing_times(&self) -> SmoothingTimes {
        let base = self.preset.smoothing_times();
        SmoothingTimes {
            short_term_attack: self.short_term_attack.unwrap_or(base.short_term_attack),
            short_term_release: self.short_term_release.unwrap_or(base.short_term_release),
            long_term_attack: self.long_term_attack.unwrap_or(base.long_term_attack),
            long_term_release: self.long_term_release.unwrap_or(base.long_term_release),
        }
    }

    /// Whether the ANSI S3.4-2007 high-level law is used
    pub fn ansi_s3_4_2007(&self) -> bool {
        self.ansi_s3_4_2007
            .unwrap_or_else(|| self.preset.ansi_s3_4_2007())
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        let filterbank = self.filterbank();
        if filterbank.cam_step.is_nan() || filterbank.cam_step <= 0.0 {
            return Err(AuditoryError::InvalidCamStep(filterbank.cam_step));
        }
        if filterbank.cam_lo.is_nan()
            || filterbank.cam_hi.is_nan()
            || filterbank.cam_hi <= filterbank.cam_lo
        {
            return Err(AuditoryError::InvalidCamRange {
                lo: filterbank.cam_lo,
                hi: filterbank.cam_hi,
            });
        }

        let times = self.smoothing_times();
        for (name, value) in [
            ("short-term attack", times.short_term_attack),
            ("short-term release", times.short_term_release),
            ("long-term attack", times.long_term_attack),
            ("long-term release", times.long_term_release),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(AuditoryError::InvalidTimeConstant { name, value });
            }
        }

        if !self.output_scaling.is_finite() {
            return Err(AuditoryError::Config(format!(
                "Output scaling must be finite, got {}",
                self.output_scaling
            )));
        }

        Ok(())
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::for_preset(ModelPreset::default())
    }
}

// Default values
fn default_diotic() -> bool {
    true
}

fn default_binaural_inhibition() -> bool {
    true
}

fn default_output_scaling() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_values_without_overrides() {
        let settings = ModelSettings::for_preset(ModelPreset::ChenHu2012);
        assert_eq!(settings.filterbank(), ModelPreset::ChenHu2012.filterbank());
        assert_eq!(settings.smoothing_times(), ModelPreset::ChenHu2012.smoothing_times());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_overrides_apply() {
        let mut settings = ModelSettings::for_preset(ModelPreset::GlasbergMoore2002);
        settings.cam_step = Some(0.5);
        settings.long_term_release = Some(1.5);
        settings.ansi_s3_4_2007 = Some(true);

        assert_eq!(settings.filterbank().cam_step, 0.5);
        assert_eq!(settings.filterbank().cam_lo, 1.5);
        assert_eq!(settings.smoothing_times().long_term_release, 1.5);
        assert!(settings.ansi_s3_4_2007());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = ModelSettings::default();
        settings.cam_step = Some(0.0);
        assert_eq!(settings.validate(), Err(AuditoryError::InvalidCamStep(0.0)));

        let mut settings = ModelSettings::default();
        settings.cam_lo = Some(30.0);
        settings.cam_hi = Some(10.0);
        assert!(matches!(
            settings.validate(),
            Err(AuditoryError::InvalidCamRange { .. })
        ));

        let mut settings = ModelSettings::default();
        settings.short_term_release = Some(-0.1);
        assert!(matches!(
            settings.validate(),
            Err(AuditoryError::InvalidTimeConstant {
                name: "short-term release",
                ..
            })
        ));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = ModelSettings::load(Some(Path::new("/nonexistent/auditory.toml")));
        assert!(matches!(result, Err(AuditoryError::Config(_))));
    }
}
