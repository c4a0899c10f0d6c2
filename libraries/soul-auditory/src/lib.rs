//! Psychoacoustic loudness models for Soul Player
//!
//! This crate provides:
//! - A double-roex auditory filterbank mapping power spectra to excitation
//!   patterns on the Cam (ERB-number) scale
//! - The ANSI S3.4-2007 excitation to specific loudness transformation
//! - Binaural inhibition of specific loudness (Moore & Glasberg, 2007)
//! - Instantaneous, short-term and long-term loudness of time-varying sounds
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐     ┌────────────────┐     ┌───────────────────┐
//! │ Power spectrum │ ──► │ DoubleRoexBank │ ──► │ SpecificLoudness  │
//! └────────────────┘     └────────────────┘     └───────────────────┘
//!                                                         │
//!                                                         ▼
//! ┌────────────────┐     ┌────────────────┐     ┌───────────────────┐
//! │ Long-term      │ ◄── │ Short-term     │ ◄── │ Instantaneous     │
//! │ ArAverager     │     │ ArAverager     │     │ (+ binaural inh.) │
//! └────────────────┘     └────────────────┘     └───────────────────┘
//! ```
//!
//! Every stage implements [`Stage`] and exchanges [`SignalBank`] frames.
//! [`DynamicLoudnessModel`] assembles a published parameter set into a
//! [`Pipeline`].
//!
//! # Example
//!
//! ```ignore
//! use soul_auditory::{DynamicLoudnessModel, ModelOutput, ModelSettings};
//!
//! let settings = ModelSettings::load(Some(Path::new("auditory.toml")))?;
//! let mut model = DynamicLoudnessModel::from_settings(&settings)?;
//! model.initialize(&first_spectrum)?;
//!
//! for spectrum in spectra {
//!     model.process(&spectrum)?;
//!     let sones = model.loudness(ModelOutput::ShortTermLoudness, 0);
//! }
//! ```

#![deny(unsafe_code)]

pub mod auditory;
pub mod binaural;
pub mod double_roex;
mod error;
pub mod instantaneous;
pub mod interpolation;
pub mod model;
mod pipeline;
pub mod settings;
mod signal_bank;
pub mod smoother;
pub mod specific_loudness;
mod stage;
pub mod units;

pub use binaural::BinauralInhibition;
pub use double_roex::{DoubleRoexBank, DoubleRoexSettings};
pub use error::{AuditoryError, Result};
pub use instantaneous::InstantaneousLoudness;
pub use interpolation::{SplineInterpolator, SplineKind};
pub use model::{DynamicLoudnessModel, ModelOutput, ModelPreset, SmoothingTimes};
pub use pipeline::Pipeline;
pub use settings::ModelSettings;
pub use signal_bank::SignalBank;
pub use smoother::ArAverager;
pub use specific_loudness::SpecificLoudness;
pub use stage::{ExcitationFilterbank, Stage};
