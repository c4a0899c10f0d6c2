//! Error types for auditory model construction
//!
//! Every variant is a configuration error detected while a stage or model is
//! being initialised. Numerical edge cases met while processing frames are
//! clamped in place (see [`crate::units`]) and never surface here.

use thiserror::Error;

/// Result type for auditory model operations
pub type Result<T> = std::result::Result<T, AuditoryError>;

/// Errors that can occur while building an auditory model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuditoryError {
    /// Input channels carry no centre frequencies
    #[error("Input channels have no centre frequencies")]
    MissingCentreFrequencies,

    /// Centre frequencies must be strictly ascending
    #[error(
        "Centre frequencies not ascending at channel {index}: {current_hz} Hz follows {previous_hz} Hz"
    )]
    CentreFrequenciesNotAscending {
        index: usize,
        previous_hz: f64,
        current_hz: f64,
    },

    /// Channel spacing on the Cam scale has not been set
    #[error("Channel spacing (in Cam units) not set")]
    ChannelSpacingNotSet,

    /// Too few input channels for the stage
    #[error("Insufficient number of input channels: {found} (need at least {required})")]
    InsufficientChannels { required: usize, found: usize },

    /// Stage requires a specific number of ears
    #[error("Invalid ear count: {found} (this stage requires {expected})")]
    InvalidEarCount { expected: usize, found: usize },

    /// Spectrum frames carry one power value per channel
    #[error("Invalid sample count per channel: {found} (this stage requires {expected})")]
    InvalidSampleCount { expected: usize, found: usize },

    /// A human has no more than two ears
    #[error("Too many ears: {0} (must be 1 or 2)")]
    TooManyEars(usize),

    /// Filterbank Cam range is empty or inverted
    #[error("Invalid Cam range: lo {lo}, hi {hi}")]
    InvalidCamRange { lo: f64, hi: f64 },

    /// Filterbank Cam step must be positive
    #[error("Invalid Cam step: {0} (must be positive)")]
    InvalidCamStep(f64),

    /// Attack/release time constants must be positive
    #[error("Invalid {name} time constant: {value} s (must be positive)")]
    InvalidTimeConstant { name: &'static str, value: f64 },

    /// Frame rate of the input must be positive
    #[error("Invalid frame rate: {0} Hz (must be positive)")]
    InvalidFrameRate(f64),

    /// Model used before `initialize`
    #[error("Model has not been initialised")]
    NotInitialized,

    /// Settings could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for AuditoryError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
