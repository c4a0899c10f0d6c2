//! Stage trait implemented by every processing module of a loudness model

use crate::error::Result;
use crate::signal_bank::SignalBank;

/// A single processing stage in a loudness model
///
/// Stages are configured once from the shape and metadata of their input and
/// then fed frame after frame. The output bank is owned by the caller (usually
/// a [`crate::Pipeline`]) so that successive stages can read their
/// predecessor's output while writing their own.
///
/// # Implementation Requirements
/// 1. `initialize()` builds every table the stage needs and returns the output
///    bank it will write into. Configuration problems are returned here.
/// 2. `process()` never allocates and never fails; numerical edge cases are
///    clamped in place.
/// 3. `reset()` clears internal state other than the output bank (which the
///    owner clears).
pub trait Stage: Send {
    /// Stage name (for logging and introspection)
    fn name(&self) -> &'static str;

    /// Configure the stage against the first input frame
    ///
    /// # Returns
    /// A zeroed output bank with the shape and metadata this stage produces
    fn initialize(&mut self, input: &SignalBank) -> Result<SignalBank>;

    /// Process one frame of fresh input into `output`
    fn process(&mut self, input: &SignalBank, output: &mut SignalBank);

    /// Reset internal state
    fn reset(&mut self) {}
}

/// Marker for stages that map a power spectrum onto an excitation pattern
///
/// Alternative filterbank variants implement this so a model builder can
/// substitute one for another.
pub trait ExcitationFilterbank: Stage {
    /// Number of filters in the output excitation pattern
    fn n_output_channels(&self) -> usize;
}
