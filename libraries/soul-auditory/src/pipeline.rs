//! Ordered chain of model stages
//!
//! The pipeline owns each stage together with the output bank that stage
//! writes into. Frames are pushed through depth-first: stage `i` reads the
//! output of stage `i - 1` (or the external input for the first stage).
//!
//! ```text
//! input ─► [stage 0] ─► out 0 ─► [stage 1] ─► out 1 ─► ... ─► out N-1
//! ```
//!
//! A stage whose input trigger is false does not recompute: its output keeps
//! the previous (stale) data and its trigger is lowered so the condition
//! propagates down the chain.

use crate::error::{AuditoryError, Result};
use crate::signal_bank::SignalBank;
use crate::stage::Stage;
use tracing::{debug, trace, warn};

/// Chain of stages processed in order
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    outputs: Vec<SignalBank>,
    initialized: bool,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            outputs: Vec::new(),
            initialized: false,
        }
    }

    /// Add a stage to the end of the chain
    ///
    /// Adding a stage invalidates any previous initialisation.
    pub fn add_stage(&mut self, stage: Box<dyn Stage>) {
        debug!("Pipeline: adding {} as stage {}", stage.name(), self.stages.len());
        self.stages.push(stage);
        self.initialized = false;
    }

    /// Initialise every stage against its predecessor's output
    ///
    /// On failure no stage output is kept and the pipeline stays
    /// uninitialised.
    pub fn initialize(&mut self, input: &SignalBank) -> Result<()> {
        if self.initialized {
            warn!("Pipeline: reinitialising ...");
        }
        self.initialized = false;

        let mut outputs: Vec<SignalBank> = Vec::with_capacity(self.stages.len());
        for stage in &mut self.stages {
            let output = {
                let previous = outputs.last().unwrap_or(input);
                stage.initialize(previous)?
            };
            debug!(
                "{}: initialised ({} ears x {} channels x {} samples)",
                stage.name(),
                output.n_ears(),
                output.n_channels(),
                output.n_samples()
            );
            outputs.push(output);
        }

        self.outputs = outputs;
        self.initialized = true;
        Ok(())
    }

    /// Push one input frame through the chain
    pub fn process(&mut self, input: &SignalBank) -> Result<()> {
        if !self.initialized {
            return Err(AuditoryError::NotInitialized);
        }

        for (idx, stage) in self.stages.iter_mut().enumerate() {
            let (before, rest) = self.outputs.split_at_mut(idx);
            let previous = before.last().unwrap_or(input);
            let output = &mut rest[0];

            if previous.trigger() {
                trace!("{}: processing", stage.name());
                output.set_trigger(true);
                stage.process(previous, output);
            } else {
                output.set_trigger(false);
            }
        }

        Ok(())
    }

    /// Clear all stage outputs and internal state
    pub fn reset(&mut self) {
        for (stage, output) in self.stages.iter_mut().zip(self.outputs.iter_mut()) {
            output.clear();
            stage.reset();
        }
    }

    /// Whether `initialize` has succeeded since the last structural change
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Output bank of the stage at `index`
    pub fn output(&self, index: usize) -> Option<&SignalBank> {
        self.outputs.get(index)
    }

    /// Output bank of the final stage
    pub fn last_output(&self) -> Option<&SignalBank> {
        self.outputs.last()
    }

    /// Names of the stages in processing order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Get number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if pipeline is empty
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Adds a constant and counts how often it ran
    struct Offset {
        offset: f64,
        runs: usize,
    }

    impl Stage for Offset {
        fn name(&self) -> &'static str {
            "Offset"
        }

        fn initialize(&mut self, input: &SignalBank) -> Result<SignalBank> {
            if input.n_channels() == 0 {
                return Err(AuditoryError::InsufficientChannels {
                    required: 1,
                    found: 0,
                });
            }
            Ok(SignalBank::with_shape_of(input))
        }

        fn process(&mut self, input: &SignalBank, output: &mut SignalBank) {
            self.runs += 1;
            for (out, x) in output.channels_mut(0, 0).iter_mut().zip(input.channels(0, 0)) {
                *out = x + self.offset;
            }
        }

        fn reset(&mut self) {
            self.runs = 0;
        }
    }

    fn offset(offset: f64) -> Box<dyn Stage> {
        Box::new(Offset { offset, runs: 0 })
    }

    #[test]
    fn empty_pipeline() {
        let pipeline = Pipeline::new();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.len(), 0);
        assert!(pipeline.last_output().is_none());
    }

    #[test]
    fn process_before_initialize_fails() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(offset(1.0));
        let input = SignalBank::new(1, 1, 2, 1, 1000.0);
        assert_eq!(pipeline.process(&input), Err(AuditoryError::NotInitialized));
    }

    #[test]
    fn process_chain() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(offset(1.0));
        pipeline.add_stage(offset(10.0));

        let mut input = SignalBank::new(1, 1, 2, 1, 1000.0);
        input.channels_mut(0, 0).copy_from_slice(&[0.5, 1.5]);

        pipeline.initialize(&input).unwrap();
        pipeline.process(&input).unwrap();

        assert_eq!(pipeline.stage_names(), vec!["Offset", "Offset"]);
        assert_eq!(pipeline.output(0).unwrap().channels(0, 0), &[1.5, 2.5]);
        assert_eq!(pipeline.last_output().unwrap().channels(0, 0), &[11.5, 12.5]);
    }

    #[test]
    fn untriggered_input_leaves_outputs_stale() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(offset(1.0));
        pipeline.add_stage(offset(1.0));

        let mut input = SignalBank::new(1, 1, 1, 1, 1000.0);
        pipeline.initialize(&input).unwrap();

        input.set_sample(0, 0, 0, 0, 5.0);
        pipeline.process(&input).unwrap();
        assert_eq!(pipeline.last_output().unwrap().sample(0, 0, 0, 0), 7.0);

        input.set_sample(0, 0, 0, 0, 100.0);
        input.set_trigger(false);
        pipeline.process(&input).unwrap();

        let last = pipeline.last_output().unwrap();
        assert!(!last.trigger());
        assert_eq!(last.sample(0, 0, 0, 0), 7.0);
        assert!(!pipeline.output(0).unwrap().trigger());
    }

    #[test]
    fn failed_initialize_leaves_pipeline_unusable() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(offset(1.0));
        let input = SignalBank::new(1, 1, 0, 1, 1000.0);
        assert!(pipeline.initialize(&input).is_err());
        assert!(!pipeline.is_initialized());
        assert!(pipeline.output(0).is_none());
    }

    #[test]
    fn reset_clears_outputs() {
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(offset(2.0));
        let input = SignalBank::new(1, 1, 1, 1, 1000.0);
        pipeline.initialize(&input).unwrap();
        pipeline.process(&input).unwrap();
        assert_eq!(pipeline.last_output().unwrap().sample(0, 0, 0, 0), 2.0);

        pipeline.reset();
        assert_eq!(pipeline.last_output().unwrap().sample(0, 0, 0, 0), 0.0);
    }
}
