//! Attack/release averaging of loudness trajectories
//!
//! A first-order recursive filter per (source, ear, channel) whose
//! coefficient depends on the direction of change:
//!
//! ```text
//! coef = 1 - exp(-1 / (frame_rate * time_constant))
//! y[n] = coef * (x[n] - y[n-1]) + y[n-1]
//! ```
//!
//! The attack coefficient is used while the input exceeds the previous
//! output, the release coefficient otherwise. The filter state is the last
//! sample of the output bank, so clearing the output (as the pipeline does on
//! reset) restarts the filter from zero.

use crate::error::{AuditoryError, Result};
use crate::signal_bank::SignalBank;
use crate::stage::Stage;
use tracing::debug;

/// Smoothing coefficient for a time constant (s) at a given frame rate (Hz)
#[inline]
pub fn smoothing_coefficient(frame_rate: f64, time_constant: f64) -> f64 {
    1.0 - (-1.0 / (frame_rate * time_constant)).exp()
}

/// Asymmetric exponential smoother
#[derive(Debug, Clone)]
pub struct ArAverager {
    attack_time: f64,
    release_time: f64,
    attack_coef: f64,
    release_coef: f64,
}

impl ArAverager {
    /// Create a smoother from attack and release time constants (seconds)
    pub fn new(attack_time: f64, release_time: f64) -> Self {
        Self {
            attack_time,
            release_time,
            attack_coef: 0.0,
            release_coef: 0.0,
        }
    }

    pub fn attack_time(&self) -> f64 {
        self.attack_time
    }

    pub fn release_time(&self) -> f64 {
        self.release_time
    }

    /// Attack coefficient (valid after `initialize`)
    pub fn attack_coefficient(&self) -> f64 {
        self.attack_coef
    }

    /// Release coefficient (valid after `initialize`)
    pub fn release_coefficient(&self) -> f64 {
        self.release_coef
    }

    /// Advance the filter by one sample from `previous`
    #[inline]
    pub fn step(&self, previous: f64, x: f64) -> f64 {
        let coef = if x > previous {
            self.attack_coef
        } else {
            self.release_coef
        };
        coef * (x - previous) + previous
    }
}

fn check_time_constant(name: &'static str, value: f64) -> Result<()> {
    if value.is_nan() || value <= 0.0 {
        return Err(AuditoryError::InvalidTimeConstant { name, value });
    }
    Ok(())
}

impl Stage for ArAverager {
    fn name(&self) -> &'static str {
        "ARAverager"
    }

    fn initialize(&mut self, input: &SignalBank) -> Result<SignalBank> {
        check_time_constant("attack", self.attack_time)?;
        check_time_constant("release", self.release_time)?;

        let frame_rate = input.frame_rate();
        if frame_rate.is_nan() || frame_rate <= 0.0 {
            return Err(AuditoryError::InvalidFrameRate(frame_rate));
        }

        self.attack_coef = smoothing_coefficient(frame_rate, self.attack_time);
        self.release_coef = smoothing_coefficient(frame_rate, self.release_time);

        debug!(
            "{}: Input frame rate: {}. Attack time: {}. Attack coefficient: {}. Release time: {}. Release coefficient: {}",
            self.name(),
            frame_rate,
            self.attack_time,
            self.attack_coef,
            self.release_time,
            self.release_coef
        );

        Ok(SignalBank::with_shape_of(input))
    }

    fn process(&mut self, input: &SignalBank, output: &mut SignalBank) {
        let n_samples = input.n_samples();
        if n_samples == 0 {
            return;
        }

        for src in 0..input.n_sources() {
            for ear in 0..input.n_ears() {
                for chn in 0..input.n_channels() {
                    let x = input.signal(src, ear, chn);
                    let y = output.signal_mut(src, ear, chn);
                    let mut previous = y[n_samples - 1];
                    for (out, &x) in y.iter_mut().zip(x) {
                        previous = self.step(previous, x);
                        *out = previous;
                    }
                }
            }
        }
    }
}
