//! Multi-dimensional frame container passed between model stages
//!
//! A `SignalBank` holds real samples organised by
//! `(source, ear, channel, sample)`, stored contiguously in that order so the
//! channels of one source/ear pair form a single slice when there is one
//! sample per channel (the usual case for spectral frames).
//!
//! Alongside the data it carries the metadata stages need to configure
//! themselves: sampling rate, frame rate, a trigger flag telling downstream
//! stages whether the frame holds fresh data, optional per-channel centre
//! frequencies and an optional channel spacing on the Cam scale.

use crate::error::{AuditoryError, Result};

/// Rectangular frame of samples shared between pipeline stages
#[derive(Debug, Clone, PartialEq)]
pub struct SignalBank {
    n_sources: usize,
    n_ears: usize,
    n_channels: usize,
    n_samples: usize,
    /// Sampling rate of the underlying audio (Hz)
    fs: f64,
    /// Rate at which fresh frames arrive (Hz)
    frame_rate: f64,
    /// True when the frame holds freshly computed data
    trigger: bool,
    centre_freqs: Option<Vec<f64>>,
    channel_spacing_in_cams: Option<f64>,
    data: Vec<f64>,
}

impl SignalBank {
    /// Create a zeroed bank
    ///
    /// The frame rate defaults to `fs / n_samples`, i.e. a new frame every
    /// block of samples.
    pub fn new(
        n_sources: usize,
        n_ears: usize,
        n_channels: usize,
        n_samples: usize,
        fs: f64,
    ) -> Self {
        let frame_rate = if n_samples > 0 {
            fs / n_samples as f64
        } else {
            fs
        };

        Self {
            n_sources,
            n_ears,
            n_channels,
            n_samples,
            fs,
            frame_rate,
            trigger: true,
            centre_freqs: None,
            channel_spacing_in_cams: None,
            data: vec![0.0; n_sources * n_ears * n_channels * n_samples],
        }
    }

    /// Create a single-source, single-sample spectral frame with the given
    /// channel centre frequencies
    pub fn spectrum(n_ears: usize, centre_freqs: Vec<f64>, fs: f64, frame_rate: f64) -> Self {
        let mut bank = Self::new(1, n_ears, centre_freqs.len(), 1, fs);
        bank.frame_rate = frame_rate;
        bank.centre_freqs = Some(centre_freqs);
        bank
    }

    /// Create a zeroed bank with the same shape and metadata as `other`
    pub fn with_shape_of(other: &SignalBank) -> Self {
        Self {
            n_sources: other.n_sources,
            n_ears: other.n_ears,
            n_channels: other.n_channels,
            n_samples: other.n_samples,
            fs: other.fs,
            frame_rate: other.frame_rate,
            trigger: true,
            centre_freqs: other.centre_freqs.clone(),
            channel_spacing_in_cams: other.channel_spacing_in_cams,
            data: vec![0.0; other.data.len()],
        }
    }

    pub fn n_sources(&self) -> usize {
        self.n_sources
    }

    pub fn n_ears(&self) -> usize {
        self.n_ears
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn fs(&self) -> f64 {
        self.fs
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    pub fn set_frame_rate(&mut self, frame_rate: f64) {
        self.frame_rate = frame_rate;
    }

    pub fn trigger(&self) -> bool {
        self.trigger
    }

    pub fn set_trigger(&mut self, trigger: bool) {
        self.trigger = trigger;
    }

    /// Channel spacing in Cams, if the channels are uniformly spaced
    pub fn channel_spacing_in_cams(&self) -> Option<f64> {
        self.channel_spacing_in_cams
    }

    pub fn set_channel_spacing_in_cams(&mut self, spacing: f64) {
        self.channel_spacing_in_cams = Some(spacing);
    }

    /// All channel centre frequencies (Hz), if set
    pub fn centre_frequencies(&self) -> Option<&[f64]> {
        self.centre_freqs.as_deref()
    }

    /// Centre frequency of a single channel (Hz)
    pub fn centre_frequency(&self, channel: usize) -> Option<f64> {
        self.centre_freqs.as_ref().and_then(|f| f.get(channel).copied())
    }

    /// Set all channel centre frequencies
    ///
    /// # Panics
    /// Panics if the length does not match the channel count.
    pub fn set_centre_frequencies(&mut self, freqs: Vec<f64>) {
        assert_eq!(
            freqs.len(),
            self.n_channels,
            "centre frequency count must match channel count"
        );
        self.centre_freqs = Some(freqs);
    }

    /// Return the centre frequencies, checking they are strictly ascending
    pub fn ascending_centre_frequencies(&self) -> Result<&[f64]> {
        let freqs = self
            .centre_frequencies()
            .ok_or(AuditoryError::MissingCentreFrequencies)?;

        for (index, pair) in freqs.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(AuditoryError::CentreFrequenciesNotAscending {
                    index: index + 1,
                    previous_hz: pair[0],
                    current_hz: pair[1],
                });
            }
        }

        Ok(freqs)
    }

    #[inline]
    fn offset(&self, source: usize, ear: usize, channel: usize) -> usize {
        ((source * self.n_ears + ear) * self.n_channels + channel) * self.n_samples
    }

    /// Read a single sample
    #[inline]
    pub fn sample(&self, source: usize, ear: usize, channel: usize, sample: usize) -> f64 {
        self.data[self.offset(source, ear, channel) + sample]
    }

    /// Write a single sample
    #[inline]
    pub fn set_sample(
        &mut self,
        source: usize,
        ear: usize,
        channel: usize,
        sample: usize,
        value: f64,
    ) {
        let idx = self.offset(source, ear, channel) + sample;
        self.data[idx] = value;
    }

    /// Samples of one channel
    pub fn signal(&self, source: usize, ear: usize, channel: usize) -> &[f64] {
        let start = self.offset(source, ear, channel);
        &self.data[start..start + self.n_samples]
    }

    /// Mutable samples of one channel
    pub fn signal_mut(&mut self, source: usize, ear: usize, channel: usize) -> &mut [f64] {
        let start = self.offset(source, ear, channel);
        let len = self.n_samples;
        &mut self.data[start..start + len]
    }

    /// All channels of one source/ear pair (channel-major)
    ///
    /// For single-sample banks this is one value per channel.
    pub fn channels(&self, source: usize, ear: usize) -> &[f64] {
        let start = self.offset(source, ear, 0);
        &self.data[start..start + self.n_channels * self.n_samples]
    }

    /// Mutable view of all channels of one source/ear pair
    pub fn channels_mut(&mut self, source: usize, ear: usize) -> &mut [f64] {
        let start = self.offset(source, ear, 0);
        let len = self.n_channels * self.n_samples;
        &mut self.data[start..start + len]
    }

    /// Raw sample storage
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Zero all samples and mark the frame as fresh
    pub fn clear(&mut self) {
        self.data.fill(0.0);
        self.trigger = true;
    }
}
