//! Spectrum
//!
//! Stream-based magnitude spectrum for real-time audio: collects fixed-size
//! PCM frames in a circular buffer and, once per hop, returns a
//! Blackman-windowed FFT magnitude snapshot ready for the tracker.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::{f32::consts::PI, sync::Arc};
use thiserror::Error;

/// Errors returned by the spectrum analyzer.
#[derive(Debug, Error)]
pub enum SpectrumError {
    /// Frame received was not of the expected size.
    #[error("expected frame of length {expected}, got {got}")]
    InvalidFrameSize {
        /// The expected size of the audio frame.
        expected: usize,
        /// The actual size of the received audio frame.
        got: usize,
    },

    /// An error occurred during the configuration of the analyzer.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Builder for a [`SpectrumAnalyzer`].
pub struct SpectrumAnalyzerBuilder {
    frame_size: usize,
    sampling_rate: usize,
    fft_size: usize,
    hop_size: Option<usize>,
}

impl SpectrumAnalyzerBuilder {
    /// Start with default parameters:
    /// frame_size = 1024, sampling_rate = 44_100,
    /// fft_size = 8192 (4096 bins), hop_size = fft_size / 2.
    pub fn new() -> Self {
        SpectrumAnalyzerBuilder {
            frame_size: 1024,
            sampling_rate: 44_100,
            fft_size: 8192,
            hop_size: None,
        }
    }

    /// Set the frame size for audio processing.
    pub fn frame_size(mut self, size: usize) -> Self {
        self.frame_size = size;
        self
    }

    /// Set the sampling rate of the audio.
    pub fn sampling_rate(mut self, rate: usize) -> Self {
        self.sampling_rate = rate;
        self
    }

    /// Set the FFT length; the spectrum has half as many bins.
    pub fn fft_size(mut self, size: usize) -> Self {
        self.fft_size = size;
        self
    }

    /// Set how many samples must arrive between two spectra.
    pub fn hop_size(mut self, size: usize) -> Self {
        self.hop_size = Some(size);
        self
    }

    /// Finalize and create the analyzer.
    pub fn build(self) -> Result<SpectrumAnalyzer, SpectrumError> {
        if self.frame_size == 0 {
            return Err(SpectrumError::Configuration("frame_size cannot be zero".into()));
        }
        if self.sampling_rate == 0 {
            return Err(SpectrumError::Configuration("sampling_rate cannot be zero".into()));
        }
        if self.fft_size < 4 || !self.fft_size.is_multiple_of(2) {
            return Err(SpectrumError::Configuration(
                "fft_size must be an even number of at least 4".into(),
            ));
        }
        let hop_size = self.hop_size.unwrap_or(self.fft_size / 2);
        if hop_size == 0 {
            return Err(SpectrumError::Configuration("hop_size cannot be zero".into()));
        }

        // Prepare FFT plan once
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(self.fft_size);

        let window = make_blackman_window(self.fft_size);
        // Scale so a full-scale sine on a bin centre reads ~1.0
        let gain = 2.0 / window.iter().sum::<f32>();

        Ok(SpectrumAnalyzer {
            buffer: vec![0.0; self.fft_size],
            head: 0,
            fft_buffer: vec![Complex { re: 0.0, im: 0.0 }; self.fft_size],
            magnitude: vec![0.0; self.fft_size / 2],
            window,
            gain,
            frame_size: self.frame_size,
            sampling_rate: self.sampling_rate,
            hop_size,
            samples_since_last: 0,
            fft,
        })
    }
}

impl Default for SpectrumAnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Streaming magnitude-spectrum calculator.
pub struct SpectrumAnalyzer {
    buffer: Vec<f32>,
    head: usize,
    fft_buffer: Vec<Complex<f32>>,
    magnitude: Vec<f32>,
    window: Vec<f32>,
    gain: f32,
    frame_size: usize,
    sampling_rate: usize,
    hop_size: usize,
    samples_since_last: usize,
    fft: Arc<dyn Fft<f32>>,
}

impl SpectrumAnalyzer {
    /// Start customizing with a builder.
    pub fn builder() -> SpectrumAnalyzerBuilder {
        SpectrumAnalyzerBuilder::new()
    }

    /// Number of bins in each returned spectrum.
    pub fn bins(&self) -> usize {
        self.magnitude.len()
    }

    /// Frequency of the last bin edge: half the sampling rate.
    pub fn nyquist(&self) -> f32 {
        self.sampling_rate as f32 / 2.0
    }

    /// Push one audio frame in. Returns `Ok(None)` until a hop's worth of
    /// samples has accumulated, then `Ok(Some(magnitudes))`.
    pub fn next(&mut self, frame: &[f32]) -> Result<Option<&[f32]>, SpectrumError> {
        if frame.len() != self.frame_size {
            return Err(SpectrumError::InvalidFrameSize {
                expected: self.frame_size,
                got: frame.len(),
            });
        }

        let size = self.buffer.len();
        for &s in frame {
            self.buffer[self.head] = s;
            self.head = (self.head + 1) % size;
        }

        self.samples_since_last += self.frame_size;
        if self.samples_since_last < self.hop_size {
            return Ok(None);
        }
        self.samples_since_last %= self.hop_size;

        self.compute_spectrum();
        Ok(Some(&self.magnitude))
    }

    /// Clear buffered audio, e.g. after the capture device changes.
    pub fn reset(&mut self) {
        self.buffer.iter_mut().for_each(|s| *s = 0.0);
        self.head = 0;
        self.samples_since_last = 0;
    }

    #[inline]
    fn compute_spectrum(&mut self) {
        // Unwrap buffer (oldest sample first) into FFT input with window
        let size = self.buffer.len();
        (0..size).for_each(|i| {
            let sample = self.buffer[(self.head + i) % size];
            self.fft_buffer[i].re = sample * self.window[i];
            self.fft_buffer[i].im = 0.0;
        });

        self.fft.process(&mut self.fft_buffer);

        for (i, mag) in self.magnitude.iter_mut().enumerate() {
            let c = &self.fft_buffer[i];
            *mag = (c.re * c.re + c.im * c.im).sqrt() * self.gain;
        }
    }
}

/// Blackman window of length `n`.
fn make_blackman_window(n: usize) -> Vec<f32> {
    let denom = (n - 1) as f32;
    (0..n)
        .map(|i| {
            let phase = 2.0 * PI * i as f32 / denom;
            0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
        })
        .collect()
}
