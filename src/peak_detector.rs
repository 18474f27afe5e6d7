//! Peak Detector
//!
//! Picks fundamental candidates out of one magnitude-spectrum snapshot:
//! loud strict local maxima, capped to the strongest few, kept only when
//! they pair up with a peak at roughly double their bin.

use thiserror::Error;

/// Default loudness ratio a bin must exceed to count as a peak.
pub const DEFAULT_THRESHOLD: f32 = 4.0;

/// Default number of candidates kept for harmonic filtering.
pub const DEFAULT_MAX_PEAKS: usize = 40;

/// Errors returned when configuring a [`PeakDetector`].
#[derive(Debug, Error)]
pub enum PeakDetectorError {
    /// A builder parameter was out of range.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// One accepted spectral peak.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Peak {
    /// Bin index into the spectrum snapshot.
    pub bin: usize,
    /// Magnitude at `bin`.
    pub magnitude: f32,
}

impl Peak {
    /// Centre frequency of this peak's bin for a spectrum of `bins` bins
    /// spanning `0..nyquist` Hz.
    pub fn frequency(&self, bins: usize, nyquist: f32) -> f32 {
        self.bin as f32 / bins as f32 * nyquist
    }
}

/// Builder for a [`PeakDetector`].
pub struct PeakDetectorBuilder {
    threshold: f32,
    max_peaks: usize,
}

impl PeakDetectorBuilder {
    /// Start with defaults: threshold = 4.0, max_peaks = 40.
    pub fn new() -> Self {
        PeakDetectorBuilder {
            threshold: DEFAULT_THRESHOLD,
            max_peaks: DEFAULT_MAX_PEAKS,
        }
    }

    /// Minimum ratio of a bin's magnitude to the average loudness.
    pub fn threshold(mut self, ratio: f32) -> Self {
        self.threshold = ratio;
        self
    }

    /// Number of strongest candidates kept for harmonic filtering.
    pub fn max_peaks(mut self, k: usize) -> Self {
        self.max_peaks = k;
        self
    }

    /// Finalize and create the detector.
    pub fn build(self) -> Result<PeakDetector, PeakDetectorError> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(PeakDetectorError::Configuration(format!(
                "threshold must be a positive number, got {}",
                self.threshold
            )));
        }
        if self.max_peaks == 0 {
            return Err(PeakDetectorError::Configuration(
                "max_peaks cannot be zero".into(),
            ));
        }
        Ok(PeakDetector {
            threshold: self.threshold,
            max_peaks: self.max_peaks,
            candidates: Vec::with_capacity(self.max_peaks + 1),
            accepted: Vec::with_capacity(self.max_peaks),
        })
    }
}

impl Default for PeakDetectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-snapshot spectral peak picker. Reuses its scratch buffers between calls.
pub struct PeakDetector {
    threshold: f32,
    max_peaks: usize,
    candidates: Vec<Peak>,
    accepted: Vec<Peak>,
}

impl PeakDetector {
    /// Start customizing with a builder.
    pub fn builder() -> PeakDetectorBuilder {
        PeakDetectorBuilder::new()
    }

    /// Loudness threshold multiplier in use.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Candidate cap in use.
    pub fn max_peaks(&self) -> usize {
        self.max_peaks
    }

    /// Detect accepted peaks in `spectrum`, sorted by ascending bin.
    ///
    /// A silent spectrum (zero average loudness) yields no peaks.
    pub fn detect(&mut self, spectrum: &[f32]) -> &[Peak] {
        self.candidates.clear();
        self.accepted.clear();

        let average = average_loudness(spectrum);
        if average.is_nan() || average <= 0.0 || spectrum.len() < 3 {
            return &self.accepted;
        }

        for i in 1..spectrum.len() - 1 {
            let m = spectrum[i];
            if m / average > self.threshold && spectrum[i - 1] < m && m > spectrum[i + 1] {
                self.insert_candidate(Peak { bin: i, magnitude: m });
            }
        }

        // Harmonic rejection: a candidate survives only alongside a partner
        // at about twice (or half) its bin.
        for a in &self.candidates {
            let paired = self
                .candidates
                .iter()
                .any(|b| b.bin != a.bin && (is_double(a.bin, b.bin) || is_double(b.bin, a.bin)));
            if paired {
                self.accepted.push(*a);
            }
        }
        self.accepted.sort_unstable_by_key(|p| p.bin);

        log::trace!(
            "peaks: {} candidates, {} accepted (avg loudness {:.5})",
            self.candidates.len(),
            self.accepted.len(),
            average
        );
        &self.accepted
    }

    /// Insert keeping `candidates` sorted by descending magnitude and at most
    /// `max_peaks` long.
    #[inline]
    fn insert_candidate(&mut self, peak: Peak) {
        let pos = self
            .candidates
            .iter()
            .position(|c| peak.magnitude > c.magnitude)
            .unwrap_or(self.candidates.len());
        if pos >= self.max_peaks {
            return;
        }
        self.candidates.insert(pos, peak);
        self.candidates.truncate(self.max_peaks);
    }
}

impl Default for PeakDetector {
    fn default() -> Self {
        PeakDetector {
            threshold: DEFAULT_THRESHOLD,
            max_peaks: DEFAULT_MAX_PEAKS,
            candidates: Vec::with_capacity(DEFAULT_MAX_PEAKS + 1),
            accepted: Vec::with_capacity(DEFAULT_MAX_PEAKS),
        }
    }
}

/// Two-pass mean magnitude: the plain mean, then the mean of only the bins
/// above it. Falls back to the plain mean when no bin exceeds it.
pub fn average_loudness(spectrum: &[f32]) -> f32 {
    if spectrum.is_empty() {
        return 0.0;
    }
    let crude = spectrum.iter().sum::<f32>() / spectrum.len() as f32;
    let (sum, count) = spectrum
        .iter()
        .filter(|&&m| m > crude)
        .fold((0.0f32, 0usize), |(s, c), &m| (s + m, c + 1));
    if count == 0 {
        crude
    } else {
        sum / count as f32
    }
}

/// `high` lies within one bin of `2 * low`.
#[inline(always)]
fn is_double(low: usize, high: usize) -> bool {
    (2 * low).abs_diff(high) <= 1
}
