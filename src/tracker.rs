//! Pitch Tracker
//!
//! Host-facing pipeline. One [`PitchTracker::tick`] per audio/render frame
//! runs, in order: peak detection, buffer update and eviction, timeline
//! aggregation, melody matching.

use std::sync::Arc;
use thiserror::Error;

use crate::{
    melody_matcher::{MatchState, MelodyMatcher},
    note::Note,
    note_buffer::{NoteEventBuffer, DEFAULT_HORIZON},
    note_database::NoteDatabase,
    peak_detector::{PeakDetector, PeakDetectorError, DEFAULT_MAX_PEAKS, DEFAULT_THRESHOLD},
    timeline::{aggregate, TimelineEntry},
};

/// Errors returned by the tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// An error occurred while configuring the tracker.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The peak detector rejected its configuration.
    #[error(transparent)]
    Detector(#[from] PeakDetectorError),

    /// The Nyquist frequency passed to a tick was not a positive number.
    #[error("invalid nyquist frequency {0}")]
    InvalidNyquist(f32),
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickOutcome {
    /// The target melody became fully matched on this tick. Fires once per
    /// transition, not on every matched tick.
    pub matched: bool,
    /// Target names found so far in the current timeline, for progress UI.
    pub consumed: Vec<String>,
    /// Notes appended to the buffer from this tick's spectrum.
    pub detected: usize,
}

/// Builder for a [`PitchTracker`].
pub struct PitchTrackerBuilder {
    db: Arc<NoteDatabase>,
    threshold: f32,
    max_peaks: usize,
    horizon: f64,
    target: Vec<String>,
}

impl PitchTrackerBuilder {
    /// Start with defaults: threshold = 4.0, max_peaks = 40, horizon = 2 s,
    /// empty target.
    pub fn new(db: Arc<NoteDatabase>) -> Self {
        PitchTrackerBuilder {
            db,
            threshold: DEFAULT_THRESHOLD,
            max_peaks: DEFAULT_MAX_PEAKS,
            horizon: DEFAULT_HORIZON,
            target: Vec::new(),
        }
    }

    /// Set the peak loudness threshold multiplier.
    pub fn threshold(mut self, ratio: f32) -> Self {
        self.threshold = ratio;
        self
    }

    /// Set the maximum number of candidate peaks per spectrum.
    pub fn max_peaks(mut self, k: usize) -> Self {
        self.max_peaks = k;
        self
    }

    /// Set how long detected notes stay in the buffer, in seconds.
    pub fn horizon(mut self, seconds: f64) -> Self {
        self.horizon = seconds;
        self
    }

    /// Set the initial target melody.
    pub fn target<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = names.into_iter().map(Into::into).collect();
        self
    }

    /// Finalize and create the tracker.
    pub fn build(self) -> Result<PitchTracker, TrackerError> {
        if !self.horizon.is_finite() || self.horizon < 0.0 {
            return Err(TrackerError::Configuration(format!(
                "horizon must be a non-negative number of seconds, got {}",
                self.horizon
            )));
        }
        let detector = PeakDetector::builder()
            .threshold(self.threshold)
            .max_peaks(self.max_peaks)
            .build()?;

        Ok(PitchTracker {
            db: self.db,
            detector,
            buffer: NoteEventBuffer::new(self.horizon),
            timeline: Vec::new(),
            matcher: MelodyMatcher::new(),
            target: self.target,
        })
    }
}

/// Spectrum-in, trigger-out melody tracker. Single-threaded; the host drives
/// it with a non-decreasing clock.
pub struct PitchTracker {
    db: Arc<NoteDatabase>,
    detector: PeakDetector,
    buffer: NoteEventBuffer,
    timeline: Vec<TimelineEntry>,
    matcher: MelodyMatcher,
    target: Vec<String>,
}

impl PitchTracker {
    /// Start customizing with a builder.
    pub fn builder(db: Arc<NoteDatabase>) -> PitchTrackerBuilder {
        PitchTrackerBuilder::new(db)
    }

    /// Process one magnitude spectrum covering `0..nyquist` Hz, observed at
    /// `now` seconds.
    ///
    /// Returns `Err(InvalidNyquist)` if `nyquist` is not a positive number;
    /// the spectrum is then ignored, but stale notes are still evicted and
    /// the match state is still re-evaluated.
    /// A silent or empty spectrum is not an error; it simply adds no notes.
    pub fn tick(
        &mut self,
        spectrum: &[f32],
        nyquist: f32,
        now: f64,
    ) -> Result<TickOutcome, TrackerError> {
        let valid_nyquist = nyquist.is_finite() && nyquist > 0.0;

        let detected = if valid_nyquist {
            let peaks = self.detector.detect(spectrum);
            self.buffer.on_new_spectrum(&self.db, peaks, spectrum.len(), nyquist, now)
        } else {
            0
        };
        self.buffer.evict(now);

        self.timeline = aggregate(self.buffer.iter());
        let outcome = self.matcher.evaluate(&self.db, &self.target, &self.timeline);

        if !valid_nyquist {
            return Err(TrackerError::InvalidNyquist(nyquist));
        }

        log::trace!(
            "tick at {now:.3}s: {detected} notes, {} buffered, {} onsets",
            self.buffer.len(),
            self.timeline.len()
        );

        Ok(TickOutcome {
            matched: outcome.fired,
            consumed: outcome.consumed,
            detected,
        })
    }

    /// Like [`tick`](Self::tick), calling `on_matched` if the melody became
    /// matched on this tick.
    pub fn tick_with<F: FnOnce()>(
        &mut self,
        spectrum: &[f32],
        nyquist: f32,
        now: f64,
        on_matched: F,
    ) -> Result<TickOutcome, TrackerError> {
        let outcome = self.tick(spectrum, nyquist, now)?;
        if outcome.matched {
            on_matched();
        }
        Ok(outcome)
    }

    /// Replace the target melody; used from the next tick on.
    pub fn set_target<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = names.into_iter().map(Into::into).collect();
        log::debug!("target melody set to {:?}", self.target);
    }

    /// Current target melody.
    pub fn target(&self) -> &[String] {
        &self.target
    }

    /// Clear buffered notes, the timeline and the match state.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.timeline.clear();
        self.matcher.reset();
        log::debug!("tracker reset");
    }

    /// Timeline snapshot computed by the last tick.
    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    /// Buffered note events.
    pub fn buffer(&self) -> &NoteEventBuffer {
        &self.buffer
    }

    /// Most frequent buffered note, if any.
    pub fn dominant_note(&self) -> Option<&Note> {
        self.buffer.dominant_note()
    }

    /// Match state after the last evaluated cycle.
    pub fn state(&self) -> MatchState {
        self.matcher.state()
    }

    /// The note table this tracker resolves against.
    pub fn database(&self) -> &Arc<NoteDatabase> {
        &self.db
    }
}
