//! # pitch_matcher
//!
//! Real-time melody triggers: pick note candidates out of a magnitude
//! spectrum, collect them into a note-onset timeline, and signal once when a
//! target melody has been played, tolerating octave mix-ups.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use pitch_matcher::{NoteDatabase, PitchTracker, SpectrumAnalyzer};
//!
//! fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1) Load the note table once and share it
//!     let db = Arc::new(NoteDatabase::equal_tempered(2, 6)?);
//!
//!     // 2) Build the tracker with a target melody
//!     let mut tracker = PitchTracker::builder(db)
//!         .threshold(4.0)
//!         .horizon(2.0)
//!         .target(["E4", "G4", "C5"])
//!         .build()?;
//!
//!     // 3) In your audio loop: PCM frames -> spectrum -> tracker
//!     let mut analyzer = SpectrumAnalyzer::builder()
//!         .frame_size(1024)
//!         .sampling_rate(44_100)
//!         .build()?;
//!     let nyquist = analyzer.nyquist();
//!     let audio_frame: Vec<f32> = vec![0.0; 1024]; // fill with actual samples
//!     let now = 0.0; // host clock, seconds
//!     if let Some(spectrum) = analyzer.next(&audio_frame)? {
//!         let outcome = tracker.tick(spectrum, nyquist, now)?;
//!         if outcome.matched {
//!             println!("melody matched");
//!         }
//!     }
//!
//!     Ok(())
//! }
//! # run().unwrap();
//! ```
//!
//! ## Pipeline
//! spectrum → [`PeakDetector`] → [`NoteEventBuffer`] → [`timeline::aggregate`]
//! → [`MelodyMatcher`] → matched signal. [`PitchTracker`] runs all stages per
//! tick.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

/// Note values.
pub use note::{Note, TimedNote};

/// Chromatic note table.
pub use note_database::{NoteDatabase, NoteDatabaseError};

/// Spectral peak picking.
pub use peak_detector::{
    average_loudness, Peak, PeakDetector, PeakDetectorBuilder, PeakDetectorError,
};

/// Sliding note window.
pub use note_buffer::NoteEventBuffer;

/// Note-onset timeline.
pub use timeline::{aggregate, TimelineEntry};

/// Melody matching.
pub use melody_matcher::{MatchOutcome, MatchState, MelodyMatcher};

/// Per-tick pipeline.
pub use tracker::{PitchTracker, PitchTrackerBuilder, TickOutcome, TrackerError};

/// Streaming PCM-to-spectrum front end.
pub use spectrum::{SpectrumAnalyzer, SpectrumAnalyzerBuilder, SpectrumError};

/// Note and timed-note types.
pub mod note;

/// Note table loading and nearest-note lookup.
pub mod note_database;

/// Spectral peak detection with harmonic rejection.
pub mod peak_detector;

/// Time-windowed note event buffer.
pub mod note_buffer;

/// Timeline aggregation of note onsets.
pub mod timeline;

/// Octave-tolerant melody matching.
pub mod melody_matcher;

/// Host-facing tracker running the whole pipeline.
pub mod tracker;

/// Magnitude spectrum computation module.
pub mod spectrum;
