//! Note Event Buffer
//!
//! Sliding time window of detected notes. Entries are appended at the back
//! and evicted from the front; nothing is reordered or edited in place.

use std::collections::{HashMap, VecDeque};

use crate::{
    note::{Note, TimedNote},
    note_database::NoteDatabase,
    peak_detector::Peak,
};

/// Default time horizon in seconds.
pub const DEFAULT_HORIZON: f64 = 2.0;

/// Time-ordered buffer of [`TimedNote`]s bounded by a horizon.
#[derive(Debug, Clone)]
pub struct NoteEventBuffer {
    events: VecDeque<TimedNote>,
    horizon: f64,
}

impl NoteEventBuffer {
    /// Create an empty buffer that keeps notes for `horizon` seconds.
    pub fn new(horizon: f64) -> Self {
        NoteEventBuffer {
            events: VecDeque::new(),
            horizon,
        }
    }

    /// Retention window in seconds.
    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    /// Change the retention window; applies from the next eviction.
    pub fn set_horizon(&mut self, horizon: f64) {
        self.horizon = horizon;
    }

    /// Resolve each peak of a `bins`-wide spectrum to its nearest note and
    /// append it at `now`, keeping the detector's ascending-frequency order.
    ///
    /// Returns how many notes were appended.
    pub fn on_new_spectrum(
        &mut self,
        db: &NoteDatabase,
        peaks: &[Peak],
        bins: usize,
        nyquist: f32,
        now: f64,
    ) -> usize {
        for peak in peaks {
            let note = db.nearest_note(peak.frequency(bins, nyquist));
            self.events.push_back(TimedNote::new(note.clone(), now));
        }
        peaks.len()
    }

    /// Append one note observed at `time`.
    pub fn push(&mut self, note: Note, time: f64) {
        self.events.push_back(TimedNote::new(note, time));
    }

    /// Drop entries older than the horizon relative to `now`.
    ///
    /// An entry exactly `horizon` seconds old is kept. Returns the number of
    /// entries removed.
    pub fn evict(&mut self, now: f64) -> usize {
        let mut removed = 0;
        while let Some(oldest) = self.events.front() {
            if now - oldest.time > self.horizon {
                self.events.pop_front();
                removed += 1;
            } else {
                break;
            }
        }
        removed
    }

    /// Most frequent note currently buffered; ties go to the note seen first.
    pub fn dominant_note(&self) -> Option<&Note> {
        let mut counts: HashMap<usize, (usize, usize)> = HashMap::new();
        for (pos, event) in self.events.iter().enumerate() {
            counts.entry(event.note.index).or_insert((0, pos)).0 += 1;
        }

        let mut best: Option<(usize, usize)> = None;
        for &(count, first) in counts.values() {
            best = match best {
                Some((c, f)) if c > count || (c == count && f < first) => Some((c, f)),
                _ => Some((count, first)),
            };
        }
        best.map(|(_, first)| &self.events[first].note)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of buffered entries.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// `true` when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TimedNote> {
        self.events.iter()
    }
}

impl Default for NoteEventBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZON)
    }
}
