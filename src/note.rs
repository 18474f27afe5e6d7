//! Notes
//!
//! Immutable note values shared by every stage of the pipeline.

use std::{
    fmt::Display,
    hash::{Hash, Hasher},
};

/// Separator between the aliases of one note, e.g. `"C#4/Db4"`.
pub const ALIAS_SEPARATOR: char = '/';

/// One entry of the chromatic note table.
///
/// Equality and hashing only look at `index`: two notes with the same
/// chromatic position are the same note regardless of how they are named.
#[derive(Debug, Clone)]
pub struct Note {
    /// Chromatic position in the owning [`NoteDatabase`](crate::NoteDatabase).
    pub index: usize,
    /// Display name; may hold several aliases joined by `/`.
    pub name: String,
    /// Reference pitch in Hz.
    pub frequency: f32,
}

impl Note {
    /// Create a note.
    pub fn new(index: usize, name: impl Into<String>, frequency: f32) -> Self {
        Note {
            index,
            name: name.into(),
            frequency,
        }
    }

    /// Iterate the individual aliases of this note's name.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.name.split(ALIAS_SEPARATOR)
    }

    /// Tolerant equality used for melody matching.
    ///
    /// Holds when the indices are equal, or when either index is within one
    /// of double the other. Doubling a table index stands in for an octave
    /// shift; the ±1 absorbs quantization from the bin-based detector.
    pub fn equivalent_or_octave(&self, other: &Note) -> bool {
        let a = self.index as i64;
        let b = other.index as i64;
        a == b || (a - 2 * b).abs() <= 1 || (2 * a - b).abs() <= 1
    }
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for Note {}

impl Hash for Note {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// A note observed at a point in time (seconds on the host clock).
#[derive(Debug, Clone, PartialEq)]
pub struct TimedNote {
    /// The detected note.
    pub note: Note,
    /// Host timestamp of the spectrum it was detected in.
    pub time: f64,
}

impl TimedNote {
    /// Pair a note with its observation time.
    pub fn new(note: Note, time: f64) -> Self {
        TimedNote { note, time }
    }
}
