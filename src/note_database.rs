//! Note Database
//!
//! Ordered chromatic note table with name lookup and constant-time
//! nearest-note search.

use std::{collections::HashMap, io::Read};
use thiserror::Error;

use crate::note::{Note, ALIAS_SEPARATOR};

/// Natural-log distance between adjacent table entries (≈ ln 2 / 12).
pub const LOG_SEMITONE_STEP: f32 = 0.0578;

const PITCH_CLASSES: [&str; 12] = [
    "C", "C#/Db", "D", "D#/Eb", "E", "F", "F#/Gb", "G", "G#/Ab", "A", "A#/Bb", "B",
];

/// Errors raised while building a [`NoteDatabase`].
///
/// Every variant aborts construction; no partial table is ever produced.
#[derive(Debug, Error)]
pub enum NoteDatabaseError {
    /// A frequency field could not be read as a finite number.
    #[error("line {line}: invalid frequency `{value}`")]
    Parse {
        /// 1-based row number.
        line: usize,
        /// The offending field.
        value: String,
    },

    /// A row had a name but no frequency field.
    #[error("line {line}: missing frequency field")]
    MissingFrequency {
        /// 1-based row number.
        line: usize,
    },

    /// Frequencies must strictly increase with the index.
    #[error("line {line}: frequency does not increase over the previous row")]
    NotAscending {
        /// 1-based row number.
        line: usize,
    },

    /// An alias was already registered by an earlier row.
    #[error("line {line}: duplicate note name `{name}`")]
    DuplicateName {
        /// 1-based row number.
        line: usize,
        /// The repeated alias.
        name: String,
    },

    /// The table must hold at least one note.
    #[error("note table needs at least one row, got {got}")]
    TooFewNotes {
        /// Number of rows read.
        got: usize,
    },

    /// The underlying reader failed.
    #[error("failed to read note table: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only table of notes indexed `0..len()` by increasing frequency.
#[derive(Debug, Clone)]
pub struct NoteDatabase {
    notes: Vec<Note>,
    by_name: HashMap<String, usize>,
    base_frequency: f32,
}

impl NoteDatabase {
    /// Build a table from `(name, frequency)` rows. Row order assigns indices.
    ///
    /// Each `/`-separated alias of a name is registered for lookup, and so is
    /// the combined string when there are two or more aliases.
    pub fn load<I, N, F>(rows: I) -> Result<Self, NoteDatabaseError>
    where
        I: IntoIterator<Item = (N, F)>,
        N: AsRef<str>,
        F: AsRef<str>,
    {
        let mut notes: Vec<Note> = Vec::new();
        let mut by_name = HashMap::new();

        for (index, (name, frequency)) in rows.into_iter().enumerate() {
            let line = index + 1;
            let name = name.as_ref().trim();
            let field = frequency.as_ref().trim();
            let frequency = match field.parse::<f32>() {
                Ok(f) if f.is_finite() && f > 0.0 => f,
                _ => {
                    return Err(NoteDatabaseError::Parse {
                        line,
                        value: field.to_string(),
                    })
                }
            };
            if let Some(prev) = notes.last() {
                if frequency <= prev.frequency {
                    return Err(NoteDatabaseError::NotAscending { line });
                }
            }

            let aliases: Vec<&str> = name.split(ALIAS_SEPARATOR).collect();
            let mut keys: Vec<&str> = aliases.clone();
            if aliases.len() >= 2 {
                keys.push(name);
            }
            for key in keys {
                if by_name.insert(key.to_string(), index).is_some() {
                    return Err(NoteDatabaseError::DuplicateName {
                        line,
                        name: key.to_string(),
                    });
                }
            }

            notes.push(Note::new(index, name, frequency));
        }

        let base_frequency = match notes.first() {
            Some(first) => first.frequency,
            None => return Err(NoteDatabaseError::TooFewNotes { got: 0 }),
        };
        log::debug!("loaded note table with {} notes", notes.len());

        Ok(NoteDatabase {
            notes,
            by_name,
            base_frequency,
        })
    }

    /// Parse the text table format: one `name<TAB>frequency` row per line.
    ///
    /// Rows without a tab fall back to the last whitespace-separated field.
    /// Blank lines are skipped but still count towards line numbers.
    pub fn parse(text: &str) -> Result<Self, NoteDatabaseError> {
        let mut rows = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let split = raw
                .split_once('\t')
                .or_else(|| line.rsplit_once(char::is_whitespace));
            match split {
                Some((name, frequency)) => rows.push((name, frequency)),
                None => return Err(NoteDatabaseError::MissingFrequency { line: i + 1 }),
            }
        }
        Self::load(rows)
    }

    /// Read and parse a text table from any reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, NoteDatabaseError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::parse(&text)
    }

    /// Twelve-tone equal temperament (A4 = 440 Hz), starting at C of
    /// `lowest_octave` and spanning `octaves` octaves. Names look like
    /// `C4`, `C#4/Db4`.
    pub fn equal_tempered(lowest_octave: i32, octaves: usize) -> Result<Self, NoteDatabaseError> {
        let mut rows = Vec::with_capacity(octaves * PITCH_CLASSES.len());
        for octave in 0..octaves as i32 {
            let octave = lowest_octave + octave;
            for (pc, class) in PITCH_CLASSES.iter().enumerate() {
                let midi = (octave + 1) * 12 + pc as i32;
                let frequency = 440.0 * 2f32.powf((midi - 69) as f32 / 12.0);
                let name = class
                    .split(ALIAS_SEPARATOR)
                    .map(|alias| format!("{alias}{octave}"))
                    .collect::<Vec<_>>()
                    .join("/");
                rows.push((name, frequency.to_string()));
            }
        }
        Self::load(rows)
    }

    /// Number of notes in the table.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Always `false`: construction rejects empty tables.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// All notes in index order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Note at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    /// Look a note up by one of its aliases or its full name.
    pub fn note_by_name(&self, name: &str) -> Option<&Note> {
        self.by_name.get(name.trim()).map(|&i| &self.notes[i])
    }

    /// Closest labeled note to `frequency`.
    ///
    /// Estimates the index from the logarithmic pitch curve anchored at the
    /// lowest row, clamps it to `[1, len - 2]`, then picks the closest of the
    /// three neighbours. Ties go to the lower index.
    pub fn nearest_note(&self, frequency: f32) -> &Note {
        let n = self.notes.len();
        let (lo, hi) = if n < 3 {
            (0, n - 1)
        } else {
            let center = self.estimate_index(frequency).clamp(1, n - 2);
            (center - 1, center + 1)
        };

        let mut best = lo;
        let mut min_diff = f32::MAX;
        for i in lo..=hi {
            let diff = (self.notes[i].frequency - frequency).abs();
            if diff < min_diff {
                min_diff = diff;
                best = i;
            }
        }
        &self.notes[best]
    }

    #[inline]
    fn estimate_index(&self, frequency: f32) -> usize {
        let estimate = (frequency / self.base_frequency).ln() / LOG_SEMITONE_STEP;
        if estimate.is_finite() && estimate > 0.0 {
            estimate.round() as usize
        } else {
            0
        }
    }
}
