//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use lazy_static::lazy_static;
use pitch_matcher::{Note, NoteDatabase};
use std::sync::Arc;

pub const BINS: usize = 4096;
pub const NYQUIST: f32 = 22_050.0;

/// One octave from A4 = 440 Hz, index 12 would be A5.
pub const OCTAVE_FROM_A4: [&str; 12] = [
    "A4", "A#4/Bb4", "B4", "C5", "C#5/Db5", "D5", "D#5/Eb5", "E5", "F5", "F#5/Gb5", "G5",
    "G#5/Ab5",
];

lazy_static! {
    pub static ref OCTAVE_DB: Arc<NoteDatabase> = Arc::new(
        NoteDatabase::load(
            OCTAVE_FROM_A4
                .iter()
                .enumerate()
                .map(|(i, name)| (*name, (440.0 * 2f32.powf(i as f32 / 12.0)).to_string())),
        )
        .unwrap()
    );
    pub static ref PIANO_DB: Arc<NoteDatabase> =
        Arc::new(NoteDatabase::equal_tempered(0, 9).unwrap());
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Alternating noise floor (0.05 / 0.01) so the two-pass loudness average
/// settles on the floor rather than on the peaks.
pub fn floor_spectrum(bins: usize) -> Vec<f32> {
    (0..bins)
        .map(|i| if i % 2 == 0 { 0.05 } else { 0.01 })
        .collect()
}

/// Noise floor plus the given `(bin, magnitude)` peaks.
pub fn spectrum_with_peaks(bins: usize, peaks: &[(usize, f32)]) -> Vec<f32> {
    let mut spectrum = floor_spectrum(bins);
    for &(bin, magnitude) in peaks {
        spectrum[bin] = magnitude;
    }
    spectrum
}

/// Bin of `frequency` in a `BINS`-wide spectrum up to `NYQUIST`.
pub fn bin_of(frequency: f32) -> usize {
    (frequency / NYQUIST * BINS as f32).round() as usize
}

/// Spectrum sounding each frequency together with its first harmonic.
pub fn tone_spectrum(frequencies: &[f32]) -> Vec<f32> {
    let peaks: Vec<(usize, f32)> = frequencies
        .iter()
        .flat_map(|&f| {
            let bin = bin_of(f);
            [(bin, 1.0), (2 * bin, 0.6)]
        })
        .collect();
    spectrum_with_peaks(BINS, &peaks)
}

pub fn note(db: &NoteDatabase, name: &str) -> Note {
    db.note_by_name(name).unwrap().clone()
}
