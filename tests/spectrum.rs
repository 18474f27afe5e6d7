//! PCM frames through the FFT front end and into the tracker.

mod common;

use common::{init_logger, OCTAVE_DB};
use pitch_matcher::{PitchTracker, SpectrumAnalyzer, SpectrumError};
use std::f32::consts::PI;

const SAMPLE_RATE: usize = 44_100;
const FRAME_LEN: usize = 1_024;

/// Sum of unit-phase sines plus deterministic white noise.
fn synth(tones: &[(f32, f32)], noise: f32, len: usize) -> Vec<f32> {
    let mut state: u32 = 0x9E37_79B9;
    (0..len)
        .map(|n| {
            let t = n as f32 / SAMPLE_RATE as f32;
            let tone: f32 = tones.iter().map(|&(f, a)| a * (2.0 * PI * f * t).sin()).sum();
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let white = state as f32 / u32::MAX as f32 * 2.0 - 1.0;
            tone + noise * white
        })
        .collect()
}

#[test]
fn analyzer_emits_spectrum_once_per_hop() {
    let mut analyzer = SpectrumAnalyzer::builder()
        .frame_size(FRAME_LEN)
        .sampling_rate(SAMPLE_RATE)
        .build()
        .unwrap();
    assert_eq!(analyzer.bins(), 4096);
    assert_eq!(analyzer.nyquist(), 22_050.0);

    let frame = vec![0.0; FRAME_LEN];
    let ready: Vec<bool> = (0..8)
        .map(|_| analyzer.next(&frame).unwrap().is_some())
        .collect();
    assert_eq!(ready, [false, false, false, true, false, false, false, true]);
}

#[test]
fn analyzer_peaks_at_tone_bin() {
    let mut analyzer = SpectrumAnalyzer::builder()
        .frame_size(FRAME_LEN)
        .sampling_rate(SAMPLE_RATE)
        .build()
        .unwrap();
    let samples = synth(&[(1_000.0, 0.5)], 0.0, 8 * FRAME_LEN);

    let mut last = Vec::new();
    for frame in samples.chunks(FRAME_LEN) {
        if let Some(spectrum) = analyzer.next(frame).unwrap() {
            last = spectrum.to_vec();
        }
    }
    let (peak_bin, peak) = last
        .iter()
        .enumerate()
        .fold((0, 0.0f32), |best, (i, &m)| if m > best.1 { (i, m) } else { best });
    let expected = (1_000.0 / 22_050.0 * 4096.0f32).round() as usize;
    assert!(peak_bin.abs_diff(expected) <= 1, "peak at bin {peak_bin}");
    assert!(peak > 0.3 && peak < 0.6, "peak magnitude {peak}");
}

#[test]
fn analyzer_rejects_bad_input() {
    let mut analyzer = SpectrumAnalyzer::builder().frame_size(256).build().unwrap();
    assert!(matches!(
        analyzer.next(&[0.0; 100]),
        Err(SpectrumError::InvalidFrameSize { expected: 256, got: 100 })
    ));
    for builder in [
        SpectrumAnalyzer::builder().frame_size(0),
        SpectrumAnalyzer::builder().sampling_rate(0),
        SpectrumAnalyzer::builder().fft_size(7),
        SpectrumAnalyzer::builder().hop_size(0),
    ] {
        assert!(matches!(builder.build(), Err(SpectrumError::Configuration(_))));
    }
}

#[test]
fn analyzer_accepts_small_even_fft() {
    let analyzer = SpectrumAnalyzer::builder().frame_size(2).fft_size(6).build().unwrap();
    assert_eq!(analyzer.bins(), 3);
    for size in [2, 5, 9] {
        assert!(SpectrumAnalyzer::builder().fft_size(size).build().is_err());
    }
}

#[test]
fn sung_interval_triggers_match() {
    init_logger();
    // hop of a whole FFT so every spectrum sees a full buffer
    let mut analyzer = SpectrumAnalyzer::builder()
        .frame_size(FRAME_LEN)
        .sampling_rate(SAMPLE_RATE)
        .hop_size(8192)
        .build()
        .unwrap();
    let mut tracker = PitchTracker::builder(OCTAVE_DB.clone())
        .target(["A4", "C5"])
        .build()
        .unwrap();

    // two notes, each with its first harmonic, over a noise floor
    let tones = [(440.0, 0.2), (880.0, 0.2), (523.25, 0.2), (1_046.5, 0.2)];
    let samples = synth(&tones, 0.05, 16 * FRAME_LEN);
    let nyquist = analyzer.nyquist();

    let mut fired = 0;
    for (i, frame) in samples.chunks(FRAME_LEN).enumerate() {
        let now = (i * FRAME_LEN) as f64 / SAMPLE_RATE as f64;
        if let Some(spectrum) = analyzer.next(frame).unwrap() {
            if tracker.tick(spectrum, nyquist, now).unwrap().matched {
                fired += 1;
            }
        }
    }
    assert_eq!(fired, 1);

    analyzer.reset();
    tracker.reset();
    let silence = vec![0.0; FRAME_LEN];
    for _ in 0..8 {
        if let Some(spectrum) = analyzer.next(&silence).unwrap() {
            assert!(!tracker.tick(spectrum, nyquist, 1.0).unwrap().matched);
        }
    }
}
