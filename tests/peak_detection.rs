//! Spectral peak picking and harmonic rejection.

mod common;

use common::{floor_spectrum, spectrum_with_peaks};
use pitch_matcher::{average_loudness, Peak, PeakDetector, PeakDetectorError};

const BINS: usize = 1024;

fn bins_of(peaks: &[Peak]) -> Vec<usize> {
    peaks.iter().map(|p| p.bin).collect()
}

#[test]
fn peak_without_harmonic_partner_is_rejected() {
    let spectrum = spectrum_with_peaks(BINS, &[(10, 1.0), (20, 1.0), (35, 1.0)]);
    let mut detector = PeakDetector::builder().build().unwrap();
    assert_eq!(bins_of(detector.detect(&spectrum)), [10, 20]);
}

#[test]
fn lone_peak_yields_nothing() {
    let spectrum = spectrum_with_peaks(BINS, &[(100, 1.0)]);
    let mut detector = PeakDetector::default();
    assert!(detector.detect(&spectrum).is_empty());
}

#[test]
fn partner_within_one_bin_counts() {
    let spectrum = spectrum_with_peaks(BINS, &[(50, 1.0), (101, 0.8), (300, 0.9), (599, 0.7)]);
    let mut detector = PeakDetector::default();
    let peaks = detector.detect(&spectrum);
    assert_eq!(bins_of(peaks), [50, 101, 300, 599]);
    assert_eq!(peaks[1].magnitude, 0.8);
}

#[test]
fn silence_and_degenerate_spectra_have_no_peaks() {
    let mut detector = PeakDetector::default();
    assert!(detector.detect(&vec![0.0; BINS]).is_empty());
    assert!(detector.detect(&[]).is_empty());
    assert!(detector.detect(&[0.0, 1.0]).is_empty());
}

#[test]
fn threshold_gates_candidates() {
    let spectrum = spectrum_with_peaks(BINS, &[(40, 1.0), (80, 1.0)]);

    let mut loose = PeakDetector::builder().threshold(4.0).build().unwrap();
    assert_eq!(bins_of(loose.detect(&spectrum)), [40, 80]);

    let mut strict = PeakDetector::builder().threshold(100.0).build().unwrap();
    assert!(strict.detect(&spectrum).is_empty());
}

#[test]
fn plateau_is_not_a_strict_maximum() {
    let spectrum = spectrum_with_peaks(BINS, &[(10, 1.0), (11, 1.0), (20, 1.0)]);
    let mut detector = PeakDetector::default();
    assert!(detector.detect(&spectrum).is_empty());
}

#[test]
fn candidate_cap_keeps_strongest_peaks() {
    let peaks = [(10, 1.0), (20, 0.9), (35, 0.95), (70, 0.5)];
    let spectrum = spectrum_with_peaks(BINS, &peaks);

    // only 10 and 35 survive the cap, and they do not pair up
    let mut capped = PeakDetector::builder().max_peaks(2).build().unwrap();
    assert!(capped.detect(&spectrum).is_empty());

    let mut wide = PeakDetector::builder().max_peaks(4).build().unwrap();
    assert_eq!(bins_of(wide.detect(&spectrum)), [10, 20, 35, 70]);
}

#[test]
fn detector_is_reusable_across_snapshots() {
    let mut detector = PeakDetector::default();
    let first = spectrum_with_peaks(BINS, &[(30, 1.0), (60, 1.0)]);
    assert_eq!(bins_of(detector.detect(&first)), [30, 60]);
    assert!(detector.detect(&floor_spectrum(BINS)).is_empty());
}

#[test]
fn two_pass_average_loudness() {
    assert_eq!(average_loudness(&[1.0, 1.0, 1.0, 5.0]), 5.0);
    assert_eq!(average_loudness(&[2.0, 2.0, 2.0]), 2.0);
    assert_eq!(average_loudness(&[0.0, 0.0]), 0.0);
    assert_eq!(average_loudness(&[]), 0.0);
    assert_eq!(average_loudness(&[1.0, 3.0, 2.0, 4.0]), 3.5);
}

#[test]
fn peak_frequency_scales_by_nyquist() {
    let peak = Peak { bin: 512, magnitude: 1.0 };
    assert_eq!(peak.frequency(1024, 22_050.0), 11_025.0);
}

#[test]
fn invalid_configuration_is_rejected() {
    for threshold in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        assert!(matches!(
            PeakDetector::builder().threshold(threshold).build(),
            Err(PeakDetectorError::Configuration(_))
        ));
    }
    assert!(matches!(
        PeakDetector::builder().max_peaks(0).build(),
        Err(PeakDetectorError::Configuration(_))
    ));
}
