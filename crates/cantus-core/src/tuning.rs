//! Note/frequency conversion.
//!
//! Equal temperament around A4 = 442 Hz (the reference pitch the wavetables
//! are generated against). `freq_to_note` is called per sample by the
//! wavetable oscillators, so it binary-searches a precomputed table instead
//! of taking a logarithm.

use crate::BASE_FREQ;
use std::sync::OnceLock;

/// Frequency in Hz of a MIDI note number.
#[inline]
pub fn note_to_freq(note: u8) -> f64 {
    BASE_FREQ * 2f64.powf((note as f64 - 69.0) / 12.0)
}

fn note_freqs() -> &'static [f64; 128] {
    static FREQS: OnceLock<[f64; 128]> = OnceLock::new();
    FREQS.get_or_init(|| {
        let mut freqs = [0.0; 128];
        for (i, f) in freqs.iter_mut().enumerate() {
            *f = note_to_freq(i as u8);
        }
        freqs
    })
}

/// Nearest MIDI note at or below the given frequency, clamped to `[0, 127]`.
///
/// Inverse of [`note_to_freq`] on exact note frequencies.
pub fn freq_to_note(freq: f64) -> u8 {
    let freqs = note_freqs();
    if freq < freqs[0] {
        return 0;
    }
    if freq >= freqs[127] {
        return 127;
    }
    let mut low = 0usize;
    let mut high = 128usize;
    while high - low > 1 {
        let mid = (low + high) / 2;
        if freq < freqs[mid] {
            high = mid;
        } else {
            low = mid;
        }
    }
    low as u8
}
