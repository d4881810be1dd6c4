//! Cantus Core - DSP primitives for the cantus synthesizer engine
//!
//! This crate provides the foundational building blocks the voice chain is
//! assembled from:
//!
//! - [`Ramp`] for linear/exponential value transitions (envelopes, glide gain)
//! - [`FilterKernel`] and [`FilterStage`] — direct-form-I filtering with RBJ
//!   biquad and windowed-sinc FIR designs rebuilt per sample
//! - [`Formant`] vowel bank (four parallel bandpass stages)
//! - [`Echo`] feedback delay on the summed output
//! - [`WavetableSet`] band-limited tables with binary file I/O
//! - tuning math ([`note_to_freq`] / [`freq_to_note`], A4 = 442 Hz)
//!
//! All DSP runs in `f64` at a fixed 48 kHz sample rate.

pub mod echo;
pub mod filter;
pub mod formant;
pub mod ramp;
pub mod tuning;
pub mod wavetable;
pub mod window;

pub use echo::{Echo, EchoParams};
pub use filter::{
    FilterKernel, FilterKind, FilterParams, FilterStage, NoteFilter, NoteFilterParams, TargetOsc,
};
pub use formant::{Formant, FormantParams, FormantVowel};
pub use ramp::Ramp;
pub use tuning::{freq_to_note, note_to_freq};
pub use wavetable::{Wavetable, WavetableError, WavetableSet, Wavetables};
pub use window::{apply_window, blackman, hamming, hann};

/// Engine sample rate in Hz. Fixed at compile time; every millisecond
/// parameter converts through it.
pub const SAMPLE_RATE: u32 = 48_000;
/// Sample rate as f64, for DSP math.
pub const SAMPLE_RATE_F: f64 = SAMPLE_RATE as f64;
/// Seconds per sample.
pub const SEC_PER_SAMPLE: f64 = 1.0 / SAMPLE_RATE_F;
/// Output channel count (interleaved stereo).
pub const CHANNELS: usize = 2;
/// Bytes per interleaved frame (16-bit × 2 channels).
pub const BYTES_PER_FRAME: usize = 2 * CHANNELS;
/// Samples rendered per audio buffer.
pub const SAMPLES_PER_CYCLE: usize = 1024;
/// Spectral snapshot size; a multiple of [`SAMPLES_PER_CYCLE`].
pub const FFT_SIZE: usize = 2048;
/// Voice pool size in polyphonic mode.
pub const MAX_POLY: usize = 128;
/// Per-oscillator output gain applied inside the voice chain.
pub const OSC_GAIN: f64 = 0.07;
/// Concert pitch for MIDI note 69.
pub const BASE_FREQ: f64 = 442.0;

/// Euclidean remainder that keeps oscillator phase in `[0, b)`.
///
/// `b` must be positive.
#[inline]
pub fn positive_mod(a: f64, b: f64) -> f64 {
    debug_assert!(b > 0.0);
    let r = a % b;
    if r < 0.0 { r + b } else { r }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_mod_wraps_negatives() {
        assert!((positive_mod(-0.25, 1.0) - 0.75).abs() < 1e-12);
        assert!((positive_mod(2.5, 1.0) - 0.5).abs() < 1e-12);
        assert!((positive_mod(0.0, 1.0)).abs() < 1e-12);
    }
}
