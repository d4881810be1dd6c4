//! Spectral snapshots for the report stream.

use crate::fft::Fft;
use cantus_core::filter::FilterKernel;
use cantus_core::window::{apply_window, hann};
use cantus_core::FFT_SIZE;

/// Magnitude spectrum of the engine's ring buffer.
///
/// `ring` is the circular render buffer; `offset` is the current write
/// position (the oldest sample). The ring is rotated so the oldest sample
/// comes first, Hann-windowed, transformed, and scaled by `2/N`. Returns
/// the lower half of the spectrum.
pub fn ring_spectrum(fft: &Fft, ring: &[f64], offset: usize) -> Vec<f64> {
    let n = ring.len();
    let mut rotated = Vec::with_capacity(n);
    rotated.extend_from_slice(&ring[offset..]);
    rotated.extend_from_slice(&ring[..offset]);
    apply_window(&mut rotated, hann);
    let mut mags = fft.magnitudes(&rotated);
    let scale = 2.0 / n as f64;
    for m in &mut mags {
        *m *= scale;
    }
    mags.truncate(n / 2);
    mags
}

/// Magnitude frequency response of a designed filter kernel.
///
/// Runs an impulse through the kernel and transforms the response; the
/// filter-shape preview on the report stream is this, unscaled. Returns
/// the lower half of the spectrum.
pub fn frequency_response(fft: &Fft, kernel: &FilterKernel) -> Vec<f64> {
    let ir = kernel.impulse_response(FFT_SIZE);
    let mut mags = fft.magnitudes(&ir);
    mags.truncate(FFT_SIZE / 2);
    mags
}

#[cfg(test)]
mod tests {
    use super::*;
    use cantus_core::filter::FilterKind;
    use cantus_core::SAMPLE_RATE_F;
    use std::f64::consts::TAU;

    #[test]
    fn test_ring_spectrum_finds_tone() {
        let n = FFT_SIZE;
        let fft = Fft::new(n);
        let cycles = 32.0;
        let ring: Vec<f64> = (0..n)
            .map(|i| (TAU * cycles * i as f64 / n as f64).sin())
            .collect();
        let spectrum = ring_spectrum(&fft, &ring, 0);
        assert_eq!(spectrum.len(), n / 2);
        let peak_bin = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_bin, cycles as usize);
        // 2/N scaling with a Hann window puts a full-scale tone near 0.5.
        assert!((spectrum[peak_bin] - 0.5).abs() < 0.05, "{}", spectrum[peak_bin]);
    }

    #[test]
    fn test_ring_spectrum_is_rotation_invariant_in_magnitude() {
        let n = FFT_SIZE;
        let fft = Fft::new(n);
        let ring: Vec<f64> = (0..n)
            .map(|i| (TAU * 16.0 * i as f64 / n as f64).sin())
            .collect();
        let a = ring_spectrum(&fft, &ring, 0);
        let b = ring_spectrum(&fft, &ring, n / 2);
        let peak_a = a.iter().cloned().fold(0.0f64, f64::max);
        let peak_b = b.iter().cloned().fold(0.0f64, f64::max);
        assert!((peak_a - peak_b).abs() < 0.01);
    }

    #[test]
    fn test_lowpass_response_peaks_at_dc_and_rolls_off() {
        let fft = Fft::new(FFT_SIZE);
        let mut kernel = FilterKernel::new();
        kernel.design(FilterKind::LowPass, 0, 1000.0, 1.0, 0.0);
        let shape = frequency_response(&fft, &kernel);
        assert_eq!(shape.len(), FFT_SIZE / 2);

        // Cutoff bin: 1000 Hz / 24 kHz Nyquist over 1024 bins ≈ 42.
        let cutoff_bin = (1000.0 / (SAMPLE_RATE_F / 2.0) * (FFT_SIZE / 2) as f64) as usize;
        assert!((shape[0] - 1.0).abs() < 0.05, "DC gain {}", shape[0]);
        // Above the cutoff the response must fall monotonically.
        for i in cutoff_bin + 1..shape.len() {
            assert!(
                shape[i] <= shape[i - 1] + 1e-9,
                "response rose at bin {i}"
            );
        }
        assert!(shape[cutoff_bin * 4] < 0.1);
    }

    #[test]
    fn test_identity_filter_response_is_flat() {
        let fft = Fft::new(FFT_SIZE);
        let mut kernel = FilterKernel::new();
        kernel.design(FilterKind::None, 0, 0.0, 1.0, 0.0);
        let shape = frequency_response(&fft, &kernel);
        for (i, &m) in shape.iter().enumerate() {
            assert!((m - 1.0).abs() < 1e-9, "bin {i}: {m}");
        }
    }
}
