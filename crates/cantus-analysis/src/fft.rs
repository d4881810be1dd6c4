//! FFT wrapper with a cached plan.

use rustfft::num_complex::Complex;
use rustfft::{Fft as RustFft, FftPlanner};
use std::sync::Arc;

/// Forward FFT of a fixed size with a cached rustfft plan.
pub struct Fft {
    fft: Arc<dyn RustFft<f64>>,
    size: usize,
}

impl Fft {
    /// Plan a forward FFT of the given size (power of two for the radix-2
    /// path).
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(size),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward transform of a real signal, padded or truncated to the FFT
    /// size. Returns the full complex spectrum.
    pub fn forward(&self, input: &[f64]) -> Vec<Complex<f64>> {
        let mut buffer: Vec<Complex<f64>> =
            input.iter().map(|&x| Complex::new(x, 0.0)).collect();
        buffer.resize(self.size, Complex::new(0.0, 0.0));
        self.fft.process(&mut buffer);
        buffer
    }

    /// Magnitudes of the forward transform, unscaled, full length.
    pub fn magnitudes(&self, input: &[f64]) -> Vec<f64> {
        self.forward(input).iter().map(|c| c.norm()).collect()
    }
}
