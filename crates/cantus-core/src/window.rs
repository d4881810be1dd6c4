//! Window functions for FIR design and spectral analysis.

use std::f64::consts::PI;

/// Hann (raised cosine) window, `x` in `[0, 1]`.
#[inline]
pub fn hann(x: f64) -> f64 {
    0.5 - 0.5 * (2.0 * PI * x).cos()
}

/// Hamming window, `x` in `[0, 1]`.
#[inline]
pub fn hamming(x: f64) -> f64 {
    0.54 - 0.46 * (2.0 * PI * x).cos()
}

/// Blackman window, `x` in `[0, 1]`.
#[inline]
pub fn blackman(x: f64) -> f64 {
    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
}

/// Multiply `data` by a window function evaluated over `[0, 1]`.
pub fn apply_window(data: &mut [f64], window: fn(f64) -> f64) {
    let n = data.len();
    if n < 2 {
        return;
    }
    for (i, v) in data.iter_mut().enumerate() {
        *v *= window(i as f64 / (n - 1) as f64);
    }
}
