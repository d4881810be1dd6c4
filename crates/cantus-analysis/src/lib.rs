//! Cantus Analysis - spectral snapshots for the report stream.
//!
//! A thin wrapper over `rustfft` plus the two consumers the engine exposes:
//! the Hann-windowed ring-buffer spectrum and the impulse-response
//! filter-shape preview.

pub mod fft;
pub mod spectrum;

pub use fft::Fft;
pub use spectrum::{frequency_response, ring_spectrum};
