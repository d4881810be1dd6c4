//! Cantus IO - audio device output and PCM packing.
//!
//! This crate provides:
//! - the object-safe [`AudioBackend`] trait and its cpal implementation
//! - f64 → 16-bit little-endian PCM packing via [`pcm`]
//! - stereo WAV export for the offline render path via [`wav`]

pub mod backend;
pub mod cpal_backend;
pub mod pcm;
pub mod wav;

pub use backend::{AudioBackend, ErrorCallback, OutputCallback, StreamConfig, StreamHandle};
pub use cpal_backend::CpalBackend;

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("audio stream error: {0}")]
    Stream(String),

    #[error("no audio output device available")]
    NoDevice,

    #[error("audio device not found: {0}")]
    DeviceNotFound(String),

    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
