//! Pluggable audio backend abstraction.
//!
//! [`AudioBackend`] decouples the engine from any specific platform audio
//! API. The default implementation wraps cpal; tests can supply a
//! deterministic mock. The trait uses boxed callbacks so it stays
//! object-safe, and streams come back as a type-erased [`StreamHandle`]
//! that stops playback on drop.

use crate::Result;

/// Configuration for building an output stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
    /// Channel count.
    pub channels: u16,
    /// Optional device-name filter (substring match); system default when
    /// `None`.
    pub device_name: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: cantus_core::SAMPLE_RATE,
            buffer_size: cantus_core::SAMPLES_PER_CYCLE as u32,
            channels: cantus_core::CHANNELS as u16,
            device_name: None,
        }
    }
}

/// Output callback, invoked on the realtime audio thread with a byte
/// buffer of interleaved 16-bit little-endian frames to fill.
///
/// Implementations must not allocate or perform I/O.
pub type OutputCallback = Box<dyn FnMut(&mut [u8]) + Send>;

/// Error callback for streaming failures.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Type-erased stream handle. The stream is live while this exists;
/// dropping it stops playback.
///
/// Platform stream objects are not `Send`; the handle stays on the thread
/// that built it (the audio backend delivers data on its own thread).
pub struct StreamHandle {
    _inner: Box<dyn std::any::Any>,
}

impl StreamHandle {
    pub fn new<T: 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// A platform audio output.
pub trait AudioBackend {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Names of the available output devices.
    fn list_output_devices(&self) -> Result<Vec<String>>;

    /// Build and start an output stream. The callback fills byte buffers
    /// of whole frames until the returned handle is dropped.
    fn build_output_stream(
        &self,
        config: &StreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;
}
