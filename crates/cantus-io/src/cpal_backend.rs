//! cpal-based audio backend.
//!
//! Builds an i16 output stream on the platform's default host (ALSA on
//! Linux, CoreAudio on macOS, WASAPI on Windows) and adapts the engine's
//! byte-oriented callback to it.

use crate::backend::{AudioBackend, ErrorCallback, OutputCallback, StreamConfig, StreamHandle};
use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Host;

/// The default [`AudioBackend`] over cpal.
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal backend initialized");
        Self { host }
    }

    fn find_output_device(&self, name: Option<&str>) -> Result<cpal::Device> {
        match name {
            Some(search) => {
                let search_lower = search.to_lowercase();
                let devices = self
                    .host
                    .output_devices()
                    .map_err(|e| Error::Stream(e.to_string()))?;
                for device in devices {
                    if let Ok(dev_name) = device.name() {
                        if dev_name.to_lowercase().contains(&search_lower) {
                            return Ok(device);
                        }
                    }
                }
                Err(Error::DeviceNotFound(search.to_owned()))
            }
            None => self.host.default_output_device().ok_or(Error::NoDevice),
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &str {
        "cpal"
    }

    fn list_output_devices(&self) -> Result<Vec<String>> {
        let devices = self
            .host
            .output_devices()
            .map_err(|e| Error::Stream(e.to_string()))?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }

    fn build_output_stream(
        &self,
        config: &StreamConfig,
        mut callback: OutputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_output_device(config.device_name.as_deref())?;
        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };

        // The engine fills little-endian bytes; hand cpal the same frames
        // as i16.
        let mut scratch: Vec<u8> = Vec::new();
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    scratch.resize(data.len() * 2, 0);
                    callback(&mut scratch);
                    for (sample, bytes) in data.iter_mut().zip(scratch.chunks_exact(2)) {
                        *sample = i16::from_le_bytes([bytes[0], bytes[1]]);
                    }
                },
                move |err| error_callback(&err.to_string()),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            channels = config.channels,
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            "output stream started"
        );
        Ok(StreamHandle::new(stream))
    }
}
