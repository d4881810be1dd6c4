//! Stereo WAV export for the offline render path.

use crate::Result;
use cantus_core::{CHANNELS, SAMPLE_RATE};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Write mono f64 samples as a 16-bit stereo WAV at the engine rate,
/// duplicating the signal on both channels.
pub fn write_wav(path: impl AsRef<Path>, samples: &[f64]) -> Result<()> {
    let spec = WavSpec {
        channels: CHANNELS as u16,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        let value = crate::pcm::sample_to_i16(sample);
        writer.write_sample(value)?;
        writer.write_sample(value)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_roundtrip() {
        let dir = std::env::temp_dir().join("cantus-wav-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tone.wav");

        let samples: Vec<f64> = (0..480)
            .map(|i| (std::f64::consts::TAU * 442.0 * i as f64 / 48_000.0).sin() * 0.5)
            .collect();
        write_wav(&path, &samples).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 48_000);
        assert_eq!(spec.bits_per_sample, 16);
        let frames: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(frames.len(), samples.len() * 2);
        assert_eq!(frames[0], frames[1], "channels must carry the same signal");
        std::fs::remove_file(&path).ok();
    }
}
