//! f64 → 16-bit PCM packing.
//!
//! The engine renders mono f64 samples; the sink consumes interleaved
//! stereo 16-bit little-endian frames. Conversion saturates out-of-range
//! values instead of wrapping.

use cantus_core::BYTES_PER_FRAME;

/// Pack mono samples into interleaved stereo i16-LE bytes, duplicating the
/// signal on both channels. `buf` must hold `samples.len()` frames.
pub fn pack_frames(samples: &[f64], buf: &mut [u8]) {
    debug_assert_eq!(buf.len(), samples.len() * BYTES_PER_FRAME);
    for (i, &sample) in samples.iter().enumerate() {
        let value = sample_to_i16(sample);
        let bytes = value.to_le_bytes();
        let frame = &mut buf[i * BYTES_PER_FRAME..(i + 1) * BYTES_PER_FRAME];
        frame[0] = bytes[0];
        frame[1] = bytes[1];
        frame[2] = bytes[0];
        frame[3] = bytes[1];
    }
}

/// Saturating conversion of one sample in `[-1, 1]` to i16.
#[inline]
pub fn sample_to_i16(sample: f64) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_values_hit_full_scale() {
        assert_eq!(sample_to_i16(1.0), 32767);
        assert_eq!(sample_to_i16(-1.0), -32767);
        assert_eq!(sample_to_i16(0.0), 0);
    }

    #[test]
    fn test_out_of_range_saturates() {
        assert_eq!(sample_to_i16(1.5), 32767);
        assert_eq!(sample_to_i16(-7.0), -32767);
    }

    #[test]
    fn test_pack_interleaves_stereo_le() {
        let samples = [0.5, -0.25];
        let mut buf = [0u8; 8];
        pack_frames(&samples, &mut buf);

        let l0 = i16::from_le_bytes([buf[0], buf[1]]);
        let r0 = i16::from_le_bytes([buf[2], buf[3]]);
        let l1 = i16::from_le_bytes([buf[4], buf[5]]);
        let r1 = i16::from_le_bytes([buf[6], buf[7]]);
        assert_eq!(l0, r0);
        assert_eq!(l1, r1);
        assert_eq!(l0, (0.5f64 * 32767.0).round() as i16);
        assert_eq!(l1, (-0.25f64 * 32767.0).round() as i16);
    }
}
