//! Waveform generator with glide.
//!
//! Phase is held in radians and deliberately not wrapped on advance; the
//! non-wavetable waveforms normalize it on evaluation, and the wavetable
//! lookup wraps internally. Glide linearly interpolates the frequency from
//! the previous note to the next over the glide time.

use cantus_core::tuning::{freq_to_note, note_to_freq};
use cantus_core::wavetable::Wavetables;
use cantus_core::{positive_mod, SAMPLE_RATE_F, SEC_PER_SAMPLE};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::sync::Arc;

/// Oscillator waveform kinds, including the two band-limited wavetable
/// variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WaveKind {
    #[default]
    None,
    Sine,
    Triangle,
    Square,
    SquareWt,
    Pulse,
    Saw,
    SawWt,
    SawRev,
    Noise,
}

impl WaveKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "sine" => Self::Sine,
            "triangle" => Self::Triangle,
            "square" => Self::Square,
            "square-wt" => Self::SquareWt,
            "pulse" => Self::Pulse,
            "saw" => Self::Saw,
            "saw-wt" => Self::SawWt,
            "saw-rev" => Self::SawRev,
            "noise" => Self::Noise,
            _ => Self::None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Sine => "sine",
            Self::Triangle => "triangle",
            Self::Square => "square",
            Self::SquareWt => "square-wt",
            Self::Pulse => "pulse",
            Self::Saw => "saw",
            Self::SawWt => "saw-wt",
            Self::SawRev => "saw-rev",
            Self::Noise => "noise",
        }
    }
}

impl From<String> for WaveKind {
    fn from(s: String) -> Self {
        Self::from_name(&s)
    }
}

impl From<WaveKind> for String {
    fn from(k: WaveKind) -> Self {
        k.name().to_owned()
    }
}

/// Oscillator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscParams {
    pub enabled: bool,
    pub kind: WaveKind,
    /// Octave offset, -2..=2.
    pub octave: i32,
    /// Semitone offset, -12..=12.
    pub coarse: i32,
    /// Cent offset, -100..=100.
    pub fine: i32,
    /// Output level, 0..=1.
    pub level: f64,
}

impl Default for OscParams {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: WaveKind::Sine,
            octave: 0,
            coarse: 0,
            fine: 0,
            level: 1.0,
        }
    }
}

/// Note frequency with the oscillator's pitch offsets applied.
pub fn note_with_params_to_freq(p: &OscParams, note: u8) -> f64 {
    note_to_freq(note)
        * 2f64.powf(p.octave as f64 + p.coarse as f64 / 12.0 + p.fine as f64 / 100.0 / 12.0)
}

/// One audio oscillator.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub enabled: bool,
    pub kind: WaveKind,
    pub freq: f64,
    pub level: f64,
    phase: f64,
    glide_ms: f64,
    gliding: bool,
    glide_pos: f64,
    prev_freq: f64,
    next_freq: f64,
    noise_state: u64,
    tables: Arc<Wavetables>,
}

impl Oscillator {
    pub fn new(enabled: bool, tables: Arc<Wavetables>) -> Self {
        Self {
            enabled,
            kind: WaveKind::None,
            freq: 0.0,
            level: 1.0,
            phase: rand::random::<f64>() * TAU,
            glide_ms: 0.0,
            gliding: false,
            glide_pos: 0.0,
            prev_freq: 0.0,
            next_freq: 0.0,
            noise_state: rand::random::<u64>() | 1,
            tables,
        }
    }

    /// Retune and rearm for a fresh note: copy the patch, set the pitch,
    /// randomize phase.
    pub fn init_with_note(&mut self, p: &OscParams, note: u8) {
        self.enabled = p.enabled;
        self.kind = p.kind;
        self.freq = note_with_params_to_freq(p, note);
        self.level = p.level;
        self.phase = rand::random::<f64>() * TAU;
        self.gliding = false;
    }

    /// Begin a glide from the current frequency to the new note.
    pub fn glide(&mut self, p: &OscParams, note: u8, glide_ms: f64) {
        let next_freq = note_with_params_to_freq(p, note);
        if (next_freq - self.freq).abs() < 0.001 {
            return;
        }
        self.enabled = p.enabled;
        self.glide_ms = glide_ms;
        self.prev_freq = self.freq;
        self.next_freq = next_freq;
        self.gliding = true;
        self.glide_pos = 0.0;
    }

    /// Evaluate one sample at `freq · freq_ratio` and `phase + phase_shift`,
    /// then advance phase (and the glide, if one is running).
    pub fn step(&mut self, freq_ratio: f64, phase_shift: f64) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        let freq = self.freq * freq_ratio;
        let phase = self.phase + phase_shift;
        let value = match self.kind {
            WaveKind::None => 0.0,
            WaveKind::Sine => phase.sin(),
            WaveKind::Triangle => {
                let p = positive_mod(phase / TAU, 1.0);
                if p < 0.5 { p * 4.0 - 1.0 } else { 3.0 - p * 4.0 }
            }
            WaveKind::Square => {
                let p = positive_mod(phase / TAU, 1.0);
                if p < 0.5 { 1.0 } else { -1.0 }
            }
            WaveKind::SquareWt => {
                let note = freq_to_note(freq);
                self.tables.square.table(note).at_phase(phase)
            }
            WaveKind::Pulse => {
                let p = positive_mod(phase / TAU, 1.0);
                if p < 0.25 { 1.0 } else { -1.0 }
            }
            WaveKind::Saw => {
                let p = positive_mod(phase / TAU, 1.0);
                p * 2.0 - 1.0
            }
            WaveKind::SawWt => {
                let note = freq_to_note(freq);
                self.tables.saw.table(note).at_phase(phase)
            }
            WaveKind::SawRev => {
                let p = positive_mod(phase / TAU, 1.0);
                1.0 - p * 2.0
            }
            WaveKind::Noise => self.next_noise(),
        };
        self.phase += TAU * freq / SAMPLE_RATE_F;
        if self.gliding {
            self.glide_pos += 1.0;
            let t = self.glide_pos * SEC_PER_SAMPLE * 1000.0 / self.glide_ms;
            if t >= 1.0 {
                self.freq = self.next_freq;
                self.gliding = false;
            } else {
                self.freq = t * self.next_freq + (1.0 - t) * self.prev_freq;
                if (self.next_freq - self.freq).abs() < 0.001 {
                    self.freq = self.next_freq;
                    self.gliding = false;
                }
            }
        }
        value * self.level
    }

    /// Xorshift noise in `[-1, 1)`.
    #[inline]
    fn next_noise(&mut self) -> f64 {
        let mut x = self.noise_state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.noise_state = x;
        (x >> 11) as f64 / (1u64 << 52) as f64 - 1.0
    }

    pub fn is_gliding(&self) -> bool {
        self.gliding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_tables() -> Arc<Wavetables> {
        Arc::new(Wavetables::generate(64))
    }

    fn sine_osc(freq: f64) -> Oscillator {
        let mut osc = Oscillator::new(true, test_tables());
        osc.kind = WaveKind::Sine;
        osc.freq = freq;
        osc
    }

    #[test]
    fn test_disabled_outputs_zero() {
        let mut osc = sine_osc(440.0);
        osc.enabled = false;
        assert_eq!(osc.step(1.0, 0.0), 0.0);
    }

    #[test]
    fn test_sine_frequency_by_zero_crossings() {
        let mut osc = sine_osc(442.0);
        osc.phase = 0.0;
        let mut crossings = 0i32;
        let mut prev = 0.0;
        for _ in 0..48_000 {
            let s = osc.step(1.0, 0.0);
            if prev <= 0.0 && s > 0.0 {
                crossings += 1;
            }
            prev = s;
        }
        assert!(
            (crossings - 442).abs() <= 2,
            "expected ~442 crossings, got {crossings}"
        );
    }

    #[test]
    fn test_freq_ratio_scales_pitch() {
        let mut osc = sine_osc(220.0);
        osc.phase = 0.0;
        let mut crossings = 0i32;
        let mut prev = 0.0;
        for _ in 0..48_000 {
            let s = osc.step(2.0, 0.0);
            if prev <= 0.0 && s > 0.0 {
                crossings += 1;
            }
            prev = s;
        }
        assert!(
            (crossings - 440).abs() <= 2,
            "expected ~440 crossings, got {crossings}"
        );
    }

    #[test]
    fn test_level_scales_output() {
        let mut osc = sine_osc(442.0);
        osc.level = 0.5;
        let peak = (0..4800).map(|_| osc.step(1.0, 0.0).abs()).fold(0.0f64, f64::max);
        assert!(peak <= 0.5 + 1e-9 && peak > 0.4, "peak {peak}");
    }

    #[test]
    fn test_waveform_ranges() {
        for kind in [
            WaveKind::Sine,
            WaveKind::Triangle,
            WaveKind::Square,
            WaveKind::Pulse,
            WaveKind::Saw,
            WaveKind::SawRev,
            WaveKind::Noise,
        ] {
            let mut osc = sine_osc(1000.0);
            osc.kind = kind;
            for _ in 0..4096 {
                let s = osc.step(1.0, 0.0);
                assert!((-1.0..=1.0).contains(&s), "{kind:?} out of range: {s}");
            }
        }
    }

    #[test]
    fn test_pulse_duty_quarter() {
        let mut osc = sine_osc(100.0);
        osc.kind = WaveKind::Pulse;
        let mut positive = 0usize;
        let total = 48_000;
        for _ in 0..total {
            if osc.step(1.0, 0.0) > 0.0 {
                positive += 1;
            }
        }
        let ratio = positive as f64 / total as f64;
        assert!((ratio - 0.25).abs() < 0.02, "duty {ratio}");
    }

    #[test]
    fn test_init_with_note_applies_pitch_offsets() {
        let mut osc = Oscillator::new(true, test_tables());
        let p = OscParams {
            enabled: true,
            kind: WaveKind::Saw,
            octave: 1,
            coarse: 0,
            fine: 0,
            level: 0.8,
        };
        osc.init_with_note(&p, 69);
        assert!((osc.freq - 884.0).abs() < 1e-9);
        assert_eq!(osc.kind, WaveKind::Saw);
        assert_eq!(osc.level, 0.8);
    }

    #[test]
    fn test_glide_interpolates_monotonically() {
        let mut osc = sine_osc(note_to_freq(60));
        let p = OscParams {
            enabled: true,
            kind: WaveKind::Sine,
            ..OscParams::default()
        };
        osc.glide(&p, 72, 100.0);
        assert!(osc.is_gliding());
        let target = note_to_freq(72);
        let mut prev = osc.freq;
        let mut samples = 0u32;
        while osc.is_gliding() {
            osc.step(1.0, 0.0);
            assert!(osc.freq >= prev - 1e-9, "glide went backwards");
            prev = osc.freq;
            samples += 1;
            assert!(samples < 10_000, "glide never finished");
        }
        assert!((osc.freq - target).abs() < 0.01);
        // 100ms at 48kHz
        assert!((4750..=4850).contains(&samples), "glide took {samples}");
    }

    #[test]
    fn test_glide_to_same_pitch_is_ignored() {
        let mut osc = sine_osc(note_to_freq(60));
        let p = OscParams {
            enabled: true,
            kind: WaveKind::Sine,
            ..OscParams::default()
        };
        osc.glide(&p, 60, 100.0);
        assert!(!osc.is_gliding());
    }

    #[test]
    fn test_zero_glide_time_jumps_immediately() {
        let mut osc = sine_osc(note_to_freq(60));
        let p = OscParams {
            enabled: true,
            kind: WaveKind::Sine,
            ..OscParams::default()
        };
        osc.glide(&p, 72, 0.0);
        osc.step(1.0, 0.0);
        assert!(!osc.is_gliding());
        assert!((osc.freq - note_to_freq(72)).abs() < 1e-9);
    }

    #[test]
    fn test_wavetable_output_follows_note() {
        let mut osc = Oscillator::new(true, test_tables());
        osc.kind = WaveKind::SawWt;
        osc.freq = note_to_freq(60);
        osc.level = 1.0;
        let mut energy = 0.0;
        for _ in 0..4800 {
            let s = osc.step(1.0, 0.0);
            assert!(s.is_finite());
            energy += s * s;
        }
        assert!(energy > 0.0, "wavetable oscillator silent");
    }
}
