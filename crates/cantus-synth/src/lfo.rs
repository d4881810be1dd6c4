//! Low-frequency oscillators for modulation.
//!
//! An LFO is an [`Oscillator`] dedicated to a destination. Stepping one
//! returns the modulation it contributes this sample as a bundle of ratios,
//! all identity when the LFO is disabled.

use crate::mod_matrix::Destination;
use crate::oscillator::{Oscillator, WaveKind};
use cantus_core::wavetable::Wavetables;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// LFO configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LfoParams {
    pub enabled: bool,
    pub destination: Destination,
    pub wave: WaveKind,
    /// Legacy wire-format field; carried for compatibility, never read.
    pub freq_type: String,
    pub freq: f64,
    pub amount: f64,
}

impl Default for LfoParams {
    fn default() -> Self {
        Self {
            enabled: false,
            destination: Destination::None,
            wave: WaveKind::Sine,
            freq_type: "none".to_owned(),
            freq: 0.0,
            amount: 0.0,
        }
    }
}

/// What one LFO contributes to the current sample.
#[derive(Debug, Clone, Copy)]
pub struct LfoOutput {
    pub freq_ratio: f64,
    pub phase_shift: f64,
    pub amp_ratio: f64,
    pub note_filter_freq_ratio: f64,
    pub filter_freq_ratio: f64,
}

impl LfoOutput {
    const IDENTITY: Self = Self {
        freq_ratio: 1.0,
        phase_shift: 0.0,
        amp_ratio: 1.0,
        note_filter_freq_ratio: 1.0,
        filter_freq_ratio: 1.0,
    };
}

/// One modulation LFO.
#[derive(Debug, Clone)]
pub struct Lfo {
    pub enabled: bool,
    pub destination: Destination,
    amount: f64,
    osc: Oscillator,
}

impl Lfo {
    pub fn new(tables: Arc<Wavetables>) -> Self {
        Self {
            enabled: false,
            destination: Destination::None,
            amount: 0.0,
            osc: Oscillator::new(true, tables),
        }
    }

    pub fn apply_params(&mut self, p: &LfoParams) {
        self.enabled = p.enabled;
        self.destination = p.destination;
        self.osc.kind = p.wave;
        self.osc.freq = p.freq;
        self.amount = p.amount;
    }

    /// Advance one sample.
    ///
    /// `carrier_freq` is the first oscillator's current frequency (the FM,
    /// PM, and AM destinations run the LFO at a multiple of it);
    /// `amount_gain` and `freq_ratio` come from the envelope-written bus.
    pub fn step(&mut self, carrier_freq: f64, amount_gain: f64, freq_ratio: f64) -> LfoOutput {
        if !self.enabled {
            return LfoOutput::IDENTITY;
        }
        let mut out = LfoOutput::IDENTITY;
        let amount = self.amount * amount_gain;
        match self.destination {
            Destination::Vibrato => {
                // `amount` is in cents of peak deviation.
                out.freq_ratio = 2f64.powf(self.osc.step(freq_ratio, 0.0) * amount / 100.0 / 12.0);
            }
            Destination::Tremolo => {
                out.amp_ratio = 1.0 + (self.osc.step(freq_ratio, 0.0) - 1.0) / 2.0 * amount;
            }
            Destination::Fm => {
                out.freq_ratio = 2f64
                    .powf(self.osc.step(carrier_freq * freq_ratio, 0.0) * amount / 100.0 / 12.0);
            }
            Destination::Pm => {
                out.phase_shift = self.osc.step(carrier_freq * freq_ratio, 0.0) * amount;
            }
            Destination::Am => {
                out.amp_ratio = 1.0 + self.osc.step(carrier_freq * freq_ratio, 0.0) * amount;
            }
            Destination::NoteFilterFreq => {
                out.note_filter_freq_ratio = 16f64.powf(self.osc.step(freq_ratio, 0.0) * amount);
            }
            Destination::FilterFreq => {
                out.filter_freq_ratio = 16f64.powf(self.osc.step(freq_ratio, 0.0) * amount);
            }
            _ => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cantus_core::wavetable::Wavetables;

    fn test_lfo(destination: Destination, freq: f64, amount: f64) -> Lfo {
        let mut lfo = Lfo::new(Arc::new(Wavetables::generate(32)));
        lfo.apply_params(&LfoParams {
            enabled: true,
            destination,
            wave: WaveKind::Sine,
            freq,
            amount,
            ..LfoParams::default()
        });
        lfo
    }

    #[test]
    fn test_disabled_returns_identity() {
        let mut lfo = test_lfo(Destination::Vibrato, 5.0, 100.0);
        lfo.enabled = false;
        let out = lfo.step(440.0, 1.0, 1.0);
        assert_eq!(out.freq_ratio, 1.0);
        assert_eq!(out.phase_shift, 0.0);
        assert_eq!(out.amp_ratio, 1.0);
    }

    #[test]
    fn test_vibrato_ratio_spans_amount_cents() {
        let mut lfo = test_lfo(Destination::Vibrato, 5.0, 100.0);
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for _ in 0..48_000 {
            let out = lfo.step(440.0, 1.0, 1.0);
            min = min.min(out.freq_ratio);
            max = max.max(out.freq_ratio);
            assert_eq!(out.amp_ratio, 1.0);
        }
        // ±100 cents ⇒ ratio sweeps ~[2^(-1/12), 2^(1/12)].
        assert!((max - 2f64.powf(1.0 / 12.0)).abs() < 0.01, "max {max}");
        assert!((min - 2f64.powf(-1.0 / 12.0)).abs() < 0.01, "min {min}");
    }

    #[test]
    fn test_tremolo_dips_by_amount() {
        let mut lfo = test_lfo(Destination::Tremolo, 3.0, 0.5);
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for _ in 0..48_000 {
            let out = lfo.step(440.0, 1.0, 1.0);
            min = min.min(out.amp_ratio);
            max = max.max(out.amp_ratio);
        }
        // amp = 1 + (osc − 1)/2·amount sweeps [1 − amount, 1].
        assert!((max - 1.0).abs() < 0.01, "max {max}");
        assert!((min - 0.5).abs() < 0.01, "min {min}");
    }

    #[test]
    fn test_amount_gain_scales_depth() {
        let mut full = test_lfo(Destination::Vibrato, 5.0, 100.0);
        let mut halved = test_lfo(Destination::Vibrato, 5.0, 100.0);
        let mut full_max = f64::MIN;
        let mut halved_max = f64::MIN;
        for _ in 0..48_000 {
            full_max = full_max.max(full.step(440.0, 1.0, 1.0).freq_ratio);
            halved_max = halved_max.max(halved.step(440.0, 0.5, 1.0).freq_ratio);
        }
        assert!(halved_max < full_max, "{halved_max} !< {full_max}");
    }

    #[test]
    fn test_pm_shifts_phase_only() {
        let mut lfo = test_lfo(Destination::Pm, 0.01, 2.0);
        let out = lfo.step(440.0, 1.0, 1.0);
        assert_eq!(out.freq_ratio, 1.0);
        assert_eq!(out.amp_ratio, 1.0);
        let mut seen_nonzero = out.phase_shift.abs() > 1e-6;
        for _ in 0..4800 {
            if lfo.step(440.0, 1.0, 1.0).phase_shift.abs() > 1e-6 {
                seen_nonzero = true;
            }
        }
        assert!(seen_nonzero, "PM never shifted phase");
    }

    #[test]
    fn test_filter_freq_ratio_uses_pow16() {
        let mut lfo = test_lfo(Destination::FilterFreq, 2.0, 1.0);
        let mut max = f64::MIN;
        for _ in 0..48_000 {
            max = max.max(lfo.step(440.0, 1.0, 1.0).filter_freq_ratio);
        }
        assert!((max - 16.0).abs() < 0.5, "max ratio {max}");
    }
}
