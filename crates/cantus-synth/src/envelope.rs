//! Modulation envelopes.
//!
//! An AHD-only shape: the underlying ADSR machine is configured with a
//! zero-length attack, the `delay` parameter as the hold, the `attack`
//! parameter as the decay, and no sustain or release. `Coming` envelopes
//! read the raw value (1 falling to 0); `Going` envelopes invert it.
//! Modulation envelopes never respond to note-off.

use crate::adsr::Adsr;
use crate::mod_matrix::{Destination, ModBus};
use serde::{Deserialize, Serialize};

/// Direction of a modulation envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnvelopeKind {
    /// Value decays from 1 to 0.
    #[default]
    Coming,
    /// Inverted: value rises from 0 to 1.
    Going,
}

impl EnvelopeKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "going" => Self::Going,
            _ => Self::Coming,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Coming => "coming",
            Self::Going => "going",
        }
    }
}

impl From<String> for EnvelopeKind {
    fn from(s: String) -> Self {
        Self::from_name(&s)
    }
}

impl From<EnvelopeKind> for String {
    fn from(k: EnvelopeKind) -> Self {
        k.name().to_owned()
    }
}

/// Modulation-envelope configuration (times in milliseconds).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvelopeParams {
    pub enabled: bool,
    pub destination: Destination,
    pub kind: EnvelopeKind,
    pub delay: f64,
    pub attack: f64,
    pub amount: f64,
}

/// One modulation envelope routed to a destination.
#[derive(Debug, Clone, Default)]
pub struct ModEnvelope {
    pub enabled: bool,
    pub destination: Destination,
    kind: EnvelopeKind,
    amount: f64,
    adsr: Adsr,
}

impl ModEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_params(&mut self, p: &EnvelopeParams) {
        self.enabled = p.enabled;
        self.destination = p.destination;
        self.kind = p.kind;
        self.amount = p.amount;
        // Delay→Hold→Decay on the shared machine: zero attack to the peak,
        // hold for `delay`, decay toward zero over `attack`.
        self.adsr.set_segments(0.0, 1.0, 0.0, p.delay, p.attack, 0.0, 0.0);
    }

    /// Retrigger at note-on. There is deliberately no note-off counterpart.
    pub fn note_on(&mut self) {
        self.adsr.note_on();
    }

    /// Advance one sample and fold the current value into the bus.
    pub fn step(&mut self, bus: &mut ModBus) {
        if !self.enabled {
            return;
        }
        self.adsr.step();
        let mut v = self.adsr.value();
        if self.kind == EnvelopeKind::Going {
            v = 1.0 - v;
        }
        match self.destination {
            Destination::Osc0Volume => bus.osc_volume_ratio[0] *= 1.0 - v,
            Destination::Osc1Volume => bus.osc_volume_ratio[1] *= 1.0 - v,
            Destination::Freq => bus.freq_ratio *= 2f64.powf(v * self.amount),
            Destination::NoteFilterFreq => {
                bus.note_filter_freq_ratio *= 2f64.powf(v * self.amount)
            }
            Destination::NoteFilterQ => bus.note_filter_q_exponent *= 1.0 - v,
            Destination::NoteFilterGain => bus.note_filter_gain_ratio *= 1.0 - v,
            Destination::FilterFreq => bus.filter_freq_ratio *= 2f64.powf(v * self.amount),
            Destination::FilterQ => bus.filter_q_exponent *= 1.0 - v,
            Destination::FilterGain => bus.filter_gain_ratio *= 1.0 - v,
            _ => {
                if let Some(i) = self.destination.lfo_freq_index() {
                    bus.lfo_freq_ratio[i] *= 2f64.powf(v);
                } else if let Some(i) = self.destination.lfo_amount_index() {
                    bus.lfo_amount_gain[i] *= 1.0 - v;
                }
            }
        }
    }
}
