//! One synthesis voice: two oscillators, the amplitude envelope, both
//! filter stages, the formant bank, three LFOs, and three modulation
//! envelopes sharing a scratch modulation bus.
//!
//! Per sample the voice dispatches the edge event, advances the ADSR, lets
//! the envelopes write the bus, lets the LFOs read their gains and write
//! their ratios, then evaluates the oscillators through the filter chain.
//! Envelope stepping runs before LFO stepping within the sample.

use crate::adsr::{Adsr, AdsrParams, AdsrPhase};
use crate::envelope::{EnvelopeParams, ModEnvelope};
use crate::lfo::{Lfo, LfoParams};
use crate::mod_matrix::ModBus;
use crate::oscillator::{OscParams, Oscillator};
use cantus_core::formant::{Formant, FormantParams};
use cantus_core::filter::{FilterParams, FilterStage, NoteFilter, NoteFilterParams, TargetOsc};
use cantus_core::wavetable::Wavetables;
use cantus_core::OSC_GAIN;
use std::sync::Arc;

/// The note edge a voice sees on a given sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Edge {
    #[default]
    None,
    NoteOn,
    NoteOff,
}

/// A borrowed view of every parameter group a voice consumes, assembled by
/// the engine once per buffer.
#[derive(Clone, Copy)]
pub struct VoicePatch<'a> {
    pub oscs: &'a [OscParams; 2],
    pub adsr: &'a AdsrParams,
    pub note_filter: &'a NoteFilterParams,
    pub filter: &'a FilterParams,
    pub formant: &'a FormantParams,
    pub lfos: &'a [LfoParams; 3],
    pub envelopes: &'a [EnvelopeParams; 3],
}

/// One polyphonic voice.
#[derive(Debug, Clone)]
pub struct Voice {
    oscs: [Oscillator; 2],
    pub adsr: Adsr,
    note_filter: NoteFilter,
    filter: FilterStage,
    formant: Formant,
    lfos: [Lfo; 3],
    envelopes: [ModEnvelope; 3],
    bus: ModBus,
}

impl Voice {
    pub fn new(tables: Arc<Wavetables>) -> Self {
        Self {
            oscs: [
                Oscillator::new(true, Arc::clone(&tables)),
                Oscillator::new(false, Arc::clone(&tables)),
            ],
            adsr: Adsr::new(),
            note_filter: NoteFilter::new(),
            filter: FilterStage::new(),
            formant: Formant::new(),
            lfos: [
                Lfo::new(Arc::clone(&tables)),
                Lfo::new(Arc::clone(&tables)),
                Lfo::new(Arc::clone(&tables)),
            ],
            envelopes: Default::default(),
            bus: ModBus::new(),
        }
    }

    /// Pitch both oscillators for a fresh note.
    pub fn init_with_note(&mut self, oscs: &[OscParams; 2], note: u8) {
        for (osc, p) in self.oscs.iter_mut().zip(oscs) {
            osc.init_with_note(p, note);
        }
    }

    /// Glide both oscillators to a new note.
    pub fn glide(&mut self, oscs: &[OscParams; 2], note: u8, glide_ms: f64) {
        for (osc, p) in self.oscs.iter_mut().zip(oscs) {
            osc.glide(p, note, glide_ms);
        }
    }

    /// Load every parameter group. Called once per buffer for live voices.
    pub fn apply_params(&mut self, patch: &VoicePatch<'_>) {
        self.adsr.set_params(patch.adsr);
        self.note_filter.apply_params(patch.note_filter);
        self.filter.apply_params(patch.filter);
        self.formant.apply_params(patch.formant);
        for (lfo, p) in self.lfos.iter_mut().zip(patch.lfos) {
            lfo.apply_params(p);
        }
        for (envelope, p) in self.envelopes.iter_mut().zip(patch.envelopes) {
            envelope.apply_params(p);
        }
    }

    /// Render one sample.
    pub fn step(&mut self, edge: Edge) -> f64 {
        match edge {
            Edge::None => {}
            Edge::NoteOn => {
                self.adsr.note_on();
                for envelope in &mut self.envelopes {
                    envelope.note_on();
                }
            }
            Edge::NoteOff => {
                self.adsr.note_off();
                // Modulation envelopes ignore note-off.
            }
        }
        self.adsr.step();

        self.bus.reset();
        for envelope in &mut self.envelopes {
            envelope.step(&mut self.bus);
        }
        let carrier_freq = self.oscs[0].freq;
        for (i, lfo) in self.lfos.iter_mut().enumerate() {
            let out = lfo.step(carrier_freq, self.bus.lfo_amount_gain[i], self.bus.lfo_freq_ratio[i]);
            self.bus.freq_ratio *= out.freq_ratio;
            self.bus.phase_shift += out.phase_shift;
            self.bus.amp_ratio *= out.amp_ratio;
            self.bus.note_filter_freq_ratio *= out.note_filter_freq_ratio;
            self.bus.filter_freq_ratio *= out.filter_freq_ratio;
        }

        // The note filter tracks the (modulated) fundamental of osc 0.
        let tracked_freq = self.oscs[0].freq * self.bus.freq_ratio;

        let mut value = 0.0;
        for i in 0..2 {
            let mut v = self.oscs[i].step(self.bus.freq_ratio, self.bus.phase_shift)
                * OSC_GAIN
                * self.bus.amp_ratio
                * self.adsr.value()
                * self.bus.osc_volume_ratio[i];
            let target = if i == 0 { TargetOsc::Osc0 } else { TargetOsc::Osc1 };
            if self.note_filter.target_osc() == target {
                v = self.note_filter.process(
                    v,
                    self.bus.note_filter_freq_ratio,
                    self.bus.note_filter_q_exponent,
                    self.bus.note_filter_gain_ratio,
                    tracked_freq,
                );
            }
            if self.filter.target_osc == target {
                v = self.filter.process(
                    v,
                    self.bus.filter_freq_ratio,
                    self.bus.filter_q_exponent,
                    self.bus.filter_gain_ratio,
                );
            }
            value += v;
        }
        if self.note_filter.target_osc() == TargetOsc::All {
            value = self.note_filter.process(
                value,
                self.bus.note_filter_freq_ratio,
                self.bus.note_filter_q_exponent,
                self.bus.note_filter_gain_ratio,
                tracked_freq,
            );
        }
        if self.filter.target_osc == TargetOsc::All {
            value = self.filter.process(
                value,
                self.bus.filter_freq_ratio,
                self.bus.filter_q_exponent,
                self.bus.filter_gain_ratio,
            );
        }
        value = self.formant.process(value);

        assert!(value.is_finite(), "non-finite sample in voice chain");
        value
    }

    /// Current frequency of the first oscillator.
    pub fn fundamental(&self) -> f64 {
        self.oscs[0].freq
    }

    pub fn phase(&self) -> AdsrPhase {
        self.adsr.phase()
    }
}
