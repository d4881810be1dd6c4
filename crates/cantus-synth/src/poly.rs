//! Polyphonic voice pool.
//!
//! An arena of 128 voices split between `pooled` and `active` index stacks
//! (their sizes always sum to the pool size). NoteOn pops a pooled voice,
//! or logs and drops the event when the pool is dry. A voice returns to the
//! pool the first sample after its envelope falls back to None. No per-note
//! heap allocation happens after construction.

use crate::adsr::AdsrPhase;
use crate::event::NoteEvent;
use crate::mono::velocity_to_gain;
use crate::voice::{Edge, Voice, VoicePatch};
use cantus_core::wavetable::Wavetables;
use cantus_core::MAX_POLY;
use std::sync::Arc;

struct PoolSlot {
    voice: Voice,
    note: u8,
    gain: f64,
}

/// The polyphonic controller.
pub struct VoicePool {
    slots: Vec<PoolSlot>,
    pooled: Vec<usize>,
    active: Vec<usize>,
}

impl VoicePool {
    pub fn new(tables: Arc<Wavetables>) -> Self {
        Self::with_capacity(tables, MAX_POLY)
    }

    pub fn with_capacity(tables: Arc<Wavetables>, capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| PoolSlot {
                voice: Voice::new(Arc::clone(&tables)),
                note: 0,
                gain: 1.0,
            })
            .collect();
        Self {
            slots,
            pooled: (0..capacity).collect(),
            active: Vec::with_capacity(capacity),
        }
    }

    /// Load the patch into every live voice. Called once per buffer.
    pub fn apply_params(&mut self, patch: &VoicePatch<'_>) {
        for &i in &self.active {
            self.slots[i].voice.apply_params(patch);
        }
    }

    /// Render one sample, consuming this sample's events.
    pub fn tick(&mut self, events: &[NoteEvent], patch: &VoicePatch<'_>, vel_sense: f64) -> f64 {
        for event in events {
            if let NoteEvent::NoteOn { note, velocity } = *event {
                match self.pooled.pop() {
                    Some(i) => {
                        self.active.push(i);
                        let slot = &mut self.slots[i];
                        slot.note = note;
                        slot.gain = velocity_to_gain(velocity, vel_sense);
                        slot.voice.init_with_note(patch.oscs, note);
                        slot.voice.adsr.init(patch.adsr);
                        slot.voice.apply_params(patch);
                    }
                    None => {
                        tracing::warn!(note, "voice pool exhausted, dropping note-on");
                    }
                }
            }
        }

        let mut out = 0.0;
        for &i in &self.active {
            let slot = &mut self.slots[i];
            let mut edge = Edge::None;
            for event in events {
                match *event {
                    NoteEvent::NoteOff { note } if note == slot.note => edge = Edge::NoteOff,
                    NoteEvent::NoteOn { note, .. } if note == slot.note => edge = Edge::NoteOn,
                    _ => {}
                }
            }
            out += slot.voice.step(edge) * slot.gain;
        }

        // Retirement is deferred to the end of the sample.
        for j in (0..self.active.len()).rev() {
            let i = self.active[j];
            if self.slots[i].voice.phase() == AdsrPhase::None {
                self.active.remove(j);
                self.pooled.push(i);
            }
        }

        out
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn pooled_len(&self) -> usize {
        self.pooled.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adsr::AdsrParams;
    use crate::envelope::EnvelopeParams;
    use crate::lfo::LfoParams;
    use crate::oscillator::OscParams;
    use cantus_core::filter::{FilterParams, NoteFilterParams};
    use cantus_core::formant::FormantParams;

    struct Groups {
        oscs: [OscParams; 2],
        adsr: AdsrParams,
        note_filter: NoteFilterParams,
        filter: FilterParams,
        formant: FormantParams,
        lfos: [LfoParams; 3],
        envelopes: [EnvelopeParams; 3],
    }

    fn groups() -> Groups {
        Groups {
            oscs: [
                OscParams {
                    enabled: true,
                    ..OscParams::default()
                },
                OscParams::default(),
            ],
            adsr: AdsrParams::default(),
            note_filter: NoteFilterParams::default(),
            filter: FilterParams::default(),
            formant: FormantParams::default(),
            lfos: Default::default(),
            envelopes: Default::default(),
        }
    }

    fn patch(g: &Groups) -> VoicePatch<'_> {
        VoicePatch {
            oscs: &g.oscs,
            adsr: &g.adsr,
            note_filter: &g.note_filter,
            filter: &g.filter,
            formant: &g.formant,
            lfos: &g.lfos,
            envelopes: &g.envelopes,
        }
    }

    fn pool(capacity: usize) -> VoicePool {
        VoicePool::with_capacity(Arc::new(Wavetables::generate(32)), capacity)
    }

    #[test]
    fn test_pool_conservation_invariant() {
        let g = groups();
        let mut p = pool(8);
        assert_eq!(p.pooled_len() + p.active_len(), 8);

        p.tick(&[NoteEvent::note_on(60), NoteEvent::note_on(64)], &patch(&g), 0.0);
        assert_eq!(p.active_len(), 2);
        assert_eq!(p.pooled_len() + p.active_len(), 8);
    }

    #[test]
    fn test_exhaustion_drops_extra_notes() {
        let g = groups();
        let mut p = pool(4);
        let events: Vec<_> = (0..5).map(|n| NoteEvent::note_on(60 + n)).collect();
        let out = p.tick(&events, &patch(&g), 0.0);
        assert_eq!(p.active_len(), 4);
        assert_eq!(p.pooled_len(), 0);
        assert!(out.is_finite());
    }

    #[test]
    fn test_voice_returns_to_pool_after_release() {
        let mut g = groups();
        g.adsr.attack = 1.0;
        g.adsr.release = 10.0;
        let mut p = pool(4);
        p.tick(&[NoteEvent::note_on(60)], &patch(&g), 0.0);
        for _ in 0..2400 {
            p.tick(&[], &patch(&g), 0.0);
        }
        p.tick(&[NoteEvent::note_off(60)], &patch(&g), 0.0);

        let mut samples = 0u64;
        while p.active_len() > 0 {
            p.tick(&[], &patch(&g), 0.0);
            samples += 1;
            assert!(samples < 96_000, "voice never retired");
        }
        assert_eq!(p.pooled_len(), 4);
    }

    #[test]
    fn test_chord_sums_voices() {
        let g = groups();
        let mut p = pool(8);
        let mut single = pool(8);

        p.tick(
            &[
                NoteEvent::note_on(60),
                NoteEvent::note_on(64),
                NoteEvent::note_on(67),
            ],
            &patch(&g),
            0.0,
        );
        single.tick(&[NoteEvent::note_on(60)], &patch(&g), 0.0);

        let rms = |p: &mut VoicePool| {
            let mut sum = 0.0;
            for _ in 0..24_000 {
                let v = p.tick(&[], &patch(&g), 0.0);
                sum += v * v;
            }
            (sum / 24_000.0).sqrt()
        };
        let chord_rms = rms(&mut p);
        let single_rms = rms(&mut single);
        assert!(
            chord_rms > single_rms * 1.3,
            "chord {chord_rms} vs single {single_rms}"
        );
    }

    #[test]
    fn test_note_off_only_releases_matching_voice() {
        let g = groups();
        let mut p = pool(8);
        p.tick(&[NoteEvent::note_on(60), NoteEvent::note_on(64)], &patch(&g), 0.0);
        p.tick(&[NoteEvent::note_off(60)], &patch(&g), 0.0);
        // 64 still holds; 60 is releasing but not yet retired.
        assert_eq!(p.active_len(), 2);
        for _ in 0..96_000 {
            p.tick(&[], &patch(&g), 0.0);
        }
        assert_eq!(p.active_len(), 1, "held voice must survive");
    }
}
