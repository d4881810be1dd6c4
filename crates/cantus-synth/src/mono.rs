//! Monophonic voice controller with legato glide.
//!
//! One voice plus an insertion-ordered note stack (most recent first, 128
//! deep). The first note initializes the voice; stacked notes glide the
//! pitch and ramp the velocity gain; releasing back to an empty stack
//! triggers the release edge.

use crate::event::NoteEvent;
use crate::voice::{Edge, Voice, VoicePatch};
use cantus_core::wavetable::Wavetables;
use cantus_core::Ramp;
use std::sync::Arc;

/// Gain derived from velocity and velocity sensitivity.
#[inline]
pub fn velocity_to_gain(velocity: u8, vel_sense: f64) -> f64 {
    1.0 - (1.0 - velocity as f64 / 127.0) * vel_sense
}

const STACK_CAPACITY: usize = 128;

/// The monophonic controller.
pub struct MonoVoice {
    voice: Voice,
    /// Most recent note first.
    active_notes: Vec<(u8, u8)>,
    gain: Ramp,
}

impl MonoVoice {
    pub fn new(tables: Arc<Wavetables>) -> Self {
        let mut gain = Ramp::new();
        gain.init(1.0);
        Self {
            voice: Voice::new(tables),
            active_notes: Vec::with_capacity(STACK_CAPACITY),
            gain,
        }
    }

    /// Load the patch into the voice. Called once per buffer.
    pub fn apply_params(&mut self, patch: &VoicePatch<'_>) {
        self.voice.apply_params(patch);
    }

    /// Render one sample, consuming this sample's events.
    pub fn tick(
        &mut self,
        events: &[NoteEvent],
        patch: &VoicePatch<'_>,
        glide_ms: f64,
        vel_sense: f64,
    ) -> f64 {
        let mut edge = Edge::None;
        for event in events {
            match *event {
                NoteEvent::NoteOn { note, velocity } => {
                    if self.active_notes.len() >= STACK_CAPACITY {
                        continue;
                    }
                    self.active_notes.insert(0, (note, velocity));
                    let gain = velocity_to_gain(velocity, vel_sense);
                    if self.active_notes.len() == 1 {
                        self.voice.init_with_note(patch.oscs, note);
                        self.gain.init(gain);
                        edge = Edge::NoteOn;
                    } else {
                        self.voice.glide(patch.oscs, note, glide_ms);
                        self.gain.exponential(glide_ms, gain, 0.001);
                    }
                }
                NoteEvent::NoteOff { note } => {
                    self.active_notes.retain(|&(n, _)| n != note);
                    if let Some(&(top, velocity)) = self.active_notes.first() {
                        self.voice.glide(patch.oscs, top, glide_ms);
                        let gain = velocity_to_gain(velocity, vel_sense);
                        self.gain.exponential(glide_ms, gain, 0.001);
                    } else {
                        edge = Edge::NoteOff;
                    }
                }
            }
        }
        self.gain.step();
        self.voice.step(edge) * self.gain.value()
    }

    /// Instantaneous frequency of the first oscillator.
    pub fn fundamental(&self) -> f64 {
        self.voice.fundamental()
    }

    pub fn is_active(&self) -> bool {
        self.voice.adsr.is_active()
    }

    /// Held notes, most recent first.
    pub fn held_notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.active_notes.iter().map(|&(n, _)| n)
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
    use cantus_core::{note_to_freq, SAMPLE_RATE};

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

    fn mono() -> MonoVoice {
        MonoVoice::new(Arc::new(Wavetables::generate(32)))
    }

    #[test]
    fn test_first_note_initializes_pitch() {
        let g = groups();
        let mut m = mono();
        m.apply_params(&patch(&g));
        m.tick(&[NoteEvent::note_on(60)], &patch(&g), 100.0, 0.0);
        assert!((m.fundamental() - note_to_freq(60)).abs() < 1e-9);
        assert!(m.is_active());
    }

    #[test]
    fn test_legato_glides_monotonically_to_target() {
        let g = groups();
        let mut m = mono();
        m.apply_params(&patch(&g));
        m.tick(&[NoteEvent::note_on(60)], &patch(&g), 100.0, 0.0);
        for _ in 0..4800 {
            m.tick(&[], &patch(&g), 100.0, 0.0);
        }
        m.tick(&[NoteEvent::note_on(72)], &patch(&g), 100.0, 0.0);

        let start = note_to_freq(60);
        let target = note_to_freq(72);
        let mut prev = start;
        let mut checkpoints = Vec::new();
        for i in 0..4800 {
            m.tick(&[], &patch(&g), 100.0, 0.0);
            let f = m.fundamental();
            assert!(f >= prev - 1e-9, "glide regressed at sample {i}");
            prev = f;
            if i % 480 == 0 {
                checkpoints.push(f);
            }
        }
        assert!((m.fundamental() - target).abs() < 0.01);
        assert!(checkpoints.first().unwrap() < checkpoints.last().unwrap());
    }

    #[test]
    fn test_release_of_top_note_returns_to_stacked_note() {
        let g = groups();
        let mut m = mono();
        m.apply_params(&patch(&g));
        m.tick(&[NoteEvent::note_on(60)], &patch(&g), 10.0, 0.0);
        m.tick(&[NoteEvent::note_on(72)], &patch(&g), 10.0, 0.0);
        m.tick(&[NoteEvent::note_off(72)], &patch(&g), 10.0, 0.0);
        // Glide back toward the still-held 60.
        for _ in 0..SAMPLE_RATE / 10 {
            m.tick(&[], &patch(&g), 10.0, 0.0);
        }
        assert!((m.fundamental() - note_to_freq(60)).abs() < 0.01);
        assert!(m.is_active());
    }

    #[test]
    fn test_all_notes_off_releases_then_silences() {
        let mut g = groups();
        g.adsr.release = 20.0;
        let mut m = mono();
        m.apply_params(&patch(&g));
        m.tick(&[NoteEvent::note_on(64)], &patch(&g), 10.0, 0.0);
        for _ in 0..4800 {
            m.tick(&[], &patch(&g), 10.0, 0.0);
        }
        m.tick(&[NoteEvent::note_off(64)], &patch(&g), 10.0, 0.0);

        let mut samples = 0u64;
        while m.is_active() {
            m.tick(&[], &patch(&g), 10.0, 0.0);
            samples += 1;
            assert!(samples < 2 * SAMPLE_RATE as u64, "never went silent");
        }
        for _ in 0..1000 {
            let v = m.tick(&[], &patch(&g), 10.0, 0.0);
            assert!(v.abs() < 1e-3, "output after release {v}");
        }
    }

    #[test]
    fn test_duplicate_note_off_removes_all_matching_entries() {
        let g = groups();
        let mut m = mono();
        m.apply_params(&patch(&g));
        m.tick(&[NoteEvent::note_on(60)], &patch(&g), 10.0, 0.0);
        m.tick(&[NoteEvent::note_on(60)], &patch(&g), 10.0, 0.0);
        m.tick(&[NoteEvent::note_off(60)], &patch(&g), 10.0, 0.0);
        assert_eq!(m.held_notes().count(), 0);
    }

    #[test]
    fn test_velocity_sense_scales_gain() {
        let g = groups();
        let mut soft = mono();
        soft.apply_params(&patch(&g));
        soft.tick(&[NoteEvent::NoteOn { note: 69, velocity: 32 }], &patch(&g), 10.0, 1.0);
        let mut loud = mono();
        loud.apply_params(&patch(&g));
        loud.tick(&[NoteEvent::NoteOn { note: 69, velocity: 127 }], &patch(&g), 10.0, 1.0);

        let rms = |m: &mut MonoVoice| {
            let mut sum = 0.0;
            for _ in 0..24_000 {
                let v = m.tick(&[], &patch(&g), 10.0, 1.0);
                sum += v * v;
            }
            (sum / 24_000.0).sqrt()
        };
        let soft_rms = rms(&mut soft);
        let loud_rms = rms(&mut loud);
        assert!(
            loud_rms > soft_rms * 2.0,
            "loud {loud_rms} vs soft {soft_rms}"
        );
    }

    #[test]
    fn test_velocity_to_gain_formula() {
        assert_eq!(velocity_to_gain(127, 1.0), 1.0);
        assert!((velocity_to_gain(0, 1.0)).abs() < 1e-12);
        assert_eq!(velocity_to_gain(0, 0.0), 1.0);
        assert!((velocity_to_gain(64, 0.5) - (1.0 - (1.0 - 64.0 / 127.0) * 0.5)).abs() < 1e-12);
    }
}
