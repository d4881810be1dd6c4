//! Criterion benchmarks for the voice chain
//!
//! Run with: cargo bench -p cantus-synth

use cantus_core::wavetable::Wavetables;
use cantus_synth::{
    AdsrParams, EnvelopeParams, LfoParams, NoteEvent, OscParams, VoicePatch, VoicePool, WaveKind,
};
use cantus_core::filter::{FilterParams, NoteFilterParams};
use cantus_core::formant::FormantParams;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

struct Groups {
    oscs: [OscParams; 2],
    adsr: AdsrParams,
    note_filter: NoteFilterParams,
    filter: FilterParams,
    formant: FormantParams,
    lfos: [LfoParams; 3],
    envelopes: [EnvelopeParams; 3],
}

impl Groups {
    fn new(kind: WaveKind) -> Self {
        Self {
            oscs: [
                OscParams {
                    enabled: true,
                    kind,
                    ..OscParams::default()
                },
                OscParams {
                    enabled: true,
                    kind,
                    coarse: 7,
                    ..OscParams::default()
                },
            ],
            adsr: AdsrParams::default(),
            note_filter: NoteFilterParams::default(),
            filter: FilterParams::default(),
            formant: FormantParams::default(),
            lfos: Default::default(),
            envelopes: Default::default(),
        }
    }

    fn patch(&self) -> VoicePatch<'_> {
        VoicePatch {
            oscs: &self.oscs,
            adsr: &self.adsr,
            note_filter: &self.note_filter,
            filter: &self.filter,
            formant: &self.formant,
            lfos: &self.lfos,
            envelopes: &self.envelopes,
        }
    }
}

fn bench_waveforms(c: &mut Criterion) {
    let tables = Arc::new(Wavetables::generate(256));
    let mut group = c.benchmark_group("VoiceWaveforms");

    for (name, kind) in [
        ("sine", WaveKind::Sine),
        ("saw", WaveKind::Saw),
        ("saw-wt", WaveKind::SawWt),
        ("noise", WaveKind::Noise),
    ] {
        let groups = Groups::new(kind);
        group.bench_function(name, |b| {
            let mut pool = VoicePool::with_capacity(Arc::clone(&tables), 4);
            pool.apply_params(&groups.patch());
            pool.tick(&[NoteEvent::note_on(60)], &groups.patch(), 0.0);
            b.iter(|| {
                for _ in 0..1024 {
                    black_box(pool.tick(&[], &groups.patch(), 0.0));
                }
            });
        });
    }
    group.finish();
}

fn bench_polyphony(c: &mut Criterion) {
    let tables = Arc::new(Wavetables::generate(256));
    let groups = Groups::new(WaveKind::Sine);
    let mut group = c.benchmark_group("Polyphony");

    for &voices in &[1usize, 8, 32, 128] {
        group.bench_with_input(BenchmarkId::new("tick_1024", voices), &voices, |b, &n| {
            let mut pool = VoicePool::with_capacity(Arc::clone(&tables), 128);
            let events: Vec<_> = (0..n as u8).map(NoteEvent::note_on).collect();
            pool.apply_params(&groups.patch());
            pool.tick(&events, &groups.patch(), 0.0);
            b.iter(|| {
                for _ in 0..1024 {
                    black_box(pool.tick(&[], &groups.patch(), 0.0));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_waveforms, bench_polyphony);
criterion_main!(benches);
