//! Cantus Synth - the voice chain and voice controllers
//!
//! Everything between a note event and a mono sample lives here:
//!
//! - [`Oscillator`] — waveform generation with glide and wavetable lookup
//! - [`Adsr`] — the Attack/Hold/Decay/Sustain/Release amplitude envelope
//! - [`Lfo`] and [`ModEnvelope`] — modulation sources writing the [`ModBus`]
//! - [`Voice`] — two oscillators through the filter chain and formant bank
//! - [`MonoVoice`] — single-voice controller with a legato note stack
//! - [`VoicePool`] — 128-voice polyphonic pool
//!
//! The engine crate drives these per sample; nothing here allocates on the
//! audio path after construction (filter coefficient storage is reused).

pub mod adsr;
pub mod envelope;
pub mod event;
pub mod lfo;
pub mod mod_matrix;
pub mod mono;
pub mod oscillator;
pub mod poly;
pub mod voice;

pub use adsr::{Adsr, AdsrParams, AdsrPhase};
pub use envelope::{EnvelopeKind, EnvelopeParams, ModEnvelope};
pub use event::NoteEvent;
pub use lfo::{Lfo, LfoOutput, LfoParams};
pub use mod_matrix::{Destination, ModBus};
pub use mono::{velocity_to_gain, MonoVoice};
pub use oscillator::{note_with_params_to_freq, OscParams, Oscillator, WaveKind};
pub use poly::VoicePool;
pub use voice::{Edge, Voice, VoicePatch};
