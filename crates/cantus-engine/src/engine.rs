//! The engine: parameter store, event buckets, render loop, and the
//! command protocol.
//!
//! All mutable state lives behind one mutex, held for the full duration of
//! each render pass and each command application. Command application is
//! O(1) and render passes are bounded, so the coarse lock is correct and
//! cheap. No lock is held across the audio-device write; the backend pulls
//! a filled byte buffer and the lock is released before it is consumed.

use crate::event::EventBuckets;
use cantus_analysis::{frequency_response, ring_spectrum, Fft};
use cantus_config::{ApplyKey, ConfigError, Params, PresetStore};
use cantus_core::echo::Echo;
use cantus_core::filter::{FilterKernel, FilterKind};
use cantus_core::wavetable::Wavetables;
use cantus_core::{BYTES_PER_FRAME, FFT_SIZE, SAMPLES_PER_CYCLE, SEC_PER_SAMPLE};
use cantus_synth::{MonoVoice, NoteEvent, VoicePatch, VoicePool};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use thiserror::Error;

/// Change flag recorded on any parameter mutation.
pub const CHANGE_DATA: &str = "data";
/// Change flag recorded on fixed-filter mutations.
pub const CHANGE_FILTER_SHAPE: &str = "filter-shape";
/// Change flag recorded when the whole tree is replaced (preset load).
pub const CHANGE_ALL_PARAMS: &str = "all_params";
/// Change flag recorded when the preset list mutates.
pub const CHANGE_PRESET_LIST: &str = "preset_list";

/// Errors surfaced on the command channel.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("missing argument for '{0}'")]
    MissingArgument(String),

    #[error("invalid argument '{value}' for '{command}'")]
    InvalidArgument { command: String, value: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Pending change flags plus protocol errors awaiting the report thread.
#[derive(Default)]
pub struct Changes {
    flags: Mutex<HashSet<&'static str>>,
    errors: Mutex<Vec<String>>,
}

impl Changes {
    pub fn add(&self, key: &'static str) {
        self.flags.lock().unwrap().insert(key);
    }

    /// Check and clear a flag.
    pub fn take(&self, key: &str) -> bool {
        self.flags.lock().unwrap().remove(key)
    }

    pub fn push_error(&self, message: String) {
        self.errors.lock().unwrap().push(message);
    }

    pub fn drain_errors(&self) -> Vec<String> {
        std::mem::take(&mut *self.errors.lock().unwrap())
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    polyphony: usize,
    process_time: f64,
}

struct EngineState {
    params: Params,
    presets: PresetStore,
    events: EventBuckets,
    ring: Vec<f64>,
    scratch: Vec<f64>,
    pos: u64,
    last_read: Instant,
    process_time: f64,
    mono: MonoVoice,
    poly: VoicePool,
    echo: Echo,
}

/// The synthesizer engine.
pub struct Engine {
    state: Mutex<EngineState>,
    changes: Changes,
    fft: Fft,
}

impl Engine {
    pub fn new(tables: Arc<Wavetables>, preset_dir: impl Into<PathBuf>) -> Self {
        Self {
            state: Mutex::new(EngineState {
                params: Params::default(),
                presets: PresetStore::new(preset_dir),
                events: EventBuckets::new(2 * SAMPLES_PER_CYCLE),
                ring: vec![0.0; FFT_SIZE],
                scratch: Vec::with_capacity(SAMPLES_PER_CYCLE),
                pos: 0,
                last_read: Instant::now(),
                process_time: 0.0,
                mono: MonoVoice::new(Arc::clone(&tables)),
                poly: VoicePool::new(tables),
                echo: Echo::new(),
            }),
            changes: Changes::default(),
            fft: Fft::new(FFT_SIZE),
        }
    }

    /// Pending change flags and protocol errors.
    pub fn changes(&self) -> &Changes {
        &self.changes
    }

    /// Fill a byte buffer of whole interleaved frames.
    ///
    /// One render pass: dispatch the due events sample by sample through
    /// the active voicing mode, run the echo, write the ring, pack PCM,
    /// advance the clock, shift the event window, and check the realtime
    /// budget.
    pub fn render(&self, buf: &mut [u8]) {
        let started = Instant::now();
        let frames = buf.len() / BYTES_PER_FRAME;
        debug_assert!(frames <= SAMPLES_PER_CYCLE, "render of {frames} frames");

        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        state.scratch.clear();
        state.scratch.resize(frames, 0.0);

        state.echo.apply_params(&state.params.echo);
        let patch = VoicePatch {
            oscs: &state.params.oscs,
            adsr: &state.params.adsr,
            note_filter: &state.params.note_filter,
            filter: &state.params.filter,
            formant: &state.params.formant,
            lfos: &state.params.lfos,
            envelopes: &state.params.envelopes,
        };
        let glide_ms = state.params.glide_time as f64;
        let vel_sense = state.params.vel_sense;

        if state.params.poly_mode {
            state.poly.apply_params(&patch);
            for i in 0..frames {
                let value = state.poly.tick(state.events.at(i), &patch, vel_sense);
                state.scratch[i] = state.echo.process(value);
            }
        } else {
            state.mono.apply_params(&patch);
            for i in 0..frames {
                let value = state
                    .mono
                    .tick(state.events.at(i), &patch, glide_ms, vel_sense);
                state.scratch[i] = state.echo.process(value);
            }
        }

        cantus_io::pcm::pack_frames(&state.scratch, buf);

        // Circular write into the spectrum ring.
        let offset = (state.pos % FFT_SIZE as u64) as usize;
        for (i, &v) in state.scratch.iter().enumerate() {
            state.ring[(offset + i) % FFT_SIZE] = v;
        }

        state.pos += frames as u64;
        state.last_read = started;
        state.events.shift(frames);

        state.process_time = started.elapsed().as_secs_f64();
        let budget = frames as f64 * SEC_PER_SAMPLE;
        if state.process_time > budget {
            tracing::warn!(
                process_ms = state.process_time * 1000.0,
                polyphony = state.poly.active_len(),
                "render exceeded realtime budget"
            );
        }
    }

    /// Decode a raw MIDI message and schedule the note event.
    ///
    /// Only note-on/note-off are interpreted; everything else is ignored.
    pub fn submit_midi_bytes(&self, data: &[u8]) {
        if data.len() < 3 {
            return;
        }
        let status = data[0] >> 4;
        if status == 8 || (status == 9 && data[2] == 0) {
            self.schedule_event(NoteEvent::note_off(data[1]));
        } else if status == 9 {
            self.schedule_event(NoteEvent::NoteOn {
                note: data[1],
                velocity: data[2],
            });
        }
    }

    fn schedule_event(&self, event: NoteEvent) {
        let mut state = self.state.lock().unwrap();
        let offset = state.last_read.elapsed().as_secs_f64();
        let index = (offset / SEC_PER_SAMPLE) as i64;
        state.events.insert(index, event);
    }

    /// Apply one command (already split into percent-decoded tokens).
    ///
    /// A parse failure leaves the parameter store untouched and surfaces
    /// the error; it never tears down the engine.
    pub fn apply_command(&self, command: &[String]) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let head = command
            .first()
            .ok_or_else(|| EngineError::MissingArgument("<command>".into()))?;
        match head.as_str() {
            "set" => {
                self.apply_set(&mut state, &command[1..])?;
                self.changes.add(CHANGE_DATA);
            }
            "mono" => {
                state.params.poly_mode = false;
                self.changes.add(CHANGE_DATA);
            }
            "poly" => {
                state.params.poly_mode = true;
                self.changes.add(CHANGE_DATA);
            }
            "note_on" => {
                let note = parse_note(command, "note_on")?;
                drop(state);
                self.schedule_event(NoteEvent::note_on(note));
            }
            "note_off" => {
                let note = parse_note(command, "note_off")?;
                drop(state);
                self.schedule_event(NoteEvent::note_off(note));
            }
            "preset" => self.apply_preset(&mut state, &command[1..])?,
            other => return Err(EngineError::UnknownCommand(other.to_owned())),
        }
        Ok(())
    }

    fn apply_set(&self, state: &mut EngineState, command: &[String]) -> Result<(), EngineError> {
        let group = command
            .first()
            .ok_or_else(|| EngineError::MissingArgument("set".into()))?;
        let rest = &command[1..];
        match group.as_str() {
            "glide_time" => {
                let value = rest
                    .first()
                    .ok_or_else(|| EngineError::MissingArgument("set glide_time".into()))?;
                state.params.glide_time =
                    value.parse().map_err(|_| EngineError::InvalidArgument {
                        command: "set glide_time".into(),
                        value: value.clone(),
                    })?;
            }
            "vel_sense" => {
                let value = rest
                    .first()
                    .ok_or_else(|| EngineError::MissingArgument("set vel_sense".into()))?;
                state.params.vel_sense =
                    value.parse().map_err(|_| EngineError::InvalidArgument {
                        command: "set vel_sense".into(),
                        value: value.clone(),
                    })?;
            }
            "osc" => {
                let (index, key, value) = indexed_key_value(rest, "set osc", 2)?;
                state.params.oscs[index].apply_key(key, value)?;
            }
            "adsr" => {
                let (key, value) = key_value(rest, "set adsr")?;
                state.params.adsr.apply_key(key, value)?;
            }
            "note_filter" => {
                let (key, value) = key_value(rest, "set note_filter")?;
                state.params.note_filter.apply_key(key, value)?;
            }
            "filter" => {
                let (key, value) = key_value(rest, "set filter")?;
                state.params.filter.apply_key(key, value)?;
                self.changes.add(CHANGE_FILTER_SHAPE);
            }
            "formant" => {
                let (key, value) = key_value(rest, "set formant")?;
                state.params.formant.apply_key(key, value)?;
            }
            "lfo" => {
                let (index, key, value) = indexed_key_value(rest, "set lfo", 3)?;
                state.params.lfos[index].apply_key(key, value)?;
            }
            "envelope" => {
                let (index, key, value) = indexed_key_value(rest, "set envelope", 3)?;
                state.params.envelopes[index].apply_key(key, value)?;
            }
            "echo" => {
                let (key, value) = key_value(rest, "set echo")?;
                state.params.echo.apply_key(key, value)?;
            }
            other => return Err(EngineError::UnknownCommand(format!("set {other}"))),
        }
        Ok(())
    }

    fn apply_preset(&self, state: &mut EngineState, command: &[String]) -> Result<(), EngineError> {
        let action = command
            .first()
            .ok_or_else(|| EngineError::MissingArgument("preset".into()))?;
        match action.as_str() {
            "list" => {
                self.changes.add(CHANGE_PRESET_LIST);
            }
            "load" => {
                let name = command
                    .get(1)
                    .ok_or_else(|| EngineError::MissingArgument("preset load".into()))?;
                state.params = state.presets.load(name)?;
                self.changes.add(CHANGE_ALL_PARAMS);
                self.changes.add(CHANGE_DATA);
            }
            "save" => {
                let params = state.params.clone();
                state.presets.save(&params)?;
                self.changes.add(CHANGE_PRESET_LIST);
            }
            "save_as" => {
                let name = command
                    .get(1)
                    .ok_or_else(|| EngineError::MissingArgument("preset save_as".into()))?;
                let params = state.params.clone();
                state.presets.save_as(name, &params)?;
                self.changes.add(CHANGE_PRESET_LIST);
            }
            "delete" => {
                let name = command
                    .get(1)
                    .ok_or_else(|| EngineError::MissingArgument("preset delete".into()))?;
                state.presets.delete(name)?;
                self.changes.add(CHANGE_PRESET_LIST);
            }
            other => return Err(EngineError::UnknownCommand(format!("preset {other}"))),
        }
        Ok(())
    }

    /// The parameter tree as wire JSON.
    pub fn params_json(&self) -> String {
        self.state.lock().unwrap().params.to_json()
    }

    /// Engine status as wire JSON.
    pub fn status_json(&self) -> String {
        let state = self.state.lock().unwrap();
        let status = StatusReport {
            polyphony: state.poly.active_len(),
            process_time: state.process_time,
        };
        serde_json::to_string(&status).expect("status report is always serializable")
    }

    /// The preset index as wire JSON.
    pub fn preset_list_json(&self) -> Result<String, EngineError> {
        Ok(self.state.lock().unwrap().presets.list_json()?)
    }

    /// Hann-windowed magnitude spectrum of the last rendered window
    /// (1024 bins). The ring is copied under the lock; the transform runs
    /// outside it.
    pub fn spectrum(&self) -> Vec<f64> {
        let (ring, offset) = {
            let state = self.state.lock().unwrap();
            (
                state.ring.clone(),
                (state.pos % FFT_SIZE as u64) as usize,
            )
        };
        ring_spectrum(&self.fft, &ring, offset)
    }

    /// Magnitude response preview of the fixed filter (1024 bins).
    /// A disabled filter previews as the identity shape.
    pub fn filter_shape(&self) -> Vec<f64> {
        let (kind, n, freq, q, gain) = {
            let state = self.state.lock().unwrap();
            let p = &state.params.filter;
            let kind = if p.enabled { p.kind } else { FilterKind::None };
            (kind, p.n, p.freq, p.q, p.gain)
        };
        let mut kernel = FilterKernel::new();
        kernel.design(kind, n, freq, q, gain);
        frequency_response(&self.fft, &kernel)
    }

    /// Restore the `_tmp` session state, if any.
    pub fn restore_session(&self) {
        let mut state = self.state.lock().unwrap();
        match state.presets.load_session() {
            Ok(Some(params)) => {
                state.params = params;
                tracing::info!("restored session parameters");
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "failed to restore session parameters"),
        }
    }

    /// Persist the `_tmp` session state.
    pub fn save_session(&self) {
        let state = self.state.lock().unwrap();
        if let Err(e) = state.presets.save_session(&state.params) {
            tracing::warn!(error = %e, "failed to save session parameters");
        }
    }

    /// Number of currently active poly voices.
    pub fn polyphony(&self) -> usize {
        self.state.lock().unwrap().poly.active_len()
    }

    #[doc(hidden)]
    pub fn debug_voice_counts(&self) -> (usize, usize) {
        let state = self.state.lock().unwrap();
        (state.poly.pooled_len(), state.poly.active_len())
    }

    #[doc(hidden)]
    pub fn debug_mono_fundamental(&self) -> f64 {
        self.state.lock().unwrap().mono.fundamental()
    }
}

fn parse_note(command: &[String], name: &str) -> Result<u8, EngineError> {
    let value = command
        .get(1)
        .ok_or_else(|| EngineError::MissingArgument(name.to_owned()))?;
    value.parse().map_err(|_| EngineError::InvalidArgument {
        command: name.to_owned(),
        value: value.clone(),
    })
}

fn key_value<'a>(rest: &'a [String], name: &str) -> Result<(&'a str, &'a str), EngineError> {
    match rest {
        [key, value] => Ok((key, value)),
        _ => Err(EngineError::MissingArgument(name.to_owned())),
    }
}

fn indexed_key_value<'a>(
    rest: &'a [String],
    name: &str,
    bound: usize,
) -> Result<(usize, &'a str, &'a str), EngineError> {
    match rest {
        [index, key, value] => {
            let index: usize = index.parse().map_err(|_| EngineError::InvalidArgument {
                command: name.to_owned(),
                value: index.clone(),
            })?;
            if index >= bound {
                return Err(EngineError::InvalidArgument {
                    command: name.to_owned(),
                    value: index.to_string(),
                });
            }
            Ok((index, key, value))
        }
        _ => Err(EngineError::MissingArgument(name.to_owned())),
    }
}

/// Drain the bounded command queue until it closes, applying each command
/// and surfacing failures on the report channel.
pub fn run_command_loop(engine: Arc<Engine>, rx: crossbeam_channel::Receiver<Vec<String>>) {
    for command in rx {
        if let Err(e) = engine.apply_command(&command) {
            tracing::warn!(error = %e, ?command, "command rejected");
            engine.changes().push_error(e.to_string());
        }
    }
    tracing::debug!("command loop ended");
}
