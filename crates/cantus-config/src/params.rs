//! The full parameter tree and the textual `set` protocol.
//!
//! The tree serializes to the same JSON shape the presets and the
//! `all_params` report use. The `set` protocol mutates one field at a
//! time: unknown keys are silently ignored, unparseable values error
//! without touching the field, and enum-valued keys fall back to their
//! `none` variant on unknown names (the wire format's long-standing
//! behavior).

use crate::error::ConfigError;
use cantus_core::echo::EchoParams;
use cantus_core::filter::{FilterKind, FilterParams, NoteFilterParams, TargetOsc};
use cantus_core::formant::{FormantParams, FormantVowel};
use cantus_synth::adsr::AdsrParams;
use cantus_synth::envelope::{EnvelopeKind, EnvelopeParams};
use cantus_synth::lfo::LfoParams;
use cantus_synth::mod_matrix::Destination;
use cantus_synth::oscillator::{OscParams, WaveKind};
use serde::{Deserialize, Serialize};

/// Everything the engine renders from, as one serializable tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Params {
    /// Voicing mode; `"poly"` or `"mono"` on the wire.
    #[serde(rename = "poly", with = "poly_mode")]
    pub poly_mode: bool,
    /// Glide time in milliseconds (mono mode).
    pub glide_time: u32,
    /// Velocity sensitivity, 0..=1.
    pub vel_sense: f64,
    pub oscs: [OscParams; 2],
    pub adsr: AdsrParams,
    pub note_filter: NoteFilterParams,
    pub filter: FilterParams,
    pub formant: FormantParams,
    pub lfos: [LfoParams; 3],
    pub envelopes: [EnvelopeParams; 3],
    pub echo: EchoParams,
}

mod poly_mode {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(poly: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(if *poly { "poly" } else { "mono" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(String::deserialize(d)? == "poly")
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            poly_mode: false,
            glide_time: 100,
            vel_sense: 0.0,
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
            echo: EchoParams::default(),
        }
    }
}

impl Params {
    /// Serialize the tree to the wire JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("parameter tree is always serializable")
    }

    /// Parse a whole tree. Nothing is applied on error.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One `set <group> <key> <value>` application.
pub trait ApplyKey {
    /// Apply a single key. Unknown keys are ignored; a value that fails to
    /// parse returns an error and leaves the field unchanged.
    fn apply_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError>;
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse().map_err(|_| ConfigError::invalid(key, value))
}

fn parse_i32(key: &str, value: &str) -> Result<i32, ConfigError> {
    value.parse().map_err(|_| ConfigError::invalid(key, value))
}

impl ApplyKey for OscParams {
    fn apply_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "enabled" => self.enabled = value == "true",
            "kind" => self.kind = WaveKind::from_name(value),
            "octave" => self.octave = parse_i32(key, value)?,
            "coarse" => self.coarse = parse_i32(key, value)?,
            "fine" => self.fine = parse_i32(key, value)?,
            "level" => self.level = parse_f64(key, value)?,
            _ => {}
        }
        Ok(())
    }
}

impl ApplyKey for AdsrParams {
    fn apply_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "attack" => self.attack = parse_f64(key, value)?,
            "decay" => self.decay = parse_f64(key, value)?,
            "sustain" => self.sustain = parse_f64(key, value)?,
            "release" => self.release = parse_f64(key, value)?,
            _ => {}
        }
        Ok(())
    }
}

impl ApplyKey for FilterParams {
    fn apply_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "enabled" => self.enabled = value == "true",
            "target_osc" => self.target_osc = TargetOsc::from_name(value),
            "kind" => self.kind = FilterKind::from_name(value),
            "freq" => self.freq = parse_f64(key, value)?,
            "q" => self.q = parse_f64(key, value)?,
            "gain" => self.gain = parse_f64(key, value)?,
            _ => {}
        }
        Ok(())
    }
}

impl ApplyKey for NoteFilterParams {
    fn apply_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "enabled" => self.enabled = value == "true",
            "target_osc" => self.target_osc = TargetOsc::from_name(value),
            "kind" => self.kind = FilterKind::from_name(value),
            "octave" => self.octave = parse_i32(key, value)?,
            "coarse" => self.coarse = parse_i32(key, value)?,
            "q" => self.q = parse_f64(key, value)?,
            "gain" => self.gain = parse_f64(key, value)?,
            _ => {}
        }
        Ok(())
    }
}

impl ApplyKey for FormantParams {
    fn apply_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "enabled" => self.enabled = value == "true",
            "kind" => self.kind = FormantVowel::from_name(value),
            // "freq" is the historical wire name for tone.
            "tone" | "freq" => self.tone = parse_f64(key, value)?,
            "q" => self.q = parse_f64(key, value)?,
            _ => {}
        }
        Ok(())
    }
}

impl ApplyKey for LfoParams {
    fn apply_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "enabled" => self.enabled = value == "true",
            "destination" => self.destination = Destination::from_name(value),
            "wave" => self.wave = WaveKind::from_name(value),
            "freq" => self.freq = parse_f64(key, value)?,
            "amount" => self.amount = parse_f64(key, value)?,
            _ => {}
        }
        Ok(())
    }
}

impl ApplyKey for EnvelopeParams {
    fn apply_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "enabled" => self.enabled = value == "true",
            "destination" => self.destination = Destination::from_name(value),
            "kind" => self.kind = EnvelopeKind::from_name(value),
            "delay" => self.delay = parse_f64(key, value)?,
            "attack" => self.attack = parse_f64(key, value)?,
            "amount" => self.amount = parse_f64(key, value)?,
            _ => {}
        }
        Ok(())
    }
}

impl ApplyKey for EchoParams {
    fn apply_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "enabled" => self.enabled = value == "true",
            "delay" => self.delay = parse_f64(key, value)?,
            "feedbackGain" => self.feedback_gain = parse_f64(key, value)?,
            "mix" => self.mix = parse_f64(key, value)?,
            _ => {}
        }
        Ok(())
    }
}
