//! Modulation destinations and the per-sample modulation bus.
//!
//! Destinations stay a flat enum; routing is a match in each source's
//! combine step, never a subscriber list. The bus is reset to identity at
//! the top of every sample, written by the envelopes, then by the LFOs, and
//! finally read by the oscillators and filter stages.

use serde::{Deserialize, Serialize};

/// Modulation destinations addressable by LFOs and envelopes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Destination {
    #[default]
    None,
    Osc0Volume,
    Osc1Volume,
    Vibrato,
    Tremolo,
    Fm,
    Pm,
    Am,
    Freq,
    NoteFilterFreq,
    NoteFilterQ,
    NoteFilterGain,
    FilterFreq,
    FilterQ,
    FilterGain,
    Lfo0Freq,
    Lfo1Freq,
    Lfo2Freq,
    Lfo0Amount,
    Lfo1Amount,
    Lfo2Amount,
}

impl Destination {
    pub fn from_name(name: &str) -> Self {
        match name {
            "osc0_volume" => Self::Osc0Volume,
            "osc1_volume" => Self::Osc1Volume,
            "vibrato" => Self::Vibrato,
            "tremolo" => Self::Tremolo,
            "fm" => Self::Fm,
            "pm" => Self::Pm,
            "am" => Self::Am,
            "freq" => Self::Freq,
            "note_filter_freq" => Self::NoteFilterFreq,
            "note_filter_q" => Self::NoteFilterQ,
            "note_filter_gain" => Self::NoteFilterGain,
            "filter_freq" => Self::FilterFreq,
            "filter_q" => Self::FilterQ,
            "filter_gain" => Self::FilterGain,
            "lfo0_freq" => Self::Lfo0Freq,
            "lfo1_freq" => Self::Lfo1Freq,
            "lfo2_freq" => Self::Lfo2Freq,
            "lfo0_amount" => Self::Lfo0Amount,
            "lfo1_amount" => Self::Lfo1Amount,
            "lfo2_amount" => Self::Lfo2Amount,
            _ => Self::None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Osc0Volume => "osc0_volume",
            Self::Osc1Volume => "osc1_volume",
            Self::Vibrato => "vibrato",
            Self::Tremolo => "tremolo",
            Self::Fm => "fm",
            Self::Pm => "pm",
            Self::Am => "am",
            Self::Freq => "freq",
            Self::NoteFilterFreq => "note_filter_freq",
            Self::NoteFilterQ => "note_filter_q",
            Self::NoteFilterGain => "note_filter_gain",
            Self::FilterFreq => "filter_freq",
            Self::FilterQ => "filter_q",
            Self::FilterGain => "filter_gain",
            Self::Lfo0Freq => "lfo0_freq",
            Self::Lfo1Freq => "lfo1_freq",
            Self::Lfo2Freq => "lfo2_freq",
            Self::Lfo0Amount => "lfo0_amount",
            Self::Lfo1Amount => "lfo1_amount",
            Self::Lfo2Amount => "lfo2_amount",
        }
    }

    /// Index for `lfo{i}_freq` destinations.
    pub fn lfo_freq_index(&self) -> Option<usize> {
        match self {
            Self::Lfo0Freq => Some(0),
            Self::Lfo1Freq => Some(1),
            Self::Lfo2Freq => Some(2),
            _ => None,
        }
    }

    /// Index for `lfo{i}_amount` destinations.
    pub fn lfo_amount_index(&self) -> Option<usize> {
        match self {
            Self::Lfo0Amount => Some(0),
            Self::Lfo1Amount => Some(1),
            Self::Lfo2Amount => Some(2),
            _ => None,
        }
    }
}

impl From<String> for Destination {
    fn from(s: String) -> Self {
        Self::from_name(&s)
    }
}

impl From<Destination> for String {
    fn from(d: Destination) -> Self {
        d.name().to_owned()
    }
}

/// The per-sample modulation accumulator. All fields start at identity
/// each sample; sources multiply ratios in (phase shift adds).
#[derive(Debug, Clone)]
pub struct ModBus {
    pub osc_volume_ratio: [f64; 2],
    pub freq_ratio: f64,
    pub phase_shift: f64,
    pub amp_ratio: f64,
    pub note_filter_freq_ratio: f64,
    pub note_filter_q_exponent: f64,
    pub note_filter_gain_ratio: f64,
    pub filter_freq_ratio: f64,
    pub filter_q_exponent: f64,
    pub filter_gain_ratio: f64,
    pub lfo_amount_gain: [f64; 3],
    pub lfo_freq_ratio: [f64; 3],
}

impl Default for ModBus {
    fn default() -> Self {
        let mut bus = Self {
            osc_volume_ratio: [0.0; 2],
            freq_ratio: 0.0,
            phase_shift: 0.0,
            amp_ratio: 0.0,
            note_filter_freq_ratio: 0.0,
            note_filter_q_exponent: 0.0,
            note_filter_gain_ratio: 0.0,
            filter_freq_ratio: 0.0,
            filter_q_exponent: 0.0,
            filter_gain_ratio: 0.0,
            lfo_amount_gain: [0.0; 3],
            lfo_freq_ratio: [0.0; 3],
        };
        bus.reset();
        bus
    }
}

impl ModBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to identity for the next sample.
    pub fn reset(&mut self) {
        self.osc_volume_ratio = [1.0; 2];
        self.freq_ratio = 1.0;
        self.phase_shift = 0.0;
        self.amp_ratio = 1.0;
        self.note_filter_freq_ratio = 1.0;
        self.note_filter_q_exponent = 1.0;
        self.note_filter_gain_ratio = 1.0;
        self.filter_freq_ratio = 1.0;
        self.filter_q_exponent = 1.0;
        self.filter_gain_ratio = 1.0;
        self.lfo_amount_gain = [1.0; 3];
        self.lfo_freq_ratio = [1.0; 3];
    }
}
