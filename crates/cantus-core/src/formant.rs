//! Vowel formant bank.
//!
//! Four parallel constant-skirt bandpass stages at fixed vocal-tract
//! resonance frequencies. The `tone` parameter scales all four center
//! frequencies as a ratio; Q is shared across the bank.

use crate::filter::{FilterKind, FilterStage};
use serde::{Deserialize, Serialize};

/// Vowel selection for the formant bank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FormantVowel {
    #[default]
    A,
    E,
    I,
    O,
    U,
}

impl FormantVowel {
    pub fn from_name(name: &str) -> Self {
        match name {
            "e" => Self::E,
            "i" => Self::I,
            "o" => Self::O,
            "u" => Self::U,
            _ => Self::A,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::A => "a",
            Self::E => "e",
            Self::I => "i",
            Self::O => "o",
            Self::U => "u",
        }
    }

    /// The four formant center frequencies in Hz.
    pub fn frequencies(&self) -> [f64; 4] {
        match self {
            Self::A => [800.0, 1200.0, 2500.0, 3500.0],
            Self::E => [500.0, 1900.0, 2500.0, 3500.0],
            Self::I => [300.0, 2300.0, 2900.0, 3500.0],
            Self::O => [500.0, 800.0, 2500.0, 3500.0],
            Self::U => [300.0, 1200.0, 2500.0, 3500.0],
        }
    }
}

impl From<String> for FormantVowel {
    fn from(s: String) -> Self {
        Self::from_name(&s)
    }
}

impl From<FormantVowel> for String {
    fn from(v: FormantVowel) -> Self {
        v.name().to_owned()
    }
}

/// Formant bank configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormantParams {
    pub enabled: bool,
    pub kind: FormantVowel,
    pub tone: f64,
    pub q: f64,
}

impl Default for FormantParams {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: FormantVowel::A,
            tone: 1.0,
            q: 1.0,
        }
    }
}

/// The formant bank itself. Disabled, it passes input through untouched.
#[derive(Debug, Clone)]
pub struct Formant {
    enabled: bool,
    kind: FormantVowel,
    tone: f64,
    filters: [FilterStage; 4],
}

impl Default for Formant {
    fn default() -> Self {
        Self::new()
    }
}

impl Formant {
    pub fn new() -> Self {
        let mut formant = Self {
            enabled: false,
            kind: FormantVowel::A,
            tone: 1.0,
            filters: Default::default(),
        };
        formant.configure_vowel(FormantVowel::A);
        formant.set_q(1.0);
        formant
    }

    fn configure_vowel(&mut self, vowel: FormantVowel) {
        let freqs = vowel.frequencies();
        for (stage, freq) in self.filters.iter_mut().zip(freqs) {
            stage.enabled = true;
            stage.kind = FilterKind::BandPass1;
            stage.freq = freq;
            stage.gain = 0.0;
            stage.n = 0;
        }
    }

    fn set_q(&mut self, q: f64) {
        for stage in &mut self.filters {
            stage.q = q;
        }
    }

    pub fn apply_params(&mut self, p: &FormantParams) {
        self.enabled = p.enabled;
        if self.kind != p.kind {
            self.kind = p.kind;
            self.configure_vowel(p.kind);
        }
        self.set_q(p.q);
        self.tone = p.tone;
    }

    /// Sum of the four bandpass outputs; identity when disabled.
    pub fn process(&mut self, input: f64) -> f64 {
        if !self.enabled {
            return input;
        }
        let mut out = 0.0;
        for stage in &mut self.filters {
            out += stage.process(input, self.tone, 1.0, 1.0);
        }
        out
    }
}
