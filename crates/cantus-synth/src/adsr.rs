//! Amplitude envelope.
//!
//! Attack → Hold → Decay → Sustain → Release over a [`Ramp`]. Attack is a
//! linear ramp to the peak; decay and release are exponential approaches
//! with a 1e-3 end threshold. The modulation envelopes reuse this machine
//! with re-purposed segments (see [`Adsr::set_segments`]).

use cantus_core::{Ramp, SEC_PER_SAMPLE};
use serde::{Deserialize, Serialize};

/// Convergence threshold for the exponential segments.
const END_THRESHOLD: f64 = 0.001;

/// Envelope phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdsrPhase {
    /// Inactive; output sits at the base level.
    #[default]
    None,
    Attack,
    Hold,
    Decay,
    Sustain,
    Release,
}

/// Amplitude envelope configuration (times in milliseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdsrParams {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self {
            attack: 10.0,
            decay: 100.0,
            sustain: 0.7,
            release: 200.0,
        }
    }
}

/// The envelope state machine.
#[derive(Debug, Clone, Default)]
pub struct Adsr {
    attack: f64,
    hold: f64,
    decay: f64,
    sustain: f64,
    release: f64,
    base: f64,
    peak: f64,
    phase: AdsrPhase,
    hold_pos: u64,
    ramp: Ramp,
}

impl Adsr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to silence and load amplitude-envelope parameters.
    pub fn init(&mut self, p: &AdsrParams) {
        self.set_params(p);
        self.ramp.init(0.0);
        self.phase = AdsrPhase::None;
        self.hold_pos = 0;
    }

    /// Load amplitude-envelope parameters without resetting the phase.
    pub fn set_params(&mut self, p: &AdsrParams) {
        self.base = 0.0;
        self.peak = 1.0;
        self.attack = p.attack;
        self.hold = 0.0;
        self.decay = p.decay;
        self.sustain = p.sustain;
        self.release = p.release;
    }

    /// Re-purpose the machine's segments directly; the modulation envelopes
    /// use this to express their Delay→Hold→Decay shape.
    #[allow(clippy::too_many_arguments)]
    pub fn set_segments(
        &mut self,
        base: f64,
        peak: f64,
        attack: f64,
        hold: f64,
        decay: f64,
        sustain: f64,
        release: f64,
    ) {
        self.base = base;
        self.peak = peak;
        self.attack = attack;
        self.hold = hold;
        self.decay = decay;
        self.sustain = sustain;
        self.release = release;
    }

    pub fn note_on(&mut self) {
        self.phase = AdsrPhase::Attack;
        self.ramp.linear(self.attack, self.peak);
    }

    pub fn note_off(&mut self) {
        self.phase = AdsrPhase::Release;
        self.ramp.exponential(self.release, self.base, END_THRESHOLD);
    }

    /// Advance one sample.
    pub fn step(&mut self) {
        match self.phase {
            AdsrPhase::None => {}
            AdsrPhase::Attack => {
                if self.ramp.step() {
                    self.phase = AdsrPhase::Hold;
                    self.hold_pos = 0;
                }
            }
            AdsrPhase::Hold => {
                let elapsed_ms = self.hold_pos as f64 * SEC_PER_SAMPLE * 1000.0;
                if elapsed_ms >= self.hold {
                    self.phase = AdsrPhase::Decay;
                    self.ramp.exponential(self.decay, self.sustain, END_THRESHOLD);
                } else {
                    self.hold_pos += 1;
                }
            }
            AdsrPhase::Decay => {
                if self.ramp.step() {
                    self.phase = AdsrPhase::Sustain;
                }
            }
            AdsrPhase::Sustain => {
                // Track live sustain edits while the note is held.
                self.ramp.init(self.sustain);
            }
            AdsrPhase::Release => {
                if self.ramp.step() {
                    self.phase = AdsrPhase::None;
                }
            }
        }
    }

    /// Current envelope level.
    #[inline]
    pub fn value(&self) -> f64 {
        self.ramp.value()
    }

    pub fn phase(&self) -> AdsrPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != AdsrPhase::None
    }
}
