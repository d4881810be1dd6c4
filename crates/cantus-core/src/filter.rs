//! Direct-form-I filter kernel and the two per-voice filter stages.
//!
//! The kernel keeps a feedforward array `a`, a feedback array `b`, and a
//! past-sample array sized `max(a.len() - 1, b.len())`. Coefficient design
//! follows the RBJ Audio EQ Cookbook for the biquad kinds and windowed-sinc
//! (Hamming) for the FIR kinds. Stages rebuild coefficients every sample so
//! modulation ratios take effect without zipper artifacts; the coefficient
//! and state vectors are reused across rebuilds.

use crate::window::{apply_window, hamming};
use crate::SAMPLE_RATE_F;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Highest designable cutoff; just under Nyquist.
pub const MAX_FILTER_FREQ: f64 = SAMPLE_RATE_F / 2.0 - 10.0;

/// Filter kinds selectable for both the note filter and the fixed filter.
///
/// Serializes to the protocol name; unknown names fall back to `None` the
/// way the wire format always has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterKind {
    #[default]
    None,
    LowPassFir,
    HighPassFir,
    LowPass,
    HighPass,
    BandPass1,
    BandPass2,
    Notch,
    Peaking,
    LowShelf,
    HighShelf,
}

impl FilterKind {
    /// Parse the protocol name; unknown names fall back to `None`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "lowpass-fir" => Self::LowPassFir,
            "highpass-fir" => Self::HighPassFir,
            "lowpass" => Self::LowPass,
            "highpass" => Self::HighPass,
            "bandpass-1" => Self::BandPass1,
            "bandpass-2" => Self::BandPass2,
            "notch" => Self::Notch,
            "peaking" => Self::Peaking,
            "lowshelf" => Self::LowShelf,
            "highshelf" => Self::HighShelf,
            _ => Self::None,
        }
    }

    /// The protocol name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::LowPassFir => "lowpass-fir",
            Self::HighPassFir => "highpass-fir",
            Self::LowPass => "lowpass",
            Self::HighPass => "highpass",
            Self::BandPass1 => "bandpass-1",
            Self::BandPass2 => "bandpass-2",
            Self::Notch => "notch",
            Self::Peaking => "peaking",
            Self::LowShelf => "lowshelf",
            Self::HighShelf => "highshelf",
        }
    }
}

impl From<String> for FilterKind {
    fn from(s: String) -> Self {
        Self::from_name(&s)
    }
}

impl From<FilterKind> for String {
    fn from(k: FilterKind) -> Self {
        k.name().to_owned()
    }
}

/// Which oscillator a filter stage applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetOsc {
    #[default]
    All,
    Osc0,
    Osc1,
}

impl TargetOsc {
    pub fn from_name(name: &str) -> Self {
        match name {
            "0" => Self::Osc0,
            "1" => Self::Osc1,
            _ => Self::All,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Osc0 => "0",
            Self::Osc1 => "1",
        }
    }
}

impl From<String> for TargetOsc {
    fn from(s: String) -> Self {
        Self::from_name(&s)
    }
}

impl From<TargetOsc> for String {
    fn from(t: TargetOsc) -> Self {
        t.name().to_owned()
    }
}

/// Fixed-filter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub enabled: bool,
    pub target_osc: TargetOsc,
    pub kind: FilterKind,
    pub freq: f64,
    pub q: f64,
    pub gain: f64,
    /// FIR order; not part of the wire format.
    #[serde(skip, default = "default_fir_order")]
    pub n: usize,
}

fn default_fir_order() -> usize {
    50
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            enabled: false,
            target_osc: TargetOsc::All,
            kind: FilterKind::None,
            freq: 1000.0,
            q: 1.0,
            gain: 0.0,
            n: default_fir_order(),
        }
    }
}

/// Note-tracking-filter configuration. The base frequency comes from the
/// voice's fundamental; octave/coarse offset it in pitch space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteFilterParams {
    pub enabled: bool,
    pub target_osc: TargetOsc,
    pub kind: FilterKind,
    pub octave: i32,
    pub coarse: i32,
    pub q: f64,
    pub gain: f64,
}

impl Default for NoteFilterParams {
    fn default() -> Self {
        Self {
            enabled: false,
            target_osc: TargetOsc::All,
            kind: FilterKind::None,
            octave: 0,
            coarse: 0,
            q: 1.0,
            gain: 0.0,
        }
    }
}

/// Direct-form-I kernel with reusable coefficient and state storage.
#[derive(Debug, Clone, Default)]
pub struct FilterKernel {
    /// Feedforward coefficients.
    a: Vec<f64>,
    /// Feedback coefficients.
    b: Vec<f64>,
    past: Vec<f64>,
}

impl FilterKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild coefficients for the given design. `freq` is in Hz, `gain`
    /// in dB (shelf/peaking kinds only), `n` the FIR order (even).
    pub fn design(&mut self, kind: FilterKind, n: usize, freq: f64, q: f64, gain: f64) {
        let fc = freq / SAMPLE_RATE_F;
        match kind {
            FilterKind::None => {
                resize(&mut self.a, 1);
                resize(&mut self.b, 0);
                self.a[0] = 1.0;
            }
            FilterKind::LowPassFir => fir_lowpass(&mut self.a, &mut self.b, n, fc),
            FilterKind::HighPassFir => fir_highpass(&mut self.a, &mut self.b, n, fc),
            FilterKind::LowPass => biquad_lowpass(&mut self.a, &mut self.b, fc, q),
            FilterKind::HighPass => biquad_highpass(&mut self.a, &mut self.b, fc, q),
            FilterKind::BandPass1 => biquad_bandpass1(&mut self.a, &mut self.b, fc, q),
            FilterKind::BandPass2 => biquad_bandpass2(&mut self.a, &mut self.b, fc, q),
            FilterKind::Notch => biquad_notch(&mut self.a, &mut self.b, fc, q),
            FilterKind::Peaking => biquad_peaking(&mut self.a, &mut self.b, fc, q, gain),
            FilterKind::LowShelf => biquad_lowshelf(&mut self.a, &mut self.b, fc, q, gain),
            FilterKind::HighShelf => biquad_highshelf(&mut self.a, &mut self.b, fc, q, gain),
        }
        let past_len = (self.a.len().saturating_sub(1)).max(self.b.len());
        if self.past.len() < past_len {
            self.past.resize(past_len, 0.0);
        }
    }

    /// One direct-form-I evaluation.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let mut x = input;
        for (j, &bj) in self.b.iter().enumerate() {
            x -= self.past[j] * bj;
        }
        let mut y = x * self.a[0];
        for (j, &aj) in self.a.iter().enumerate().skip(1) {
            y += self.past[j - 1] * aj;
        }
        for j in (0..self.past.len().saturating_sub(1)).rev() {
            self.past[j + 1] = self.past[j];
        }
        if let Some(head) = self.past.first_mut() {
            *head = x;
        }
        y
    }

    /// Feedforward coefficients of the current design.
    pub fn feedforward(&self) -> &[f64] {
        &self.a
    }

    /// Feedback coefficients of the current design.
    pub fn feedback(&self) -> &[f64] {
        &self.b
    }

    /// Zero the past-sample state without touching coefficients.
    pub fn clear(&mut self) {
        self.past.fill(0.0);
    }

    /// Impulse response of the current design over `len` samples,
    /// evaluated on fresh state.
    pub fn impulse_response(&self, len: usize) -> Vec<f64> {
        let mut past = vec![0.0; (self.a.len().saturating_sub(1)).max(self.b.len())];
        let mut out = vec![0.0; len];
        for (i, o) in out.iter_mut().enumerate() {
            let input = if i == 0 { 1.0 } else { 0.0 };
            let mut x = input;
            for (j, &bj) in self.b.iter().enumerate() {
                x -= past[j] * bj;
            }
            let mut y = x * self.a[0];
            for (j, &aj) in self.a.iter().enumerate().skip(1) {
                y += past[j - 1] * aj;
            }
            for j in (0..past.len().saturating_sub(1)).rev() {
                past[j + 1] = past[j];
            }
            if let Some(head) = past.first_mut() {
                *head = x;
            }
            *o = y;
        }
        out
    }
}

fn resize(v: &mut Vec<f64>, len: usize) {
    v.resize(len, 0.0);
}

fn store_biquad(a: &mut Vec<f64>, b: &mut Vec<f64>, c: [f64; 6]) {
    let [b0, b1, b2, a0, a1, a2] = c;
    resize(a, 3);
    resize(b, 2);
    a[0] = b0 / a0;
    a[1] = b1 / a0;
    a[2] = b2 / a0;
    b[0] = a1 / a0;
    b[1] = a2 / a0;
}

// RBJ cookbook designs. `fc` is frequency / sample rate.

fn biquad_lowpass(a: &mut Vec<f64>, b: &mut Vec<f64>, fc: f64, q: f64) {
    let w0 = 2.0 * PI * fc;
    let alpha = w0.sin() / (2.0 * q);
    let cos_w0 = w0.cos();
    store_biquad(
        a,
        b,
        [
            (1.0 - cos_w0) / 2.0,
            1.0 - cos_w0,
            (1.0 - cos_w0) / 2.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        ],
    );
}

fn biquad_highpass(a: &mut Vec<f64>, b: &mut Vec<f64>, fc: f64, q: f64) {
    let w0 = 2.0 * PI * fc;
    let alpha = w0.sin() / (2.0 * q);
    let cos_w0 = w0.cos();
    store_biquad(
        a,
        b,
        [
            (1.0 + cos_w0) / 2.0,
            -(1.0 + cos_w0),
            (1.0 + cos_w0) / 2.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        ],
    );
}

/// Constant-skirt bandpass (peak gain = Q).
fn biquad_bandpass1(a: &mut Vec<f64>, b: &mut Vec<f64>, fc: f64, q: f64) {
    let w0 = 2.0 * PI * fc;
    let sin_w0 = w0.sin();
    let alpha = sin_w0 / (2.0 * q);
    let cos_w0 = w0.cos();
    store_biquad(
        a,
        b,
        [
            sin_w0 / 2.0,
            0.0,
            -sin_w0 / 2.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        ],
    );
}

/// Constant 0 dB peak-gain bandpass.
fn biquad_bandpass2(a: &mut Vec<f64>, b: &mut Vec<f64>, fc: f64, q: f64) {
    let w0 = 2.0 * PI * fc;
    let alpha = w0.sin() / (2.0 * q);
    let cos_w0 = w0.cos();
    store_biquad(
        a,
        b,
        [alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
    );
}

fn biquad_notch(a: &mut Vec<f64>, b: &mut Vec<f64>, fc: f64, q: f64) {
    let w0 = 2.0 * PI * fc;
    let alpha = w0.sin() / (2.0 * q);
    let cos_w0 = w0.cos();
    store_biquad(
        a,
        b,
        [
            1.0,
            -2.0 * cos_w0,
            1.0,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        ],
    );
}

fn biquad_peaking(a: &mut Vec<f64>, b: &mut Vec<f64>, fc: f64, q: f64, gain_db: f64) {
    let big_a = 10f64.powf(gain_db / 40.0);
    let w0 = 2.0 * PI * fc;
    let alpha = w0.sin() / (2.0 * q);
    let cos_w0 = w0.cos();
    store_biquad(
        a,
        b,
        [
            1.0 + alpha * big_a,
            -2.0 * cos_w0,
            1.0 - alpha * big_a,
            1.0 + alpha / big_a,
            -2.0 * cos_w0,
            1.0 - alpha / big_a,
        ],
    );
}

fn biquad_lowshelf(a: &mut Vec<f64>, b: &mut Vec<f64>, fc: f64, q: f64, gain_db: f64) {
    let big_a = 10f64.powf(gain_db / 40.0);
    let w0 = 2.0 * PI * fc;
    let alpha = w0.sin() / (2.0 * q);
    let cos_w0 = w0.cos();
    let sqrt_a = big_a.sqrt();
    store_biquad(
        a,
        b,
        [
            big_a * ((big_a + 1.0) - (big_a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha),
            2.0 * big_a * ((big_a - 1.0) - (big_a + 1.0) * cos_w0),
            big_a * ((big_a + 1.0) - (big_a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha),
            (big_a + 1.0) + (big_a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha,
            -2.0 * ((big_a - 1.0) + (big_a + 1.0) * cos_w0),
            (big_a + 1.0) + (big_a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha,
        ],
    );
}

fn biquad_highshelf(a: &mut Vec<f64>, b: &mut Vec<f64>, fc: f64, q: f64, gain_db: f64) {
    let big_a = 10f64.powf(gain_db / 40.0);
    let w0 = 2.0 * PI * fc;
    let alpha = w0.sin() / (2.0 * q);
    let cos_w0 = w0.cos();
    let sqrt_a = big_a.sqrt();
    store_biquad(
        a,
        b,
        [
            big_a * ((big_a + 1.0) + (big_a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha),
            -2.0 * big_a * ((big_a - 1.0) + (big_a + 1.0) * cos_w0),
            big_a * ((big_a + 1.0) + (big_a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha),
            (big_a + 1.0) - (big_a - 1.0) * cos_w0 + 2.0 * sqrt_a * alpha,
            2.0 * ((big_a - 1.0) - (big_a + 1.0) * cos_w0),
            (big_a + 1.0) - (big_a - 1.0) * cos_w0 - 2.0 * sqrt_a * alpha,
        ],
    );
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-9 {
        1.0
    } else {
        x.sin() / x
    }
}

/// Windowed-sinc FIR lowpass, `n` must be even.
fn fir_lowpass(a: &mut Vec<f64>, b: &mut Vec<f64>, n: usize, fc: f64) {
    assert!(n % 2 == 0, "FIR order must be even, got {n}");
    let w0 = 2.0 * PI * fc;
    resize(a, n + 1);
    resize(b, 0);
    for (i, h) in a.iter_mut().enumerate() {
        let k = i as f64 - n as f64 / 2.0;
        *h = 2.0 * fc * sinc(w0 * k);
    }
    apply_window(a, hamming);
}

/// Windowed-sinc FIR highpass via spectral inversion, `n` must be even.
fn fir_highpass(a: &mut Vec<f64>, b: &mut Vec<f64>, n: usize, fc: f64) {
    assert!(n % 2 == 0, "FIR order must be even, got {n}");
    let w0 = 2.0 * PI * fc;
    resize(a, n + 1);
    resize(b, 0);
    for (i, h) in a.iter_mut().enumerate() {
        let k = i as f64 - n as f64 / 2.0;
        *h = sinc(PI * k) - 2.0 * fc * sinc(w0 * k);
    }
    apply_window(a, hamming);
}

/// A filter stage: a kernel plus its configuration and the per-sample
/// modulation hookup. Coefficients rebuild on every `process` call.
#[derive(Debug, Clone, Default)]
pub struct FilterStage {
    pub enabled: bool,
    pub kind: FilterKind,
    pub target_osc: TargetOsc,
    pub freq: f64,
    pub q: f64,
    pub gain: f64,
    pub n: usize,
    kernel: FilterKernel,
}

impl FilterStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_params(&mut self, p: &FilterParams) {
        self.enabled = p.enabled;
        self.kind = p.kind;
        self.target_osc = p.target_osc;
        self.freq = p.freq;
        self.q = p.q;
        self.gain = p.gain;
        self.n = p.n;
    }

    /// Filter one sample with the modulation ratios in effect.
    ///
    /// The effective frequency is clamped below Nyquist; Q is raised to the
    /// modulation exponent; gain is scaled by the gain ratio.
    pub fn process(&mut self, input: f64, freq_ratio: f64, q_exponent: f64, gain_ratio: f64) -> f64 {
        if !self.enabled {
            return input;
        }
        let freq = (self.freq * freq_ratio).min(MAX_FILTER_FREQ);
        self.kernel
            .design(self.kind, self.n, freq, self.q.powf(q_exponent), self.gain * gain_ratio);
        self.kernel.process(input)
    }
}

/// The note-tracking filter: a [`FilterStage`] whose base frequency follows
/// the voice fundamental, offset by octave/coarse in pitch space.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub stage: FilterStage,
    pub octave: i32,
    pub coarse: i32,
}

impl NoteFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_params(&mut self, p: &NoteFilterParams) {
        self.stage.enabled = p.enabled;
        self.stage.kind = p.kind;
        self.stage.target_osc = p.target_osc;
        self.stage.q = p.q;
        self.stage.gain = p.gain;
        self.stage.n = 0;
        self.octave = p.octave;
        self.coarse = p.coarse;
    }

    pub fn enabled(&self) -> bool {
        self.stage.enabled
    }

    pub fn target_osc(&self) -> TargetOsc {
        self.stage.target_osc
    }

    /// Filter one sample, tracking `note_freq` (the voice fundamental with
    /// pitch modulation already applied).
    pub fn process(
        &mut self,
        input: f64,
        freq_ratio: f64,
        q_exponent: f64,
        gain_ratio: f64,
        note_freq: f64,
    ) -> f64 {
        self.stage.freq =
            note_freq * 2f64.powf(self.octave as f64 + self.coarse as f64 / 12.0);
        self.stage.process(input, freq_ratio, q_exponent, gain_ratio)
    }
}
