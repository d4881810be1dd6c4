//! Feedback echo on the summed voice output.
//!
//! A single circular delay line with a feedback write and a wet mix on read.
//! Parameter changes resize the line in place; the cursor wraps if the new
//! length is shorter.

use crate::SAMPLE_RATE_F;
use serde::{Deserialize, Serialize};

/// Minimum delay length in milliseconds.
const MIN_DELAY_MS: f64 = 10.0;

/// Echo configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoParams {
    pub enabled: bool,
    /// Delay time in milliseconds.
    pub delay: f64,
    /// Feedback gain, `[0, 1)` for stability.
    pub feedback_gain: f64,
    /// Wet mix, `[0, 1]`.
    pub mix: f64,
}

#[derive(Debug, Clone, Default)]
struct DelayLine {
    cursor: usize,
    past: Vec<f64>,
}

impl DelayLine {
    fn set_length_ms(&mut self, millis: f64) {
        let millis = millis.max(MIN_DELAY_MS);
        let length = (SAMPLE_RATE_F * millis / 1000.0) as usize;
        self.past.resize(length, 0.0);
        if self.cursor >= self.past.len() {
            self.cursor = 0;
        }
    }

    #[inline]
    fn write_and_advance(&mut self, input: f64) {
        self.past[self.cursor] = input;
        self.cursor += 1;
        if self.cursor >= self.past.len() {
            self.cursor = 0;
        }
    }

    #[inline]
    fn delayed(&self) -> f64 {
        self.past[self.cursor]
    }
}

/// The echo effect. Disabled, it passes input through untouched.
#[derive(Debug, Clone, Default)]
pub struct Echo {
    enabled: bool,
    delay: DelayLine,
    feedback_gain: f64,
    mix: f64,
}

impl Echo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_params(&mut self, p: &EchoParams) {
        self.enabled = p.enabled;
        self.delay.set_length_ms(p.delay);
        self.feedback_gain = p.feedback_gain;
        self.mix = p.mix;
    }

    /// One sample: mix in the delayed signal and write the feedback.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        if !self.enabled {
            return input;
        }
        let delayed = self.delay.delayed();
        self.delay.write_and_advance(input + delayed * self.feedback_gain);
        input + delayed * self.mix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SAMPLE_RATE;

    fn enabled_params(delay_ms: f64, feedback: f64, mix: f64) -> EchoParams {
        EchoParams {
            enabled: true,
            delay: delay_ms,
            feedback_gain: feedback,
            mix,
        }
    }

    #[test]
    fn test_disabled_is_identity() {
        let mut echo = Echo::new();
        echo.apply_params(&EchoParams::default());
        assert_eq!(echo.process(0.5), 0.5);
    }

    #[test]
    fn test_impulse_repeats_at_delay() {
        let mut echo = Echo::new();
        echo.apply_params(&enabled_params(100.0, 0.0, 1.0));
        let delay_samples = SAMPLE_RATE as usize / 10;

        assert_eq!(echo.process(1.0), 1.0);
        for i in 1..delay_samples {
            assert_eq!(echo.process(0.0), 0.0, "early echo at sample {i}");
        }
        assert!((echo.process(0.0) - 1.0).abs() < 1e-12, "echo missing");
    }

    #[test]
    fn test_feedback_produces_decaying_repeats() {
        let mut echo = Echo::new();
        echo.apply_params(&enabled_params(10.0, 0.5, 1.0));
        let delay_samples = SAMPLE_RATE as usize / 100;

        echo.process(1.0);
        let mut peaks = Vec::new();
        for _ in 0..4 {
            let mut peak = 0.0f64;
            for _ in 0..delay_samples {
                peak = peak.max(echo.process(0.0).abs());
            }
            peaks.push(peak);
        }
        for pair in peaks.windows(2) {
            assert!(pair[1] < pair[0], "repeats not decaying: {peaks:?}");
        }
    }

    #[test]
    fn test_minimum_delay_is_ten_ms() {
        let mut echo = Echo::new();
        echo.apply_params(&enabled_params(1.0, 0.0, 1.0));
        let min_samples = (SAMPLE_RATE as f64 * MIN_DELAY_MS / 1000.0) as usize;

        echo.process(1.0);
        for _ in 0..min_samples - 1 {
            assert_eq!(echo.process(0.0), 0.0);
        }
        assert!((echo.process(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shrinking_wraps_cursor() {
        let mut echo = Echo::new();
        echo.apply_params(&enabled_params(500.0, 0.2, 0.5));
        for i in 0..20_000 {
            echo.process((i as f64 * 0.1).sin());
        }
        // Cursor is deep into the long line; shrinking must stay in bounds.
        echo.apply_params(&enabled_params(20.0, 0.2, 0.5));
        for i in 0..5_000 {
            let y = echo.process((i as f64 * 0.1).sin());
            assert!(y.is_finite());
        }
    }
}
