//! The textual wire protocol: command-line parsing and report formatting.
//!
//! Commands arrive one per line, space-separated, each token
//! percent-decoded. Reports go out as single lines: a keyword followed by
//! space-separated floats or a percent-encoded JSON payload.

use crate::engine::EngineError;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Percent-encoding set for JSON payloads on the report stream; the
/// unreserved characters stay literal.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Split a command line into percent-decoded tokens.
pub fn parse_command_line(line: &str) -> Result<Vec<String>, EngineError> {
    line.split(' ')
        .map(|token| {
            percent_decode_str(token)
                .decode_utf8()
                .map(|s| s.into_owned())
                .map_err(|_| EngineError::InvalidArgument {
                    command: "<line>".to_owned(),
                    value: token.to_owned(),
                })
        })
        .collect()
}

/// `fft v0 v1 …` — 1024 magnitudes, six decimals.
pub fn format_fft(values: &[f64]) -> String {
    format_float_report("fft", values)
}

/// `filter-shape v0 v1 …` — 1024 magnitude-response bins.
pub fn format_filter_shape(values: &[f64]) -> String {
    format_float_report("filter-shape", values)
}

fn format_float_report(keyword: &str, values: &[f64]) -> String {
    let mut out = String::with_capacity(keyword.len() + values.len() * 9);
    out.push_str(keyword);
    for value in values {
        out.push(' ');
        out.push_str(&format!("{value:.6}"));
    }
    out
}

/// `status <json>`.
pub fn format_status(json: &str) -> String {
    format!("status {json}")
}

/// `all_params <percent-encoded json>`.
pub fn format_all_params(json: &str) -> String {
    format!("all_params {}", utf8_percent_encode(json, COMPONENT))
}

/// `preset_list <percent-encoded json>`.
pub fn format_preset_list(json: &str) -> String {
    format!("preset_list {}", utf8_percent_encode(json, COMPONENT))
}

/// `error <percent-encoded message>`.
pub fn format_error(message: &str) -> String {
    format!("error {}", utf8_percent_encode(message, COMPONENT))
}
