//! Offline script rendering.
//!
//! A script is one directive per line: either an engine command (the same
//! grammar the socket accepts) or `wait <ms>`, which renders that much
//! audio before the next command. Blank lines and `#` comments are
//! skipped. The result is written as a 16-bit stereo WAV.

use cantus_core::{BYTES_PER_FRAME, SAMPLES_PER_CYCLE, SAMPLE_RATE_F};
use cantus_engine::protocol::parse_command_line;
use cantus_engine::Engine;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Command script to perform
    script: PathBuf,

    /// Output WAV path
    #[arg(short, long, default_value = "out.wav")]
    output: PathBuf,

    /// Directory holding the precomputed wavetable files
    #[arg(long, default_value = "wavetables")]
    wavetable_dir: PathBuf,

    /// Preset directory (for `preset` commands in scripts)
    #[arg(long, default_value = "presets")]
    preset_dir: PathBuf,

    /// Extra audio rendered after the last directive, in milliseconds
    #[arg(long, default_value_t = 1000)]
    tail_ms: u64,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let tables = super::load_wavetables(&args.wavetable_dir);
    let engine = Engine::new(tables, &args.preset_dir);

    let script = std::fs::read_to_string(&args.script)?;
    let mut samples: Vec<f64> = Vec::new();
    for (lineno, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(ms) = line.strip_prefix("wait ") {
            let ms: u64 = ms
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("line {}: bad wait '{line}'", lineno + 1))?;
            render_into(&engine, (ms as f64 / 1000.0 * SAMPLE_RATE_F) as usize, &mut samples);
        } else {
            let command = parse_command_line(line)
                .map_err(|e| anyhow::anyhow!("line {}: {e}", lineno + 1))?;
            engine
                .apply_command(&command)
                .map_err(|e| anyhow::anyhow!("line {}: {e}", lineno + 1))?;
        }
    }
    render_into(
        &engine,
        (args.tail_ms as f64 / 1000.0 * SAMPLE_RATE_F) as usize,
        &mut samples,
    );

    cantus_io::wav::write_wav(&args.output, &samples)?;
    println!(
        "rendered {:.2}s to {}",
        samples.len() as f64 / SAMPLE_RATE_F,
        args.output.display()
    );
    Ok(())
}

fn render_into(engine: &Engine, frames: usize, samples: &mut Vec<f64>) {
    let mut buf = vec![0u8; SAMPLES_PER_CYCLE * BYTES_PER_FRAME];
    let mut remaining = frames;
    while remaining > 0 {
        let chunk = remaining.min(SAMPLES_PER_CYCLE);
        let bytes = &mut buf[..chunk * BYTES_PER_FRAME];
        engine.render(bytes);
        for frame in bytes.chunks_exact(BYTES_PER_FRAME) {
            samples.push(i16::from_le_bytes([frame[0], frame[1]]) as f64 / 32767.0);
        }
        remaining -= chunk;
    }
}
