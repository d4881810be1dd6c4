//! Offline wavetable generation.

use cantus_core::wavetable::{saw_partial, square_partial, WavetableSet, NUM_SAMPLES};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Args)]
pub struct GentablesArgs {
    /// Directory to write the `square` and `saw` table files into
    #[arg(default_value = "wavetables")]
    dir: PathBuf,
}

pub fn run(args: GentablesArgs) -> anyhow::Result<()> {
    std::fs::create_dir_all(&args.dir)?;

    let started = Instant::now();
    let mut square = WavetableSet::new();
    square.generate_band_limited(NUM_SAMPLES, square_partial);
    square.save(args.dir.join("square"))?;
    println!("generated square tables");

    let mut saw = WavetableSet::new();
    saw.generate_band_limited(NUM_SAMPLES, saw_partial);
    saw.save(args.dir.join("saw"))?;
    println!("generated saw tables");

    println!(
        "wrote wavetables to {} in {:.1}s",
        args.dir.display(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
