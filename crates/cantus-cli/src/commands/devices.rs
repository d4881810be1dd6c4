//! Audio device listing.

use cantus_io::{AudioBackend, CpalBackend};
use clap::Args;

#[derive(Args)]
pub struct DevicesArgs {}

pub fn run(_args: DevicesArgs) -> anyhow::Result<()> {
    let backend = CpalBackend::new();
    let devices = backend.list_output_devices()?;
    if devices.is_empty() {
        println!("no output devices found");
        return Ok(());
    }
    println!("output devices ({}):", backend.name());
    for (i, name) in devices.iter().enumerate() {
        println!("  [{i}] {name}");
    }
    Ok(())
}
