pub mod devices;
pub mod gentables;
pub mod render;
pub mod serve;

use cantus_core::wavetable::{Wavetables, NUM_SAMPLES};
use std::path::Path;
use std::sync::Arc;

/// Load the wavetable banks from disk, generating in memory (with a
/// warning) when the files are missing.
pub fn load_wavetables(dir: &Path) -> Arc<Wavetables> {
    match Wavetables::load(dir) {
        Ok(tables) => Arc::new(tables),
        Err(e) => {
            tracing::warn!(
                dir = %dir.display(),
                error = %e,
                "wavetables missing, generating in memory (run `cantus gentables` to precompute)"
            );
            Arc::new(Wavetables::generate(NUM_SAMPLES))
        }
    }
}
