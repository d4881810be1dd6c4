//! Band-limited wavetables.
//!
//! One table per MIDI note, each holding a single cycle whose Fourier
//! content stops below Nyquist for that note's fundamental. Tables are
//! precomputed offline, stored big-endian, and loaded once at startup;
//! playback reads them with linear interpolation between adjacent bins.
//!
//! File format:
//!
//! ```text
//! uint32  numTables
//! repeat numTables:
//!     uint32   numSamples
//!     float64 × numSamples
//! ```

use crate::tuning::note_to_freq;
use crate::SAMPLE_RATE_F;
use std::f64::consts::TAU;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

/// Tables per waveform (one per MIDI note).
pub const NUM_TABLES: usize = 128;
/// Samples per table.
pub const NUM_SAMPLES: usize = 4096;

/// Errors from wavetable file I/O.
#[derive(Debug, Error)]
pub enum WavetableError {
    #[error("failed to read wavetable file: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write wavetable file: {0}")]
    Write(#[source] std::io::Error),
    #[error("wavetable file declares {found} tables, expected at most {max}")]
    TooManyTables { found: u32, max: usize },
    #[error("table declares {found} samples, expected at most {max}")]
    TooManySamples { found: u32, max: usize },
}

/// One single-cycle table sampled at uniform phase steps.
#[derive(Debug, Clone, Default)]
pub struct Wavetable {
    values: Vec<f64>,
}

impl Wavetable {
    /// Fill the table by evaluating `phase_to_value` at each phase step.
    pub fn generate(&mut self, samples: usize, mut phase_to_value: impl FnMut(f64) -> f64) {
        self.values.clear();
        self.values
            .extend((0..samples).map(|i| phase_to_value(TAU / samples as f64 * i as f64)));
    }

    /// Linear-interpolated lookup at an arbitrary phase (radians).
    #[inline]
    pub fn at_phase(&self, phase: f64) -> f64 {
        let phase = phase.rem_euclid(TAU);
        let length = self.values.len();
        let phase_per_sample = TAU / length as f64;
        // rem_euclid of a tiny negative rounds to TAU itself, so clamp the
        // bin index.
        let index = ((phase / phase_per_sample) as usize).min(length - 1);
        let next = if index + 1 >= length { 0 } else { index + 1 };
        let frac = (phase % phase_per_sample) / phase_per_sample;
        self.values[index] * (1.0 - frac) + self.values[next] * frac
    }

    /// Sum Fourier partials `1..=partials` of `partial_at_phase`.
    pub fn generate_band_limited(
        &mut self,
        samples: usize,
        partials: usize,
        partial_at_phase: impl Fn(usize, f64) -> f64,
    ) {
        self.generate(samples, |phase| {
            (1..=partials).map(|n| partial_at_phase(n, phase)).sum()
        });
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A full set of per-note tables for one waveform.
#[derive(Debug, Clone)]
pub struct WavetableSet {
    tables: Vec<Wavetable>,
}

impl WavetableSet {
    pub fn new() -> Self {
        Self {
            tables: vec![Wavetable::default(); NUM_TABLES],
        }
    }

    /// Table for a MIDI note.
    #[inline]
    pub fn table(&self, note: u8) -> &Wavetable {
        &self.tables[note.min(127) as usize]
    }

    /// Generate one band-limited table per note, truncating partials at
    /// Nyquist for each note's fundamental.
    pub fn generate_band_limited(
        &mut self,
        samples: usize,
        partial_at_phase: impl Fn(usize, f64) -> f64 + Copy,
    ) {
        for (note, table) in self.tables.iter_mut().enumerate() {
            let freq = note_to_freq(note as u8);
            let partials = (SAMPLE_RATE_F / 2.0 / freq) as usize;
            table.generate_band_limited(samples, partials.max(1), partial_at_phase);
        }
    }

    /// Write the set in the big-endian binary format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), WavetableError> {
        let file = File::create(path).map_err(WavetableError::Write)?;
        let mut w = BufWriter::new(file);
        let write = |w: &mut BufWriter<File>, bytes: &[u8]| {
            w.write_all(bytes).map_err(WavetableError::Write)
        };
        write(&mut w, &(self.tables.len() as u32).to_be_bytes())?;
        for table in &self.tables {
            write(&mut w, &(table.values.len() as u32).to_be_bytes())?;
            for &value in &table.values {
                write(&mut w, &value.to_be_bytes())?;
            }
        }
        w.flush().map_err(WavetableError::Write)
    }

    /// Load a set saved by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WavetableError> {
        let file = File::open(path).map_err(WavetableError::Read)?;
        let mut r = BufReader::new(file);
        let num_tables = read_u32(&mut r)?;
        if num_tables as usize > NUM_TABLES {
            return Err(WavetableError::TooManyTables {
                found: num_tables,
                max: NUM_TABLES,
            });
        }
        let mut tables = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            let num_samples = read_u32(&mut r)?;
            if num_samples as usize > NUM_SAMPLES {
                return Err(WavetableError::TooManySamples {
                    found: num_samples,
                    max: NUM_SAMPLES,
                });
            }
            let mut table = Wavetable {
                values: Vec::with_capacity(num_samples as usize),
            };
            let mut buf = [0u8; 8];
            for _ in 0..num_samples {
                r.read_exact(&mut buf).map_err(WavetableError::Read)?;
                table.values.push(f64::from_be_bytes(buf));
            }
            tables.push(table);
        }
        Ok(Self { tables })
    }
}

impl Default for WavetableSet {
    fn default() -> Self {
        Self::new()
    }
}

fn read_u32(r: &mut impl Read) -> Result<u32, WavetableError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).map_err(WavetableError::Read)?;
    Ok(u32::from_be_bytes(buf))
}

/// Fourier partial of a square wave: odd harmonics at `1/n`.
pub fn square_partial(n: usize, phase: f64) -> f64 {
    if n % 2 == 1 {
        (n as f64 * phase).sin() / n as f64
    } else {
        0.0
    }
}

/// Fourier partial of a sawtooth wave: all harmonics at `1/n`.
pub fn saw_partial(n: usize, phase: f64) -> f64 {
    (n as f64 * phase).sin() / n as f64
}

/// The two wavetable banks the oscillators read, shared read-only across
/// all voices.
#[derive(Debug, Clone)]
pub struct Wavetables {
    pub square: WavetableSet,
    pub saw: WavetableSet,
}

impl Wavetables {
    /// Load both banks from `<dir>/square` and `<dir>/saw`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, WavetableError> {
        let dir = dir.as_ref();
        Ok(Self {
            square: WavetableSet::load(dir.join("square"))?,
            saw: WavetableSet::load(dir.join("saw"))?,
        })
    }

    /// Generate both banks in memory with `samples` per table.
    ///
    /// Full-resolution generation (4096 samples) is what `gentables`
    /// precomputes offline; tests use smaller tables.
    pub fn generate(samples: usize) -> Self {
        let mut square = WavetableSet::new();
        square.generate_band_limited(samples, square_partial);
        let mut saw = WavetableSet::new();
        saw.generate_band_limited(samples, saw_partial);
        Self { square, saw }
    }
}
