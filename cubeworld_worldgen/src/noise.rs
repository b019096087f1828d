//! The coherent-noise primitive feeding the terrain lattice.
//!
//! The pipeline only ever sees the [`NoiseSource`] capability trait; the
//! production implementation wraps a seeded fractal stack from the `noise`
//! crate behind a validating builder. Tests substitute deterministic stubs.

use noise::{MultiFractal, NoiseFn};
use thiserror::Error;

/// Deterministic scalar noise sampled at integer lattice coordinates.
///
/// Implementations must be pure: the same (x, y, z) always yields the same
/// value for the lifetime of the source, regardless of call order or
/// interleaving with other samples. Output is expected to stay in roughly
/// [-1, 1].
pub trait NoiseSource: Send + Sync {
    fn sample(&self, x: i32, y: i32, z: i32) -> f64;
}

/// Construction-time failures for [`LatticeNoise`]. These are fatal; a
/// generator must not be built from a rejected configuration.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigurationError {
    #[error("noise frequency {0} out of range (must be in (0, {max}])", max = LatticeNoiseBuilder::MAX_FREQUENCY)]
    FrequencyOutOfRange(f64),
    #[error("octave count {0} out of range (must be in [1, {max}])", max = LatticeNoiseBuilder::MAX_OCTAVES)]
    OctavesOutOfRange(usize),
    #[error("persistence {0} out of range (must be in (0, 1])")]
    PersistenceOutOfRange(f64),
}

/// Production noise source: fractal super-simplex noise over the coarse
/// lattice's integer coordinates.
pub struct LatticeNoise {
    fbm: noise::Fbm<noise::SuperSimplex>,
    input_scale: f64,
}

impl NoiseSource for LatticeNoise {
    fn sample(&self, x: i32, y: i32, z: i32) -> f64 {
        self.fbm.get([
            x as f64 * self.input_scale,
            y as f64 * self.input_scale,
            z as f64 * self.input_scale,
        ])
    }
}

/// Validating builder for [`LatticeNoise`].
pub struct LatticeNoiseBuilder {
    seed: u32,
    frequency: f64,
    octaves: usize,
    persistence: f64,
}

impl LatticeNoiseBuilder {
    pub const MAX_FREQUENCY: f64 = 16.0;
    pub const MAX_OCTAVES: usize = 10;

    /// One lattice step on X/Z covers about three blocks of horizontal
    /// terrain variation at the default frequency.
    const DEFAULT_INPUT_SCALE: f64 = 1.0 / 12.0;

    pub fn new(seed: u32) -> LatticeNoiseBuilder {
        LatticeNoiseBuilder {
            seed,
            frequency: 1.0,
            octaves: 4,
            persistence: 0.5,
        }
    }

    pub fn frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn octaves(mut self, octaves: usize) -> Self {
        self.octaves = octaves;
        self
    }

    pub fn persistence(mut self, persistence: f64) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn build(self) -> Result<LatticeNoise, ConfigurationError> {
        if !self.frequency.is_finite()
            || self.frequency <= 0.0
            || self.frequency > Self::MAX_FREQUENCY
        {
            return Err(ConfigurationError::FrequencyOutOfRange(self.frequency));
        }
        if self.octaves == 0 || self.octaves > Self::MAX_OCTAVES {
            return Err(ConfigurationError::OctavesOutOfRange(self.octaves));
        }
        if !self.persistence.is_finite() || self.persistence <= 0.0 || self.persistence > 1.0 {
            return Err(ConfigurationError::PersistenceOutOfRange(self.persistence));
        }
        Ok(LatticeNoise {
            fbm: noise::Fbm::new(self.seed)
                .set_octaves(self.octaves)
                .set_frequency(self.frequency)
                .set_persistence(self.persistence),
            input_scale: Self::DEFAULT_INPUT_SCALE,
        })
    }
}
