//! # Noise Generator
//!
//! Deterministic sampling of seeded gradient noise and the fractal combinators the
//! world generator is built from.
//!
//! Each `NoiseGenerator` wraps one seeded `noise::Perlin`, whose permutation table is
//! shuffled once at construction and never mutated afterwards. Sampling is therefore
//! pure: the same seed and coordinate always return the same value, and a generator
//! can be shared between worker threads without synchronization.

use noise::{NoiseFn, Perlin};

/// What a noise field is used for. Each purpose samples with the world seed offset
/// by its discriminant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NoisePurpose {
    TERRAIN = 0,
    TEMPERATURE = 1,
    HUMIDITY = 2,
    CAVES = 3,
    ORES = 4,
    ISLANDS = 5,
    CURRENTS = 6,
    WAVES = 7,
}

impl NoisePurpose {
    /// Derives the seed for this purpose from the world seed.
    pub fn seed(self, world_seed: u32) -> u32 {
        world_seed.wrapping_add(self as u32)
    }
}

/// Octave parameters shared by the fractal combinators.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FractalParams {
    /// Number of noise layers summed. Zero octaves yields a flat zero field.
    pub octaves: u32,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
}

impl FractalParams {
    pub const fn new(octaves: u32, persistence: f64, lacunarity: f64) -> Self {
        FractalParams {
            octaves,
            persistence,
            lacunarity,
        }
    }
}

impl Default for FractalParams {
    fn default() -> Self {
        FractalParams::new(4, 0.5, 2.0)
    }
}

/// Seeded 2D/3D gradient noise sampler.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    seed: u32,
    perlin: Perlin,
}

impl NoiseGenerator {
    pub fn new(seed: u32) -> Self {
        NoiseGenerator {
            seed,
            perlin: Perlin::new(seed),
        }
    }

    /// A generator for one purpose of the world seeded with `world_seed`.
    pub fn for_purpose(world_seed: u32, purpose: NoisePurpose) -> Self {
        Self::new(purpose.seed(world_seed))
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Single-octave 2D noise, roughly in `[-1, 1]`.
    pub fn sample_2d(&self, x: f64, y: f64) -> f64 {
        self.perlin.get([x, y]).clamp(-1.0, 1.0)
    }

    /// Single-octave 3D noise, roughly in `[-1, 1]`.
    pub fn sample_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        self.perlin.get([x, y, z]).clamp(-1.0, 1.0)
    }

    /// Fractal Brownian motion: octaves of noise summed and normalized back to
    /// roughly `[-1, 1]`.
    pub fn fractal(&self, x: f64, y: f64, params: FractalParams) -> f64 {
        self.octaves(params, |frequency| self.sample_2d(x * frequency, y * frequency))
    }

    /// Three-dimensional fractal Brownian motion.
    pub fn fractal_3d(&self, x: f64, y: f64, z: f64, params: FractalParams) -> f64 {
        self.octaves(params, |frequency| {
            self.sample_3d(x * frequency, y * frequency, z * frequency)
        })
    }

    /// Ridged multifractal in `[0, 1]`: sharp crests where the base noise crosses zero.
    pub fn ridged(&self, x: f64, y: f64, params: FractalParams) -> f64 {
        self.octaves(params, |frequency| {
            let ridge = 1.0 - self.sample_2d(x * frequency, y * frequency).abs();
            ridge * ridge
        })
    }

    /// Turbulence in `[0, 1]`: octaves of absolute noise.
    pub fn turbulence(&self, x: f64, y: f64, params: FractalParams) -> f64 {
        self.octaves(params, |frequency| {
            self.sample_2d(x * frequency, y * frequency).abs()
        })
    }

    fn octaves(&self, params: FractalParams, mut layer: impl FnMut(f64) -> f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..params.octaves {
            total += layer(frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= params.persistence;
            frequency *= params.lacunarity;
        }

        if max_amplitude > 0.0 {
            (total / max_amplitude).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}
