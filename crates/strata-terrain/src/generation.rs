//! Procedural planet density fields.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strata_common::TerrainResult;
use tracing::info;

use crate::density::{DensityField, EMPTY, SOLID};

/// One fractal noise layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseLayer {
    /// Base frequency
    pub frequency: f64,
    /// Octave count
    pub octaves: usize,
    /// Output scale
    pub amplitude: f64,
}

/// Planet generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanetConfig {
    /// Noise seed
    pub seed: u32,
    /// Field edge length in samples
    pub size: u32,
    /// Region edge length in samples
    pub region_size: u32,
    /// Density gained per sample of distance from the centre
    pub falloff: f32,
    /// Divisor applied to sample coordinates before noise lookup
    pub noise_scale: f64,
    /// Z coordinate of the noise slice
    pub noise_depth: f64,
    /// Surface roughness applied to the noise sum
    pub roughness: f32,
    /// Noise layers summed into the surface displacement
    pub layers: Vec<NoiseLayer>,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            seed: 42_601_423,
            size: 1000,
            region_size: 1000,
            falloff: 1.2 / 500.0,
            noise_scale: 5.0,
            noise_depth: 10.0,
            roughness: 0.1,
            layers: vec![
                NoiseLayer {
                    frequency: 0.1,
                    octaves: 2,
                    amplitude: 0.3,
                },
                NoiseLayer {
                    frequency: 0.25,
                    octaves: 4,
                    amplitude: 0.05,
                },
            ],
        }
    }
}

/// Generates a round, noise-displaced planet.
pub struct PlanetGenerator {
    config: PlanetConfig,
    layers: Vec<(Fbm<Perlin>, f64)>,
}

impl PlanetGenerator {
    /// Creates a generator with the given config.
    #[must_use]
    pub fn new(config: PlanetConfig) -> Self {
        let layers = config
            .layers
            .iter()
            .map(|layer| {
                let fbm = Fbm::<Perlin>::new(config.seed)
                    .set_frequency(layer.frequency)
                    .set_octaves(layer.octaves);
                (fbm, layer.amplitude)
            })
            .collect();
        Self { config, layers }
    }

    /// Creates a generator with default config.
    #[must_use]
    pub fn with_seed(seed: u32) -> Self {
        Self::new(PlanetConfig {
            seed,
            ..Default::default()
        })
    }

    /// Returns the generator configuration.
    #[must_use]
    pub const fn config(&self) -> &PlanetConfig {
        &self.config
    }

    fn noise(&self, x: f64, y: f64) -> f64 {
        let point = [
            x / self.config.noise_scale,
            y / self.config.noise_scale,
            self.config.noise_depth,
        ];
        self.layers
            .iter()
            .map(|(fbm, amplitude)| fbm.get(point) * amplitude)
            .sum()
    }

    /// Density sample at `(x, y)`: solid inside the displaced surface.
    #[must_use]
    pub fn sample(&self, x: u32, y: u32) -> i8 {
        let center = (self.config.size / 2) as f32;
        let distance = (x as f32 - center).hypot(y as f32 - center);
        let noise = self.noise(f64::from(x), f64::from(y)) as f32;
        let density = self.config.falloff * distance - 1.0 - (noise + 1.5) * self.config.roughness;
        if density > 0.0 {
            EMPTY
        } else {
            SOLID
        }
    }

    /// Generates the full density field, one row per task.
    pub fn generate(&self) -> TerrainResult<DensityField> {
        let size = self.config.size;
        let mut samples = vec![EMPTY; size as usize * size as usize];
        samples
            .par_chunks_mut(size.max(1) as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, sample) in row.iter_mut().enumerate() {
                    *sample = self.sample(x as u32, y as u32);
                }
            });

        let field = DensityField::from_samples(size, size, self.config.region_size, samples)?;
        let solid = field.samples().iter().filter(|&&s| s < 0).count();
        info!(
            "Generated planet {}x{} (seed {}), {} solid samples",
            size, size, self.config.seed, solid
        );
        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::is_solid;

    fn small() -> PlanetConfig {
        PlanetConfig {
            size: 100,
            region_size: 50,
            falloff: 1.2 / 50.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_planet_is_solid_at_core_and_empty_at_corners() {
        let field = PlanetGenerator::new(small()).generate().expect("field");
        assert!(is_solid(field.get(50, 50).expect("centre")));
        assert!(!is_solid(field.get(0, 0).expect("corner")));
        assert!(!is_solid(field.get(99, 99).expect("corner")));
        assert_eq!(field.region_count_x(), 2);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = PlanetGenerator::new(small()).generate().expect("field");
        let b = PlanetGenerator::new(small()).generate().expect("field");
        assert_eq!(a.samples(), b.samples());
    }

    #[test]
    fn test_sample_matches_field() {
        let generator = PlanetGenerator::new(small());
        let field = generator.generate().expect("field");
        for (x, y) in [(10, 20), (50, 30), (77, 64)] {
            assert_eq!(field.get(x, y), Some(generator.sample(x, y)));
        }
    }

    #[test]
    fn test_invalid_region_size_is_rejected() {
        let config = PlanetConfig {
            size: 100,
            region_size: 30,
            ..Default::default()
        };
        assert!(PlanetGenerator::new(config).generate().is_err());
    }
}
