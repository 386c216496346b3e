//! Engine configuration.
//!
//! Bundles the terrain, planet and simulation settings of a headless run.
//! Configuration can be loaded from and saved to a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use strata_terrain::{PlanetConfig, TerrainConfig};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "strata.toml";

/// Physics world used by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicsBackend {
    /// Bookkeeping-only body registry
    #[default]
    Registry,
    /// rapier2d (needs the `rapier` feature)
    Rapier,
}

/// Engine configuration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Terrain ===
    /// Terrain width and height in world units
    pub terrain_size: f32,
    /// World position of the terrain centre
    pub position: [f32; 2],

    // === Simulation ===
    /// Physics world
    pub physics_backend: PhysicsBackend,
    /// Number of ticks to simulate
    pub ticks: u32,
    /// Ticks between two impacts
    pub impact_interval: u32,
    /// Number of impacts
    pub impacts: u32,
    /// Crater radius in world units
    pub impact_radius: f32,
    /// Impact distance from the terrain centre in world units
    pub impact_distance: f32,
    /// Pending edit capacity
    pub edit_queue_capacity: usize,

    // === Tables ===
    /// Region extraction settings
    pub terrain: TerrainConfig,
    /// Procedural planet settings
    pub planet: PlanetConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            terrain_size: 100.0,
            position: [0.0, -100.0],

            physics_backend: PhysicsBackend::Registry,
            ticks: 240,
            impact_interval: 20,
            impacts: 8,
            impact_radius: 6.0,
            impact_distance: 47.0,
            edit_queue_capacity: 256,

            terrain: TerrainConfig {
                squares_per_cell: Some(10),
                ..TerrainConfig::default()
            },
            planet: PlanetConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamp simulation values to sensible ranges.
    pub fn validate(&mut self) {
        if !(self.terrain_size.is_finite() && self.terrain_size > 0.0) {
            self.terrain_size = 100.0;
        }
        self.ticks = self.ticks.clamp(1, 100_000);
        self.impact_interval = self.impact_interval.max(1);
        self.impact_radius = self.impact_radius.clamp(0.1, self.terrain_size);
        self.impact_distance = self.impact_distance.clamp(0.0, self.terrain_size);
        self.edit_queue_capacity = self.edit_queue_capacity.clamp(1, 65_536);
    }
}
