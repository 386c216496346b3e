//! Headless simulation loop.
//!
//! Generates a planet, attaches it to a physics world and fires impacts at
//! its surface, regenerating the terrain every tick.

use anyhow::Result;
use glam::Vec2;
use std::time::Instant;
use tracing::{debug, info};

use strata_common::Placement;
use strata_terrain::{BodyRegistry, EditQueue, PhysicsWorld, PlanetGenerator, Terrain, TerrainEdit, TerrainStats, EMPTY};

use crate::config::{EngineConfig, PhysicsBackend};

/// Angle between two consecutive impacts (golden angle, radians).
const IMPACT_ANGLE_STEP: f32 = 2.399_963;

/// Outcome of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationReport {
    /// Ticks simulated
    pub ticks: u32,
    /// Impacts applied
    pub impacts: u32,
    /// Terrain counters after attach
    pub initial: TerrainStats,
    /// Terrain counters after the last tick
    pub last: TerrainStats,
    /// Cells rebuilt over all ticks
    pub rebuilt_cells: usize,
}

fn physics_world(backend: PhysicsBackend) -> Result<Box<dyn PhysicsWorld>> {
    match backend {
        PhysicsBackend::Registry => Ok(Box::new(BodyRegistry::new())),
        #[cfg(feature = "rapier")]
        PhysicsBackend::Rapier => Ok(Box::new(strata_terrain::rapier::RapierWorld::new(Vec2::new(0.0, -9.81)))),
        #[cfg(not(feature = "rapier"))]
        PhysicsBackend::Rapier => anyhow::bail!("rapier backend requested but the engine was built without the `rapier` feature"),
    }
}

/// Impact point number `index` on a ring around `center`.
fn impact_point(center: Vec2, distance: f32, index: u32) -> Vec2 {
    let angle = index as f32 * IMPACT_ANGLE_STEP;
    center + Vec2::new(angle.cos(), angle.sin()) * distance
}

/// Runs the simulation described by `config`.
pub fn run(config: &EngineConfig) -> Result<SimulationReport> {
    config.terrain.validate()?;

    let started = Instant::now();
    let field = PlanetGenerator::new(config.planet.clone()).generate()?;
    info!("Planet generated in {:.1?}", started.elapsed());

    let mut terrain = Terrain::new(Vec2::splat(config.terrain_size), field, config.terrain.clone())?;
    let mut world = physics_world(config.physics_backend)?;
    let placement = Placement::at(Vec2::from(config.position));

    let started = Instant::now();
    terrain.attach(placement, Some(world.as_mut()))?;
    let initial = terrain.stats();
    info!(
        "Terrain attached in {:.1?}: {} regions, {} bodies, {} vertices",
        started.elapsed(),
        initial.regions,
        initial.totals.bodies,
        initial.totals.vertices
    );

    let queue = EditQueue::new(config.edit_queue_capacity);
    let mut impacts = 0;
    let mut rebuilt_cells = 0;

    for tick in 0..config.ticks {
        if impacts < config.impacts && tick % config.impact_interval == 0 {
            let center = impact_point(placement.position, config.impact_distance, impacts);
            if queue.publish(TerrainEdit::Circle {
                center,
                radius: config.impact_radius,
                value: EMPTY,
            }) {
                impacts += 1;
                debug!("Impact {} at ({:.1}, {:.1})", impacts, center.x, center.y);
            }
        }

        terrain.apply_edits(&queue);
        terrain.regenerate_terrain(Some(world.as_mut()))?;
        terrain.update(placement, Some(world.as_mut()));

        let stats = terrain.stats();
        rebuilt_cells += stats.totals.rebuilt_cells;
        if stats.totals.rebuilt_cells > 0 {
            debug!(
                "Tick {}: rebuilt {} cells, {} bodies",
                tick, stats.totals.rebuilt_cells, stats.totals.bodies
            );
        }
    }

    let last = terrain.stats();
    info!(
        "Simulated {} ticks, {} impacts, {} cells rebuilt; {} bodies, {} vertices",
        config.ticks, impacts, rebuilt_cells, last.totals.bodies, last.totals.vertices
    );

    terrain.detach(Some(world.as_mut()))?;
    Ok(SimulationReport {
        ticks: config.ticks,
        impacts,
        initial,
        last,
        rebuilt_cells,
    })
}
