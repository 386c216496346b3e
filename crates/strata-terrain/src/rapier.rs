//! [`PhysicsWorld`] backed by rapier2d.

use ahash::AHashMap;
use glam::Vec2;
use rapier2d::prelude::*;
use strata_common::{BodyHandle, PhysicsError, Placement};

use crate::physics::PhysicsWorld;

/// Rapier simulation holding the terrain's fixed bodies.
pub struct RapierWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    ccd_solver: CCDSolver,
    gravity: Vector<Real>,
    handles: AHashMap<BodyHandle, RigidBodyHandle>,
    next_id: u64,
}

impl RapierWorld {
    /// Creates an empty world with the given gravity.
    #[must_use]
    pub fn new(gravity: Vec2) -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            gravity: vector![gravity.x, gravity.y],
            handles: AHashMap::new(),
            next_id: 0,
        }
    }

    /// Advances the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    /// Rigid bodies, including those not owned by the terrain.
    #[must_use]
    pub fn bodies(&self) -> &RigidBodySet {
        &self.bodies
    }

    /// Mutable rigid bodies, for adding dynamic objects.
    pub fn bodies_mut(&mut self) -> &mut RigidBodySet {
        &mut self.bodies
    }

    /// Colliders.
    #[must_use]
    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    /// Rapier handle behind a terrain body.
    #[must_use]
    pub fn rigid_body_handle(&self, handle: BodyHandle) -> Option<RigidBodyHandle> {
        self.handles.get(&handle).copied()
    }

    /// Number of terrain bodies.
    #[must_use]
    pub fn terrain_body_count(&self) -> usize {
        self.handles.len()
    }
}

impl PhysicsWorld for RapierWorld {
    fn create_convex_body(&mut self, polygon: &[Vec2], density: f32) -> Result<BodyHandle, PhysicsError> {
        let points: Vec<Point<Real>> = polygon.iter().map(|p| point![p.x, p.y]).collect();
        let collider = ColliderBuilder::convex_polyline(points)
            .ok_or_else(|| PhysicsError::InvalidShape {
                vertices: polygon.len(),
                reason: "rapier rejected the convex polyline".into(),
            })?
            .density(density)
            .build();

        let body = self.bodies.insert(RigidBodyBuilder::fixed().build());
        self.colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        self.next_id += 1;
        let handle = BodyHandle::from_raw(self.next_id);
        self.handles.insert(handle, body);
        Ok(handle)
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        if let Some(body) = self.handles.remove(&handle) {
            self.bodies.remove(
                body,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
        }
    }

    fn set_body_placement(&mut self, handle: BodyHandle, placement: Placement) {
        let Some(&body) = self.handles.get(&handle) else {
            return;
        };
        if let Some(body) = self.bodies.get_mut(body) {
            let position = Isometry::new(
                vector![placement.position.x, placement.position.y],
                placement.rotation,
            );
            body.set_position(position, true);
        }
    }
}
