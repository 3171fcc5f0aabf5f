//! Foothold Physics - Collision queries using rapier3d
//!
//! Provides the static collision world the character stands in, the
//! [`CollisionQuery`] seam used by locomotion and foot IK, and a capsule
//! character body moved by rapier's kinematic character controller.

mod character_body;
mod query;

pub use character_body::{CharacterBody, CharacterBodyConfig};
pub use query::{CollisionQuery, GroundProbe, LayerMask};

use glam::Vec3;
use nalgebra::{Unit, UnitQuaternion};
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::parry::shape::Ball;
use rapier3d::prelude::*;

/// Collider friction used for all level geometry
const STATIC_FRICTION: f32 = 0.7;

/// The static collision world the character moves through
pub struct PhysicsWorld {
    /// Rigid body storage (only referenced by the character controller)
    pub rigid_body_set: RigidBodySet,
    /// Collider storage
    pub collider_set: ColliderSet,

    /// Query pipeline for raycasts and shape casts
    query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    /// Create an empty collision world
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Rebuild the query acceleration structure after colliders were added or moved
    pub fn refresh_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Access the query pipeline (used by the character controller)
    pub fn query_pipeline(&self) -> &QueryPipeline {
        &self.query_pipeline
    }

    /// Add a static collider (ground, walls, etc.) on the given layer
    pub fn add_static_collider(&mut self, collider: Collider) -> ColliderHandle {
        self.collider_set.insert(collider)
    }

    /// Get a collider by handle
    pub fn get_collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.collider_set.get(handle)
    }

    /// Create an infinite ground plane at height `y`
    pub fn create_ground(&mut self, y: f32) -> ColliderHandle {
        let normal = Unit::new_normalize(vector![0.0, 1.0, 0.0]);
        let ground = ColliderBuilder::halfspace(normal)
            .translation(vector![0.0, y, 0.0])
            .friction(STATIC_FRICTION)
            .restitution(0.0)
            .collision_groups(layer_groups(LayerMask::DEFAULT))
            .build();
        self.add_static_collider(ground)
    }

    /// Create a static box collider
    pub fn create_static_box(&mut self, half_extents: Vec3, position: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(vector![position.x, position.y, position.z])
            .friction(STATIC_FRICTION)
            .collision_groups(layer_groups(LayerMask::DEFAULT))
            .build();
        self.add_static_collider(collider)
    }

    /// Create a box tilted about the X axis by `pitch_degrees`, forming a ramp
    pub fn create_ramp(
        &mut self,
        half_extents: Vec3,
        position: Vec3,
        pitch_degrees: f32,
    ) -> ColliderHandle {
        let rotation = UnitQuaternion::from_euler_angles(pitch_degrees.to_radians(), 0.0, 0.0);
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .position(Isometry::from_parts(
                Translation::new(position.x, position.y, position.z),
                rotation,
            ))
            .friction(STATIC_FRICTION)
            .collision_groups(layer_groups(LayerMask::DEFAULT))
            .build();
        self.add_static_collider(collider)
    }

    /// Create a flight of stairs rising along `direction` (flattened to XZ).
    ///
    /// Each step is a box of `step_size` (width, rise, run); step `i` sits one
    /// rise higher and one run further than step `i - 1`, with its bottom face
    /// resting on `start.y`.
    pub fn create_stairs(
        &mut self,
        start: Vec3,
        direction: Vec3,
        step_size: Vec3,
        step_count: usize,
    ) -> Vec<ColliderHandle> {
        let forward = Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero();
        let forward = if forward == Vec3::ZERO { Vec3::NEG_Z } else { forward };
        let yaw = (-forward.x).atan2(-forward.z);

        (0..step_count)
            .map(|i| {
                let height = step_size.y * (i + 1) as f32;
                let center = start
                    + forward * (step_size.z * (i as f32 + 0.5))
                    + Vec3::Y * (height * 0.5);
                let collider = ColliderBuilder::cuboid(
                    step_size.x * 0.5,
                    height * 0.5,
                    step_size.z * 0.5,
                )
                .position(Isometry::from_parts(
                    Translation::new(center.x, center.y, center.z),
                    UnitQuaternion::from_euler_angles(0.0, yaw, 0.0),
                ))
                .friction(STATIC_FRICTION)
                .collision_groups(layer_groups(LayerMask::DEFAULT))
                .build();
                self.add_static_collider(collider)
            })
            .collect()
    }

    fn query_filter(mask: LayerMask) -> QueryFilter<'static> {
        QueryFilter::default()
            .exclude_sensors()
            .groups(InteractionGroups::new(
                Group::ALL,
                Group::from_bits_truncate(mask.0),
            ))
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Interaction groups for a collider that lives on `layer` and can be hit by any query
pub fn layer_groups(layer: LayerMask) -> InteractionGroups {
    InteractionGroups::new(Group::from_bits_truncate(layer.0), Group::ALL)
}

impl CollisionQuery for PhysicsWorld {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<GroundProbe> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }

        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        self.query_pipeline
            .cast_ray_and_get_normal(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                Self::query_filter(mask),
            )
            .map(|(_, intersection)| GroundProbe {
                point: origin + direction * intersection.time_of_impact,
                normal: Vec3::new(
                    intersection.normal.x,
                    intersection.normal.y,
                    intersection.normal.z,
                ),
                distance: intersection.time_of_impact,
            })
    }

    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<GroundProbe> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || radius <= 0.0 {
            return None;
        }

        let ball = Ball::new(radius);
        let shape_pos = Isometry::translation(origin.x, origin.y, origin.z);
        let shape_vel = vector![direction.x, direction.y, direction.z];
        let options = ShapeCastOptions {
            max_time_of_impact: max_distance,
            target_distance: 0.0,
            stop_at_penetration: true,
            compute_impact_geometry_on_penetration: true,
        };

        self.query_pipeline
            .cast_shape(
                &self.rigid_body_set,
                &self.collider_set,
                &shape_pos,
                &shape_vel,
                &ball,
                options,
                Self::query_filter(mask),
            )
            .map(|(_, hit)| {
                let center = origin + direction * hit.time_of_impact;
                // The ball carries no rotation, so its local normal is already world-aligned.
                let outward = Vec3::new(hit.normal2.x, hit.normal2.y, hit.normal2.z);
                let outward = if outward.length_squared() > f32::EPSILON {
                    outward.normalize()
                } else {
                    direction
                };
                GroundProbe {
                    point: center + outward * radius,
                    normal: -outward,
                    distance: hit.time_of_impact,
                }
            })
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool {
        if radius <= 0.0 {
            return false;
        }
        let shape_pos = Isometry::translation(center.x, center.y, center.z);
        self.query_pipeline
            .intersection_with_shape(
                &self.rigid_body_set,
                &self.collider_set,
                &shape_pos,
                &Ball::new(radius),
                Self::query_filter(mask),
            )
            .is_some()
    }
}
