//! Capsule character body using rapier3d's kinematic character controller
//!
//! The body position is the bottom of the capsule (the character's feet).
//! Snap-to-ground is left off: stepping down is decided by the locomotion
//! state, which calls [`CharacterBody::translate_unchecked`].

use glam::Vec3;
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{layer_groups, LayerMask, PhysicsWorld};

/// Capsule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterBodyConfig {
    /// Capsule height including both caps (default: 2.0m)
    pub height: f32,
    /// Capsule radius (default: 0.5m)
    pub radius: f32,
    /// Maximum slope angle in degrees (default: 45)
    pub max_slope_angle: f32,
    /// Tallest ledge the body may step onto or down from (default: 0.3m)
    pub step_offset: f32,
    /// Collision skin kept between the capsule and geometry (default: 0.08m)
    pub skin_width: f32,
}

impl Default for CharacterBodyConfig {
    fn default() -> Self {
        Self {
            height: 2.0,
            radius: 0.5,
            max_slope_angle: 45.0,
            step_offset: 0.3,
            skin_width: 0.08,
        }
    }
}

impl CharacterBodyConfig {
    /// Clamp the capsule into a shape rapier can build
    pub fn sanitized(&self) -> Self {
        let radius = self.radius.max(0.01);
        let height = self.height.max(radius * 2.0);
        Self {
            height,
            radius,
            max_slope_angle: self.max_slope_angle.clamp(0.0, 89.0),
            step_offset: self.step_offset.clamp(0.0, height * 0.5),
            skin_width: self.skin_width.clamp(0.005, 0.08),
        }
    }

    /// Distance from the capsule center down to the center of the bottom cap
    pub fn half_segment(&self) -> f32 {
        self.height * 0.5 - self.radius
    }
}

/// Capsule body that the player controller drives around the level
pub struct CharacterBody {
    /// Configuration
    pub config: CharacterBodyConfig,
    /// Feet position
    pub position: Vec3,
    /// Whether rapier reported contact with the floor during the last move
    pub touching_floor: bool,
    /// The collider handle for this character
    pub collider_handle: Option<ColliderHandle>,
    /// Rapier's kinematic character controller
    controller: KinematicCharacterController,
}

impl CharacterBody {
    /// Create a new body with default config
    pub fn new() -> Self {
        Self::with_config(CharacterBodyConfig::default())
    }

    /// Create a new body with custom config
    pub fn with_config(config: CharacterBodyConfig) -> Self {
        let config = config.sanitized();
        let mut controller = KinematicCharacterController::default();
        controller.max_slope_climb_angle = config.max_slope_angle.to_radians();
        controller.min_slope_slide_angle = config.max_slope_angle.to_radians();
        controller.autostep = Some(CharacterAutostep {
            max_height: CharacterLength::Absolute(config.step_offset),
            min_width: CharacterLength::Relative(0.5),
            include_dynamic_bodies: false,
        });
        controller.snap_to_ground = None;
        controller.offset = CharacterLength::Absolute(config.skin_width);

        Self {
            config,
            position: Vec3::ZERO,
            touching_floor: false,
            collider_handle: None,
            controller,
        }
    }

    /// Spawn the capsule in the physics world with its feet at `position`
    pub fn spawn(&mut self, physics: &mut PhysicsWorld, position: Vec3) -> ColliderHandle {
        self.position = position;

        let collider = ColliderBuilder::capsule_y(self.config.half_segment().max(0.01), self.config.radius)
            .translation(vector![position.x, position.y + self.config.height / 2.0, position.z])
            .friction(0.0)
            .restitution(0.0)
            .collision_groups(layer_groups(LayerMask::CHARACTER))
            .build();

        let handle = physics.add_static_collider(collider);
        self.collider_handle = Some(handle);
        handle
    }

    /// Move the body with collision detection, returning the translation actually applied
    pub fn move_by(&mut self, physics: &mut PhysicsWorld, desired_translation: Vec3, dt: f32) -> Vec3 {
        let Some(collider_handle) = self.collider_handle else {
            return Vec3::ZERO;
        };

        let Some(collider) = physics.collider_set.get(collider_handle) else {
            return Vec3::ZERO;
        };

        let shape = collider.shape();
        let center = self.center();
        let current_pos = Isometry::translation(center.x, center.y, center.z);

        let movement = self.controller.move_shape(
            dt,
            &physics.rigid_body_set,
            &physics.collider_set,
            physics.query_pipeline(),
            shape,
            &current_pos,
            vector![desired_translation.x, desired_translation.y, desired_translation.z],
            QueryFilter::default()
                .exclude_collider(collider_handle)
                .exclude_sensors(),
            |_| {},
        );

        self.touching_floor = movement.grounded;

        let applied = Vec3::new(
            movement.translation.x,
            movement.translation.y,
            movement.translation.z,
        );
        self.position += applied;
        self.sync_collider(physics);
        applied
    }

    /// Translate without sweeping; used for step-down snaps that were already measured
    pub fn translate_unchecked(&mut self, physics: &mut PhysicsWorld, translation: Vec3) {
        self.position += translation;
        self.sync_collider(physics);
    }

    /// Set the body's position directly (teleport)
    pub fn set_position(&mut self, physics: &mut PhysicsWorld, position: Vec3) {
        self.position = position;
        self.sync_collider(physics);
    }

    fn sync_collider(&self, physics: &mut PhysicsWorld) {
        let Some(handle) = self.collider_handle else {
            return;
        };
        let center = self.center();
        if let Some(collider) = physics.collider_set.get_mut(handle) {
            collider.set_translation(vector![center.x, center.y, center.z]);
        }
    }

    /// Center of the capsule
    pub fn center(&self) -> Vec3 {
        self.position + Vec3::Y * (self.config.height / 2.0)
    }
}

impl Default for CharacterBody {
    fn default() -> Self {
        Self::new()
    }
}
