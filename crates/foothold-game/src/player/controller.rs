//! Player controller tying movement, grounding and the capsule body together

use foothold_core::{FrameTime, Transform};
use foothold_physics::{CharacterBody, CharacterBodyConfig, PhysicsWorld};
use glam::{Quat, Vec3};
use serde::Serialize;
use tracing::info;

use super::{LocomotionInput, MovementConfig, MovementState};
use crate::locomotion::{CapsuleProbe, GroundedLocomotionState, GroundedMotionState, LocomotionConfig};

/// Values published to the animation layer after every frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AnimatorParams {
    /// Horizontal speed relative to walk speed
    pub speed: f32,
    pub is_grounded: bool,
    pub is_sprinting: bool,
    pub horizontal: f32,
    pub vertical: f32,
    pub vertical_velocity: f32,
    /// One-shot: set only on the frame a jump launched
    pub jump_triggered: bool,
}

/// Player controller handling input, movement, and physics
pub struct PlayerController {
    /// Movement configuration
    pub movement_config: MovementConfig,
    /// Capsule moved through the physics world
    pub body: CharacterBody,
    locomotion: GroundedLocomotionState,
    movement: MovementState,
    params: AnimatorParams,
    jump_count: u32,
    step_down_count: u32,
}

impl PlayerController {
    /// Create a new player controller with default tuning
    pub fn new() -> Self {
        Self::with_config(
            CharacterBodyConfig::default(),
            LocomotionConfig::default(),
            MovementConfig::default(),
        )
    }

    /// Create a player controller with custom config
    pub fn with_config(
        body: CharacterBodyConfig,
        locomotion: LocomotionConfig,
        movement: MovementConfig,
    ) -> Self {
        Self {
            movement_config: movement,
            body: CharacterBody::with_config(body),
            locomotion: GroundedLocomotionState::new(locomotion),
            movement: MovementState::new(),
            params: AnimatorParams::default(),
            jump_count: 0,
            step_down_count: 0,
        }
    }

    /// Spawn the player in the world with its feet at `position`
    pub fn spawn(&mut self, physics: &mut PhysicsWorld, position: Vec3) {
        self.body.spawn(physics, position);
        self.locomotion.reset();
        self.movement = MovementState::new();
    }

    /// Teleport the player to a position
    pub fn teleport(&mut self, physics: &mut PhysicsWorld, position: Vec3) {
        self.body.set_position(physics, position);
        self.locomotion.reset();
        self.movement.current_speed = 0.0;
    }

    /// Feet position
    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    pub fn facing(&self) -> Quat {
        self.movement.facing
    }

    /// Root transform for the rig: feet position and facing
    pub fn root_transform(&self) -> Transform {
        Transform::from_position_rotation(self.body.position, self.movement.facing)
    }

    pub fn is_grounded(&self) -> bool {
        self.locomotion.is_grounded()
    }

    pub fn motion_state(&self) -> &GroundedMotionState {
        self.locomotion.state()
    }

    /// Parameters published by the last update
    pub fn params(&self) -> AnimatorParams {
        self.params
    }

    pub fn jump_count(&self) -> u32 {
        self.jump_count
    }

    pub fn step_down_count(&self) -> u32 {
        self.step_down_count
    }

    pub fn set_turn_in_place(&mut self, enabled: bool) {
        if self.movement_config.enable_turn_in_place != enabled {
            self.movement_config.enable_turn_in_place = enabled;
            info!(
                "Turn in place {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
    }

    pub fn toggle_turn_in_place(&mut self) {
        self.set_turn_in_place(!self.movement_config.enable_turn_in_place);
    }

    /// Update the player (fixed timestep)
    ///
    /// Runs the ground check and step-down, horizontal movement, gravity and
    /// the vertical move, then the jump request, and publishes the animator
    /// parameters. Foot IK runs afterwards against the resulting pose.
    pub fn fixed_update(
        &mut self,
        physics: &mut PhysicsWorld,
        input: &LocomotionInput,
        time: FrameTime,
    ) -> AnimatorParams {
        let dt = time.delta;
        if input.toggle_turn_in_place {
            self.toggle_turn_in_place();
        }

        let capsule = CapsuleProbe::from_body(&self.body);
        let motion = self.locomotion.tick(time, &capsule, &*physics, input.jump);

        if let Some(gap) = motion.step_down {
            self.body.translate_unchecked(physics, Vec3::NEG_Y * gap);
            self.step_down_count += 1;
        }

        let step = self
            .movement
            .step(&self.movement_config, input, motion.is_grounded, dt);

        let translation = step.velocity * dt + Vec3::Y * motion.vertical_velocity * dt;
        self.body.move_by(physics, translation, dt);

        if motion.jumped {
            self.jump_count += 1;
        }

        self.params = AnimatorParams {
            speed: step.normalized_speed,
            is_grounded: motion.is_grounded,
            is_sprinting: step.is_sprinting,
            horizontal: step.blend_axes.x,
            vertical: step.blend_axes.y,
            vertical_velocity: motion.vertical_velocity,
            jump_triggered: motion.jumped,
        };
        self.params
    }
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new()
    }
}
