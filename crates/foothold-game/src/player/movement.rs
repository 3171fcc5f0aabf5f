//! Camera-relative movement and turn-in-place gating

use foothold_core::types::look_rotation;
use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Facing directions shorter than this are ignored
const MIN_FACING_SQR: f32 = 1e-3;
/// Input magnitude (squared) that counts as "wants to move" for sprinting
const SPRINT_INPUT_SQR: f32 = 0.01;
/// Desired direction length above which the character accelerates and turns
const MOVE_DIRECTION_THRESHOLD: f32 = 0.1;

/// Movement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Walking speed in meters per second
    pub walk_speed: f32,
    /// Sprinting speed in meters per second
    pub sprint_speed: f32,
    /// How fast the character turns toward its facing target
    pub rotation_speed: f32,
    /// Turn rate used while turning in place
    pub turn_in_place_rotation_speed: f32,
    /// Speed interpolation rate
    pub acceleration: f32,
    /// Face the camera's yaw instead of the move direction
    pub rotate_to_camera_yaw: bool,
    /// Allow pure sideways input to rotate the character without moving it
    pub enable_turn_in_place: bool,
    /// Forward input below this (and sideways input above it) counts as sideways-only
    pub turn_in_place_min_input: f32,
    /// Sideways input at or above this moves instead of turning
    pub turn_in_place_max_input: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 4.0,
            sprint_speed: 8.0,
            rotation_speed: 5.0,
            turn_in_place_rotation_speed: 0.5,
            acceleration: 10.0,
            rotate_to_camera_yaw: true,
            enable_turn_in_place: false,
            turn_in_place_min_input: 0.05,
            turn_in_place_max_input: 0.95,
        }
    }
}

impl MovementConfig {
    /// Get the current max speed based on sprint state
    pub fn max_speed(&self, sprinting: bool) -> f32 {
        if sprinting {
            self.sprint_speed
        } else {
            self.walk_speed
        }
    }

    /// Whether the input is a small sideways push with no forward component
    pub fn is_sideways_only(&self, input: Vec2) -> bool {
        let x = input.x.abs();
        input.y.abs() < self.turn_in_place_min_input
            && x > self.turn_in_place_min_input
            && x < self.turn_in_place_max_input
    }
}

/// Player intent for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocomotionInput {
    /// Stick/WASD input: x is right, y is forward, each in [-1, 1]
    pub move_input: Vec2,
    pub sprint: bool,
    /// Jump pressed this frame. A press edge, not the held button: keeping it
    /// set re-requests the jump every frame and fires again once allowed.
    pub jump: bool,
    /// Camera yaw in radians; zero looks down -Z
    pub camera_yaw: f32,
    /// Flip turn-in-place on or off this frame
    pub toggle_turn_in_place: bool,
}

impl LocomotionInput {
    /// Camera forward flattened onto the ground plane
    pub fn camera_forward(&self) -> Vec3 {
        Vec3::new(self.camera_yaw.sin(), 0.0, -self.camera_yaw.cos())
    }

    /// Camera right flattened onto the ground plane
    pub fn camera_right(&self) -> Vec3 {
        self.camera_forward().cross(Vec3::Y)
    }
}

/// Result of one movement step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementStep {
    /// Horizontal velocity in m/s
    pub velocity: Vec3,
    pub facing: Quat,
    pub is_sprinting: bool,
    pub turning_in_place: bool,
    /// Speed divided by walk speed, for the animator
    pub normalized_speed: f32,
    /// Input axes for the directional blend, zeroed while turning in place
    pub blend_axes: Vec2,
}

/// Horizontal speed and facing carried between frames
#[derive(Debug, Clone)]
pub struct MovementState {
    pub current_speed: f32,
    pub facing: Quat,
    turning_in_place: bool,
}

impl Default for MovementState {
    fn default() -> Self {
        Self {
            current_speed: 0.0,
            facing: Quat::IDENTITY,
            turning_in_place: false,
        }
    }
}

impl MovementState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance speed and facing for one frame
    pub fn step(
        &mut self,
        config: &MovementConfig,
        input: &LocomotionInput,
        grounded: bool,
        dt: f32,
    ) -> MovementStep {
        let forward = input.camera_forward();
        let right = input.camera_right();
        let raw = input.move_input;

        let turning = config.enable_turn_in_place
            && grounded
            && config.is_sideways_only(raw)
            && !config.rotate_to_camera_yaw;
        if turning != self.turning_in_place {
            debug!("Turn in place | active={} input=({:.2}, {:.2})", turning, raw.x, raw.y);
            self.turning_in_place = turning;
        }

        let desired = if turning {
            right * raw.x.signum()
        } else {
            forward * raw.y + right * raw.x
        };

        let has_input = raw.length_squared() > SPRINT_INPUT_SQR;
        let is_sprinting = input.sprint && has_input && !turning;
        let target_speed = if turning || !has_input {
            0.0
        } else {
            config.max_speed(is_sprinting)
        };

        let blend = (config.acceleration * dt).clamp(0.0, 1.0);
        if desired.length() > MOVE_DIRECTION_THRESHOLD || config.rotate_to_camera_yaw {
            self.current_speed += (target_speed - self.current_speed) * blend;

            let face = if config.rotate_to_camera_yaw { forward } else { desired };
            if face.length_squared() > MIN_FACING_SQR {
                let target = look_rotation(face, Vec3::Y);
                let turn_rate = if turning {
                    config.turn_in_place_rotation_speed
                } else {
                    config.rotation_speed
                };
                self.facing = self.facing.slerp(target, (turn_rate * dt).clamp(0.0, 1.0));
            }
        } else {
            self.current_speed += (0.0 - self.current_speed) * blend;
        }

        if turning {
            self.current_speed = 0.0;
        }

        let velocity = desired.normalize_or_zero() * self.current_speed;
        let normalized_speed = if turning || config.walk_speed <= 0.0 {
            0.0
        } else {
            self.current_speed / config.walk_speed
        };

        MovementStep {
            velocity,
            facing: self.facing,
            is_sprinting,
            turning_in_place: turning,
            normalized_speed,
            blend_axes: if turning { Vec2::ZERO } else { raw },
        }
    }
}
