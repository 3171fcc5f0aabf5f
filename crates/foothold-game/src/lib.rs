//! Foothold Game - Character locomotion
//!
//! Provides the grounded/jump state machine, camera-relative movement with
//! turn-in-place gating, and the player controller that runs them in frame
//! order and publishes animator parameters.

pub mod locomotion;
pub mod player;

pub use locomotion::{CapsuleProbe, GroundedLocomotionState, GroundedMotion, GroundedMotionState, LocomotionConfig};
pub use player::{AnimatorParams, LocomotionInput, MovementConfig, MovementState, MovementStep, PlayerController};
