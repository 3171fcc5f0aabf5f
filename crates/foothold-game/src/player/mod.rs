//! Player controller module
//!
//! Provides third-person movement with grounding, jumping and step-down.

mod controller;
mod movement;

pub use controller::{AnimatorParams, PlayerController};
pub use movement::{LocomotionInput, MovementConfig, MovementState, MovementStep};
