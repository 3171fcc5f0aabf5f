//! Foothold Core - Shared types for the foothold character rig
//!
//! This crate provides the foundational types used by every other crate:
//! - Mathematical primitives (re-exported from glam)
//! - Transform for bone and body poses
//! - Debug colors
//! - Frame clock with a fixed-step accumulator

pub mod time;
pub mod types;

pub use glam::{Mat3, Quat, Vec2, Vec3};
pub use time::{FrameTime, GameTime, TimeConfig};
pub use types::{Color, Transform};
