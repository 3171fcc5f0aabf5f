//! Pelvis drop toward the lower foot

use crate::FootIkConfig;

/// Smoothed pelvis offset carried from frame to frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PelvisOffsetState {
    /// Current vertical offset in meters; always within `[-max_offset, 0]`
    pub current: f32,
}

/// Lowers the hips so the lower foot can reach the ground.
///
/// The pelvis is only ever pulled down; raising it is left to the animation.
#[derive(Debug, Clone)]
pub struct PelvisCompensator {
    max_offset: f32,
    offset_speed: f32,
    speed_threshold: f32,
    moving_weight: f32,
    state: PelvisOffsetState,
}

impl PelvisCompensator {
    pub fn new(config: &FootIkConfig) -> Self {
        let config = config.sanitized();
        Self {
            max_offset: config.max_pelvis_offset,
            offset_speed: config.pelvis_offset_speed,
            speed_threshold: config.speed_threshold,
            moving_weight: config.moving_weight,
            state: PelvisOffsetState::default(),
        }
    }

    pub fn state(&self) -> PelvisOffsetState {
        self.state
    }

    pub fn current(&self) -> f32 {
        self.state.current
    }

    pub fn reset(&mut self) {
        self.state = PelvisOffsetState::default();
    }

    /// Offset the pelvis is heading toward for these foot offsets
    pub fn target(&self, left_offset: f32, right_offset: f32, speed: f32) -> f32 {
        let weight = if speed > self.speed_threshold {
            self.moving_weight
        } else {
            1.0
        };
        let lowest = left_offset.min(right_offset);
        (lowest * weight).clamp(-self.max_offset, 0.0)
    }

    /// Advance the smoothed offset by one frame and return it
    pub fn tick(&mut self, delta_time: f32, left_offset: f32, right_offset: f32, speed: f32) -> f32 {
        let target = self.target(left_offset, right_offset, speed);
        let t = (delta_time * self.offset_speed).clamp(0.0, 1.0);
        let current = self.state.current;
        self.state.current = (current + (target - current) * t).clamp(-self.max_offset, 0.0);
        self.state.current
    }
}
