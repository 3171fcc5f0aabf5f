//! Foot IK tunables

use foothold_physics::LayerMask;
use serde::{Deserialize, Serialize};

/// Foot IK configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FootIkConfig {
    /// Layers the foot rays may land on
    pub ground_mask: LayerMask,
    /// Length of each downward foot ray; the ray starts half of this above the foot
    pub probe_distance: f32,
    /// Height kept between the ground contact and the ankle target
    pub foot_clearance: f32,
    /// Knee hint distance in front of the knee
    pub hint_forward_offset: f32,
    /// Knee hint distance above the knee
    pub hint_up_offset: f32,
    /// Tilt feet to the ground normal instead of keeping the animated rotation
    pub align_to_surface: bool,
    /// Position weight while standing still
    pub position_weight: f32,
    /// Rotation weight while standing still
    pub rotation_weight: f32,
    /// Knee hint weight while standing still
    pub hint_weight: f32,
    /// Speed parameter above which the character counts as moving
    pub speed_threshold: f32,
    /// Weight used for every channel (and the pelvis) while moving
    pub moving_weight: f32,
    /// Lower the pelvis toward the lower foot
    pub adjust_pelvis: bool,
    /// Pelvis smoothing rate (per second)
    pub pelvis_offset_speed: f32,
    /// Largest pelvis drop in meters
    pub max_pelvis_offset: f32,
    /// Animator layer whose IK pass runs the solver
    pub ik_layer: usize,
    /// Emit debug samples and periodic distance logs
    pub debug: bool,
    /// Seconds between foot distance log lines
    pub debug_interval: f32,
}

impl Default for FootIkConfig {
    fn default() -> Self {
        Self {
            ground_mask: LayerMask::GROUND,
            probe_distance: 1.5,
            foot_clearance: 0.05,
            hint_forward_offset: 0.2,
            hint_up_offset: 0.1,
            align_to_surface: true,
            position_weight: 1.0,
            rotation_weight: 1.0,
            hint_weight: 1.0,
            speed_threshold: 0.1,
            moving_weight: 0.3,
            adjust_pelvis: true,
            pelvis_offset_speed: 5.0,
            max_pelvis_offset: 0.3,
            ik_layer: 0,
            debug: false,
            debug_interval: 1.0,
        }
    }
}

impl FootIkConfig {
    /// Clamp tunables into their valid ranges
    pub fn sanitized(&self) -> Self {
        Self {
            ground_mask: self.ground_mask,
            probe_distance: self.probe_distance.max(0.0),
            foot_clearance: self.foot_clearance,
            hint_forward_offset: self.hint_forward_offset,
            hint_up_offset: self.hint_up_offset,
            align_to_surface: self.align_to_surface,
            position_weight: self.position_weight.clamp(0.0, 1.0),
            rotation_weight: self.rotation_weight.clamp(0.0, 1.0),
            hint_weight: self.hint_weight.clamp(0.0, 1.0),
            speed_threshold: self.speed_threshold.max(0.0),
            moving_weight: self.moving_weight.clamp(0.0, 1.0),
            adjust_pelvis: self.adjust_pelvis,
            pelvis_offset_speed: self.pelvis_offset_speed.max(0.0),
            max_pelvis_offset: self.max_pelvis_offset.max(0.0),
            ik_layer: self.ik_layer,
            debug: self.debug,
            debug_interval: self.debug_interval.max(0.0),
        }
    }

    /// Whether a speed sample counts as moving
    pub fn is_moving(&self, speed: f32) -> bool {
        speed > self.speed_threshold
    }
}
