//! Procedural walk cycle standing in for an animation clip

use std::f32::consts::{PI, TAU};

use foothold_core::Transform;
use foothold_ik::{HumanBone, HumanoidPose, IkError, Side, SkeletonRig};
use glam::Vec3;

/// Swings the feet of a [`HumanoidPose`] in proportion to locomotion speed
#[derive(Debug, Clone)]
pub struct WalkCycle {
    stride_length: f32,
    step_height: f32,
    cadence: f32,
    phase: f32,
    rest: [Vec3; 2],
}

impl WalkCycle {
    /// Capture the rest pose of both feet
    pub fn new(
        pose: &HumanoidPose,
        stride_length: f32,
        step_height: f32,
        cadence: f32,
    ) -> Result<Self, IkError> {
        let mut rest = [Vec3::ZERO; 2];
        for side in Side::BOTH {
            let id = pose.find_bone(side.foot()).ok_or(IkError::MissingBone(side.foot()))?;
            rest[side.index()] = pose.local(id).ok_or(IkError::UnknownBone(id))?.position;
        }

        Ok(Self {
            stride_length,
            step_height,
            cadence,
            phase: 0.0,
            rest,
        })
    }

    /// Advance the cycle and write the animated foot poses.
    ///
    /// `speed` is the animator speed (1.0 = walking). Airborne feet tuck up.
    pub fn animate(
        &mut self,
        pose: &mut HumanoidPose,
        speed: f32,
        grounded: bool,
        dt: f32,
    ) -> Result<(), IkError> {
        let speed = speed.max(0.0);
        self.phase = (self.phase + self.cadence * speed * dt * TAU) % TAU;
        let amount = speed.min(1.5);

        for side in Side::BOTH {
            let phase = match side {
                Side::Left => self.phase,
                Side::Right => self.phase + PI,
            };
            let swing = -phase.cos() * self.stride_length * 0.5 * amount;
            let lift = if grounded {
                phase.sin().max(0.0) * self.step_height * amount.min(1.0)
            } else {
                self.step_height
            };

            let rest = self.rest[side.index()];
            let id = pose
                .find_bone(side.foot())
                .ok_or(IkError::MissingBone(side.foot()))?;
            pose.set_local(id, Transform::from_position(rest + Vec3::new(0.0, lift, swing)))?;
        }

        Ok(())
    }
}

/// Hips bone of the pose, for reporting
pub fn hips_height(pose: &HumanoidPose) -> Option<f32> {
    let id = pose.find_bone(HumanBone::Hips)?;
    pose.bone_transform(id).map(|transform| transform.position.y)
}
