//! Per-foot ground probing, ankle targets and knee hints

use foothold_core::types::{look_rotation, project_on_plane, DEGENERATE_SQR_LENGTH};
use foothold_core::Transform;
use foothold_physics::{CollisionQuery, GroundProbe};
use glam::{Quat, Vec3};

use crate::rig::Side;
use crate::FootIkConfig;

/// Weights for the three IK channels of one leg
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkWeights {
    pub position: f32,
    pub rotation: f32,
    pub hint: f32,
}

/// Animated pose of one leg for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegPose {
    pub foot: Transform,
    pub knee: Option<Vec3>,
    pub upper_leg: Option<Vec3>,
}

/// Everything the solver decided for one foot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootSolution {
    pub side: Side,
    /// Where the foot ray started
    pub probe_origin: Vec3,
    /// Ground under the foot, if the ray found any
    pub hit: Option<GroundProbe>,
    /// Signed height change the foot needs; zero when nothing was hit
    pub offset: f32,
    /// Ankle goal before pelvis compensation
    pub target_position: Vec3,
    pub target_rotation: Quat,
    /// Knee hint, when both knee and upper leg are known
    pub hint_position: Option<Vec3>,
    pub weights: IkWeights,
}

impl FootSolution {
    pub fn grounded(&self) -> bool {
        self.hit.is_some()
    }
}

/// Stateless foot placement solver.
///
/// Every method is a pure function of its inputs, so solving the same leg
/// twice in one frame gives identical results.
#[derive(Debug, Clone)]
pub struct FootPlacementSolver {
    config: FootIkConfig,
}

impl FootPlacementSolver {
    pub fn new(config: FootIkConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    pub fn config(&self) -> &FootIkConfig {
        &self.config
    }

    /// IK weights for the current speed sample; a hard step at the threshold
    pub fn weights(&self, speed: f32) -> IkWeights {
        let config = &self.config;
        let moving = config.is_moving(speed);
        let pick = |still: f32| if moving { config.moving_weight } else { still };

        IkWeights {
            position: pick(config.position_weight),
            rotation: if config.align_to_surface {
                pick(config.rotation_weight)
            } else {
                0.0
            },
            hint: pick(config.hint_weight),
        }
    }

    /// Start of the downward foot ray
    pub fn probe_origin(&self, foot_position: Vec3) -> Vec3 {
        foot_position + Vec3::Y * (self.config.probe_distance * 0.5)
    }

    /// Cast the foot ray
    pub fn probe<W: CollisionQuery + ?Sized>(
        &self,
        foot_position: Vec3,
        world: &W,
    ) -> (Vec3, Option<GroundProbe>) {
        let origin = self.probe_origin(foot_position);
        let hit = world.raycast(
            origin,
            Vec3::NEG_Y,
            self.config.probe_distance,
            self.config.ground_mask,
        );
        (origin, hit)
    }

    /// Signed foot offset for a probe result: contact height minus ankle height plus clearance
    pub fn foot_offset(&self, foot_position: Vec3, hit: Option<&GroundProbe>) -> f32 {
        match hit {
            Some(hit) => hit.point.y - foot_position.y + self.config.foot_clearance,
            None => 0.0,
        }
    }

    /// Knee hint: in front of the knee, along the character's forward with the thigh twist removed
    pub fn knee_hint(&self, upper_leg: Vec3, knee: Vec3, root: &Transform) -> Vec3 {
        let thigh = (knee - upper_leg).normalize_or_zero();
        let mut forward = project_on_plane(root.forward(), thigh).normalize_or_zero();
        if forward.length_squared() < DEGENERATE_SQR_LENGTH {
            forward = project_on_plane(root.right(), thigh).normalize_or_zero();
        }

        knee + forward * self.config.hint_forward_offset + Vec3::Y * self.config.hint_up_offset
    }

    /// Solve one foot against the ground.
    ///
    /// On a miss the animated foot pose is passed through untouched.
    pub fn solve_foot<W: CollisionQuery + ?Sized>(
        &self,
        side: Side,
        leg: &LegPose,
        root: &Transform,
        speed: f32,
        world: &W,
    ) -> FootSolution {
        let foot = leg.foot;
        let (probe_origin, hit) = self.probe(foot.position, world);
        let offset = self.foot_offset(foot.position, hit.as_ref());

        let (target_position, target_rotation) = match &hit {
            Some(hit) => {
                let rotation = if self.config.align_to_surface {
                    look_rotation(root.forward(), hit.normal)
                } else {
                    foot.rotation
                };
                (hit.point + Vec3::Y * self.config.foot_clearance, rotation)
            }
            None => (foot.position, foot.rotation),
        };

        let hint_position = match (leg.upper_leg, leg.knee) {
            (Some(upper_leg), Some(knee)) => Some(self.knee_hint(upper_leg, knee, root)),
            _ => None,
        };

        FootSolution {
            side,
            probe_origin,
            hit,
            offset,
            target_position,
            target_rotation,
            hint_position,
            weights: self.weights(speed),
        }
    }
}
